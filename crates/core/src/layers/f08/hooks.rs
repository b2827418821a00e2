use crate::hooks::Hook;

/// Extension points of a Fortran 2008 wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum F08Hook {
    /// Inside the doc comment above the subroutine.
    Comment,
    /// The `use` statements at the top of the subroutine.
    Use,
    /// After the locals with initializers are assigned.
    Initialization,
    Body,
    WrapperEnter,
    EnterIfActive,
    EnterIfGroupActivePre,
    EnterIfGroupActive,
    EnterIfUnwinding,
    PrePmpiCall,
    PmpiCall,
    PostPmpiCall,
    WrapperExit,
    ExitIfActive,
    ExitIfGroupActive,
    ExitIfUnwinding,
    /// Copy-back of optional output arguments.
    Cleanup,
}

impl Hook for F08Hook {
    fn name(self) -> &'static str {
        match self {
            F08Hook::Comment => "comment",
            F08Hook::Use => "use",
            F08Hook::Initialization => "initialization",
            F08Hook::Body => "body",
            F08Hook::WrapperEnter => "wrapper_enter",
            F08Hook::EnterIfActive => "enter_if_active",
            F08Hook::EnterIfGroupActivePre => "enter_if_group_active_pre",
            F08Hook::EnterIfGroupActive => "enter_if_group_active",
            F08Hook::EnterIfUnwinding => "enter_if_unwinding",
            F08Hook::PrePmpiCall => "pre_pmpi_call",
            F08Hook::PmpiCall => "pmpi_call",
            F08Hook::PostPmpiCall => "post_pmpi_call",
            F08Hook::WrapperExit => "wrapper_exit",
            F08Hook::ExitIfActive => "exit_if_active",
            F08Hook::ExitIfGroupActive => "exit_if_group_active",
            F08Hook::ExitIfUnwinding => "exit_if_unwinding",
            F08Hook::Cleanup => "cleanup",
        }
    }

    fn all() -> &'static [Self] {
        &[
            F08Hook::Comment,
            F08Hook::Use,
            F08Hook::Initialization,
            F08Hook::Body,
            F08Hook::WrapperEnter,
            F08Hook::EnterIfActive,
            F08Hook::EnterIfGroupActivePre,
            F08Hook::EnterIfGroupActive,
            F08Hook::EnterIfUnwinding,
            F08Hook::PrePmpiCall,
            F08Hook::PmpiCall,
            F08Hook::PostPmpiCall,
            F08Hook::WrapperExit,
            F08Hook::ExitIfActive,
            F08Hook::ExitIfGroupActive,
            F08Hook::ExitIfUnwinding,
            F08Hook::Cleanup,
        ]
    }
}
