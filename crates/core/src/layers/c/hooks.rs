use crate::hooks::Hook;

/// Extension points of a C wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CHook {
    /// Inside the doc comment above the wrapper.
    Comment,
    /// After the locals are declared and initialized.
    Initialization,
    Body,
    /// The block recording the enter event.
    WrapperEnter,
    EnterIfActive,
    /// Before the enter event, when the group is enabled.
    EnterIfGroupActivePre,
    /// After the enter event, when the group is enabled.
    EnterIfGroupActive,
    EnterIfUnwinding,
    PrePmpiCall,
    PmpiCall,
    PostPmpiCall,
    /// The block recording the exit event.
    WrapperExit,
    ExitIfActive,
    /// Before the exit event, when the group is enabled.
    ExitIfGroupActive,
    ExitIfUnwinding,
    Cleanup,
}

impl Hook for CHook {
    fn name(self) -> &'static str {
        match self {
            CHook::Comment => "comment",
            CHook::Initialization => "initialization",
            CHook::Body => "body",
            CHook::WrapperEnter => "wrapper_enter",
            CHook::EnterIfActive => "enter_if_active",
            CHook::EnterIfGroupActivePre => "enter_if_group_active_pre",
            CHook::EnterIfGroupActive => "enter_if_group_active",
            CHook::EnterIfUnwinding => "enter_if_unwinding",
            CHook::PrePmpiCall => "pre_pmpi_call",
            CHook::PmpiCall => "pmpi_call",
            CHook::PostPmpiCall => "post_pmpi_call",
            CHook::WrapperExit => "wrapper_exit",
            CHook::ExitIfActive => "exit_if_active",
            CHook::ExitIfGroupActive => "exit_if_group_active",
            CHook::ExitIfUnwinding => "exit_if_unwinding",
            CHook::Cleanup => "cleanup",
        }
    }

    fn all() -> &'static [Self] {
        &[
            CHook::Comment,
            CHook::Initialization,
            CHook::Body,
            CHook::WrapperEnter,
            CHook::EnterIfActive,
            CHook::EnterIfGroupActivePre,
            CHook::EnterIfGroupActive,
            CHook::EnterIfUnwinding,
            CHook::PrePmpiCall,
            CHook::PmpiCall,
            CHook::PostPmpiCall,
            CHook::WrapperExit,
            CHook::ExitIfActive,
            CHook::ExitIfGroupActive,
            CHook::ExitIfUnwinding,
            CHook::Cleanup,
        ]
    }
}
