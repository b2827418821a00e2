//! Request completion, persistent starts and request bookkeeping

use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::f08::{F08Hook, render};
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

const COMPLETION_DEPS: &[TaskRef<F08Hook>] = &[&TaskSaveRequestArray, &TaskXreqtestEnabled];

pub struct TaskXreqtestEnabled;

impl TaskType<F08Hook> for TaskXreqtestEnabled {
    fn name(&self) -> &'static str {
        "TaskXreqtestEnabled"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::initialized(
            Binding::new("xreqtest_enabled", "logical"),
            render::event_gen_on_for("XREQTEST"),
        )]))
    }
}

/// Saves the request handles before the completion call overwrites them.
pub struct TaskSaveRequestArray;

impl TaskType<F08Hook> for TaskSaveRequestArray {
    fn name(&self) -> &'static str {
        "TaskSaveRequestArray"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PrePmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .any_of("requests", &["request", "array_of_requests"])?
            .build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "call scorep_mpi_save_request_array( {} ) \n",
            cx.param("requests")?
        ));
        Ok(())
    }
}

macro_rules! completion_task {
    ($(#[$meta:meta])* $ty:ident, [$($param:literal),*], imports: [$($import:literal),*], |$cx:ident, $out:ident| $body:block) => {
        $(#[$meta])*
        pub struct $ty;

        impl TaskType<F08Hook> for $ty {
            fn name(&self) -> &'static str {
                stringify!($ty)
            }

            fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
                COMPLETION_DEPS
            }

            fn hooks(&self) -> &'static [F08Hook] {
                &[F08Hook::PostPmpiCall]
            }

            fn required_imports(&self) -> &'static [&'static str] {
                &[$($import),*]
            }

            fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
                let mapping = setup.mapping();
                $(let mapping = mapping.param($param)?;)*
                Ok(mapping.build())
            }

            fn emit(&self, _hook: F08Hook, $cx: &TaskContext<'_>, $out: &mut Fragments) -> Result<()> {
                $body
                Ok(())
            }
        }
    };
}

completion_task!(TaskWait, ["status"], imports: [], |cx, out| {
    out.push(format!(
        "call scorep_mpi_check_all_or_none( 1, .true., {} )\n",
        cx.param("status")?
    ));
});

completion_task!(TaskWaitall, ["count", "array_of_statuses"], imports: [], |cx, out| {
    out.push(format!(
        "call scorep_mpi_check_all_or_none( {}, .true., {} )\n",
        cx.param("count")?,
        cx.param("array_of_statuses")?
    ));
});

completion_task!(TaskWaitany, ["index", "count", "status"], imports: ["MPI_UNDEFINED"], |cx, out| {
    let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
    let index = cx.param("index")?;
    let count = cx.param("count")?;
    let status = cx.param("status")?;
    out.push(format!(
        "if ( {index} .ne. MPI_UNDEFINED ) then\n\
         \x20   ! array_of_requests contains active handles\n\
         \x20   if ( {group} .and. {xreqtest} ) then\n\
         \x20       call scorep_mpi_check_some_test_some( {count}, 1, {index}, {status} )\n\
         \x20   else\n\
         \x20       call scorep_mpi_check_some( {count}, 1, {index}, {status} )\n\
         \x20   end if\n\
         end if\n"
    ));
});

completion_task!(
    /// Shared by the wait-some and test-some families.
    TaskTestWaitSome,
    ["incount", "outcount", "array_of_indices", "array_of_statuses"],
    imports: ["MPI_UNDEFINED"],
    |cx, out| {
        let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
        let incount = cx.param("incount")?;
        let outcount = cx.param("outcount")?;
        let indices = cx.param("array_of_indices")?;
        let statuses = cx.param("array_of_statuses")?;
        out.push(format!(
            "if ( {outcount} .ne. MPI_UNDEFINED ) then\n\
             \x20   ! array_of_requests contains active handles\n\
             \x20   if ( {group} .and. {xreqtest} ) then\n\
             \x20       call scorep_mpi_check_some_test_some( {incount}, {outcount}, {indices}, {statuses} )\n\
             \x20   else\n\
             \x20       call scorep_mpi_check_some( {incount}, {outcount}, {indices}, {statuses} )\n\
             \x20   end if\n\
             end if\n"
        ));
    }
);

completion_task!(TaskTest, ["flag", "status"], imports: [], |cx, out| {
    let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
    let flag = cx.param("flag")?;
    let status = cx.param("status")?;
    out.push(format!(
        "if ( {group} .and. {xreqtest} ) then\n\
         \x20   call scorep_mpi_check_all_or_test_all( 1, {flag}, {status} )\n\
         else\n\
         \x20   call scorep_mpi_check_all_or_none( 1, {flag}, {status} )\n\
         end if\n"
    ));
});

completion_task!(TaskTestall, ["count", "flag", "array_of_statuses"], imports: [], |cx, out| {
    let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
    let count = cx.param("count")?;
    let flag = cx.param("flag")?;
    let statuses = cx.param("array_of_statuses")?;
    out.push(format!(
        "if ( {group} .and. {xreqtest} ) then\n\
         \x20   call scorep_mpi_check_all_or_test_all( {count}, {flag}, {statuses} )\n\
         else\n\
         \x20   call scorep_mpi_check_all_or_none( {count}, {flag}, {statuses} )\n\
         end if\n"
    ));
});

completion_task!(TaskTestany, ["count", "flag", "status", "index"], imports: ["MPI_UNDEFINED"], |cx, out| {
    let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
    let count = cx.param("count")?;
    let flag = cx.param("flag")?;
    let status = cx.param("status")?;
    let index = cx.param("index")?;
    out.push(format!(
        "if ( .not. {flag} ) then\n\
         \x20   ! array_of_requests contains active handles, but none were completed\n\
         \x20   if ( {group} .and. {xreqtest} ) then\n\
         \x20       call scorep_mpi_test_all( {count} )\n\
         \x20   end if\n\
         else if ( {index} .ne. MPI_UNDEFINED ) then\n\
         \x20   ! array_of_requests contains active handles, and one was completed\n\
         \x20   if ( {group} .and. {xreqtest} ) then\n\
         \x20       call scorep_mpi_check_some_test_some( {count}, 1, {index}, {status} )\n\
         \x20   else\n\
         \x20       call scorep_mpi_check_some( {count}, 1, {index}, {status} )\n\
         \x20   end if\n\
         end if\n\
         \x20! else, array_of_requests contains no active handles\n"
    ));
});

pub struct TaskStart;

impl TaskType<F08Hook> for TaskStart {
    fn name(&self) -> &'static str {
        "TaskStart"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.build())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!("call scorep_mpi_request_start({})\n", cx.param("request")?));
        Ok(())
    }
}

pub struct TaskStartall;

impl TaskType<F08Hook> for TaskStartall {
    fn name(&self) -> &'static str {
        "TaskStartall"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("count")?.param("array_of_requests")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::new(Binding::new("local_i", "integer"))]))
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let i = cx.local("local_i")?;
        out.push(format!(
            "do {i} = 1, {}\n    call scorep_mpi_request_start( {}({i}) )\nend do\n",
            cx.param("count")?,
            cx.param("array_of_requests")?
        ));
        Ok(())
    }
}

fn scorep_request_local() -> Scope<Variable> {
    Scope::from_named([Variable::new(Binding::new("local_scorep_req", "type(c_ptr)"))])
}

/// Non-destructive completion query.
pub struct TaskRequestGetStatus;

impl TaskType<F08Hook> for TaskRequestGetStatus {
    fn name(&self) -> &'static str {
        "TaskRequestGetStatus"
    }

    fn dependencies(&self) -> &'static [TaskRef<F08Hook>] {
        const DEPS: &[TaskRef<F08Hook>] = &[&TaskXreqtestEnabled];
        DEPS
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PostPmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup
            .mapping()
            .param("request")?
            .param("flag")?
            .param("status")?
            .build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(scorep_request_local())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let req = cx.local("local_scorep_req")?;
        let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
        out.push(format!(
            "{req} = scorep_mpi_request_get( {} )\n\
             if ( {} ) then\n\
             \x20   call scorep_mpi_check_request( {req}, {} )\n\
             \x20   call scorep_mpi_request_set_completed( {req} )\n\
             else if ( {group} .and. {xreqtest} ) then\n\
             \x20   call scorep_mpi_request_tested( {req} )\n\
             end if\n\
             call scorep_mpi_unmark_request( {req} )\n",
            cx.param("request")?,
            cx.param("flag")?,
            cx.param("status")?
        ));
        Ok(())
    }
}

pub struct TaskCancel;

impl TaskType<F08Hook> for TaskCancel {
    fn name(&self) -> &'static str {
        "TaskCancel"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PrePmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(scorep_request_local())
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let req = cx.local("local_scorep_req")?;
        out.push(format!(
            "{req} = scorep_mpi_request_get( {} )\n\
             call scorep_mpi_request_set_cancel( {req} )\n\
             call scorep_mpi_unmark_request( {req} )\n",
            cx.param("request")?
        ));
        Ok(())
    }
}

/// Frees the request. Opens a block around everything after the call, so
/// no other task may contribute to the post-call hook before it.
pub struct TaskRequestFree;

impl TaskType<F08Hook> for TaskRequestFree {
    fn name(&self) -> &'static str {
        "TaskRequestFree"
    }

    fn has_conflict_with(&self, other: &dyn TaskType<F08Hook>) -> bool {
        other.hooks().contains(&F08Hook::PostPmpiCall)
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::PrePmpiCall, F08Hook::PostPmpiCall]
    }

    fn required_imports(&self) -> &'static [&'static str] {
        &["MPI_REQUEST_NULL"]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.build())
    }

    fn needs_local_variables(&self, cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::initialized(
            Binding::new("local_got_null_request", "logical"),
            format!("({} .eq. MPI_REQUEST_NULL)", cx.param("request")?),
        )]))
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let request = cx.param("request")?;
        if hook == F08Hook::PrePmpiCall {
            out.push(format!("call scorep_mpi_request_free_wrapper({request})\n"));
            out.push(format!(
                "if ( {request} .ne. MPI_REQUEST_NULL .or. {} ) then \n",
                cx.local("local_got_null_request")?
            ));
        } else {
            out.push("end if\n");
        }
        Ok(())
    }
}
