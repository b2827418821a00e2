//! Request completion, persistent starts and request bookkeeping

use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::c::CHook;
use crate::task::{TaskContext, TaskRef, TaskSetup, TaskType};
use crate::types::{Binding, Scope, Variable};

const COMPLETION_DEPS: &[TaskRef<CHook>] = &[&TaskSaveRequestArray, &TaskXreqtestEnabled];

/// Whether cross-request test events are recorded.
pub struct TaskXreqtestEnabled;

impl TaskType<CHook> for TaskXreqtestEnabled {
    fn name(&self) -> &'static str {
        "TaskXreqtestEnabled"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::initialized(
            Binding::new("xreqtest_enabled", "int").constant(),
            "SCOREP_MPI_IS_EVENT_GEN_ON_FOR( SCOREP_MPI_ENABLED_XREQTEST )",
        )]))
    }
}

/// Saves the request handles before the completion call overwrites them.
pub struct TaskSaveRequestArray;

impl TaskType<CHook> for TaskSaveRequestArray {
    fn name(&self) -> &'static str {
        "TaskSaveRequestArray"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PrePmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        let mapping = setup.mapping().any_of("req", &["request", "array_of_requests"])?;
        let mapping = if mapping.resolved("req") == Some("array_of_requests") {
            mapping.any_of("count", &["count", "incount"])?
        } else {
            mapping
        };
        Ok(mapping.build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let count = if cx.has_param("count") { cx.param("count")? } else { "1" };
        out.push(format!(
            "scorep_mpi_save_request_array( {}, {count} ); \n",
            cx.param("req")?
        ));
        Ok(())
    }
}

/// Declares a completion task: saves requests first, then checks them
/// after the call.
macro_rules! completion_task {
    ($(#[$meta:meta])* $ty:ident, [$($param:literal),*], |$cx:ident, $out:ident| $body:block) => {
        $(#[$meta])*
        pub struct $ty;

        impl TaskType<CHook> for $ty {
            fn name(&self) -> &'static str {
                stringify!($ty)
            }

            fn dependencies(&self) -> &'static [TaskRef<CHook>] {
                COMPLETION_DEPS
            }

            fn hooks(&self) -> &'static [CHook] {
                &[CHook::PostPmpiCall]
            }

            fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
                let mapping = setup.mapping();
                $(let mapping = mapping.param($param)?;)*
                Ok(mapping.build())
            }

            fn emit(&self, _hook: CHook, $cx: &TaskContext<'_>, $out: &mut Fragments) -> Result<()> {
                $body
                Ok(())
            }
        }
    };
}

completion_task!(TaskWait, ["status"], |cx, out| {
    out.push(format!(
        "scorep_mpi_check_all_or_none( 1, REQUESTS_COMPLETED, {} );\n",
        cx.param("status")?
    ));
});

completion_task!(TaskWaitall, ["count", "array_of_statuses"], |cx, out| {
    out.push(format!(
        "scorep_mpi_check_all_or_none( {}, REQUESTS_COMPLETED, {} );\n",
        cx.param("count")?,
        cx.param("array_of_statuses")?
    ));
});

completion_task!(TaskWaitany, ["index", "count", "status"], |cx, out| {
    let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
    let index = cx.param("index")?;
    let count = cx.param("count")?;
    let status = cx.param("status")?;
    out.push(format!(
        "/* array_of_requests contains active handles */\n\
         if ( *{index} != MPI_UNDEFINED )\n\
         {{\n\
         \x20   if ( {group} && {xreqtest} )\n\
         \x20   {{\n\
         \x20       scorep_mpi_check_some_test_some( {count}, 1, {index}, {status} );\n\
         \x20   }}\n\
         \x20   else\n\
         \x20   {{\n\
         \x20       scorep_mpi_check_some( {count}, 1, {index}, {status} );\n\
         \x20   }}\n\
         }}\n"
    ));
});

completion_task!(
    /// Shared by the wait-some and test-some families.
    TaskTestWaitSome,
    ["incount", "outcount", "array_of_indices", "array_of_statuses"],
    |cx, out| {
        let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
        let incount = cx.param("incount")?;
        let outcount = cx.param("outcount")?;
        let indices = cx.param("array_of_indices")?;
        let statuses = cx.param("array_of_statuses")?;
        out.push(format!(
            "/* array_of_requests contains active handles */\n\
             if ( *{outcount} != MPI_UNDEFINED )\n\
             {{\n\
             \x20   if ( {group} && {xreqtest} )\n\
             \x20   {{\n\
             \x20       scorep_mpi_check_some_test_some( {incount}, *{outcount}, {indices}, {statuses} );\n\
             \x20   }}\n\
             \x20   else\n\
             \x20   {{\n\
             \x20       scorep_mpi_check_some( {incount}, *{outcount}, {indices}, {statuses} );\n\
             \x20   }}\n\
             }}\n"
        ));
    }
);

completion_task!(TaskTest, ["flag", "status"], |cx, out| {
    let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
    let flag = cx.param("flag")?;
    let status = cx.param("status")?;
    out.push(format!(
        "if ( {group} && {xreqtest} )\n\
         {{\n\
         \x20   scorep_mpi_check_all_or_test_all( 1, *{flag}, {status} );\n\
         }}\n\
         else\n\
         {{\n\
         \x20   scorep_mpi_check_all_or_none( 1, *{flag}, {status} );\n\
         }}\n"
    ));
});

completion_task!(TaskTestall, ["count", "flag", "array_of_statuses"], |cx, out| {
    let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
    let count = cx.param("count")?;
    let flag = cx.param("flag")?;
    let statuses = cx.param("array_of_statuses")?;
    out.push(format!(
        "if ( {group} && {xreqtest} )\n\
         {{\n\
         \x20   scorep_mpi_check_all_or_test_all( {count}, *{flag}, {statuses} );\n\
         }}\n\
         else\n\
         {{\n\
         \x20   scorep_mpi_check_all_or_none( {count}, *{flag}, {statuses} );\n\
         }}\n"
    ));
});

completion_task!(TaskTestany, ["count", "flag", "status", "index"], |cx, out| {
    let (group, xreqtest) = (cx.local("event_gen_active_for_group")?, cx.local("xreqtest_enabled")?);
    let count = cx.param("count")?;
    let flag = cx.param("flag")?;
    let status = cx.param("status")?;
    let index = cx.param("index")?;
    out.push(format!(
        " /* array_of_requests contains active handles, but none were completed */\n\
         if ( !*{flag} )\n\
         {{\n\
         \x20   if ( {group} && {xreqtest} )\n\
         \x20   {{\n\
         \x20       scorep_mpi_test_all( {count} );\n\
         \x20   }}\n\
         }}\n\
         \x20/* array_of_requests contains active handles, and one was completed */\n\
         else if ( *{index} != MPI_UNDEFINED )\n\
         {{\n\
         \x20   if ( {group} && {xreqtest} )\n\
         \x20   {{\n\
         \x20       scorep_mpi_check_some_test_some( {count}, 1, {index}, {status} );\n\
         \x20   }}\n\
         \x20   else\n\
         \x20   {{\n\
         \x20       scorep_mpi_check_some( {count}, 1, {index}, {status} );\n\
         \x20   }}\n\
         }}\n\
         /* else, array_of_requests contains no active handles */\n"
    ));
});

/// Starts one persistent request.
pub struct TaskStart;

impl TaskType<CHook> for TaskStart {
    fn name(&self) -> &'static str {
        "TaskStart"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!("scorep_mpi_request_start(*{});\n", cx.param("request")?));
        Ok(())
    }
}

pub struct TaskStartall;

impl TaskType<CHook> for TaskStartall {
    fn name(&self) -> &'static str {
        "TaskStartall"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("count")?.param("array_of_requests")?.build())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "for(int i = 0; i < {}; ++i)\n{{\n    scorep_mpi_request_start( {}[i] );\n}}\n",
            cx.param("count")?,
            cx.param("array_of_requests")?
        ));
        Ok(())
    }
}

fn scorep_request_local() -> Scope<Variable> {
    Scope::from_named([Variable::new(
        Binding::new("local_scorep_req", "scorep_mpi_request").with_pointer(1),
    )])
}

/// Non-destructive completion query.
pub struct TaskRequestGetStatus;

impl TaskType<CHook> for TaskRequestGetStatus {
    fn name(&self) -> &'static str {
        "TaskRequestGetStatus"
    }

    fn dependencies(&self) -> &'static [TaskRef<CHook>] {
        const DEPS: &[TaskRef<CHook>] = &[&TaskXreqtestEnabled];
        DEPS
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PostPmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.param("flag")?.param("status")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(scorep_request_local())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let req = cx.local("local_scorep_req")?;
        out.push(format!(
            "{req} = scorep_mpi_request_get( {} );\n\
             if ( *{} )\n\
             {{\n\
             \x20   scorep_mpi_check_request( {req}, {} );\n\
             \x20   scorep_mpi_request_set_completed( {req} );\n\
             }}\n\
             else if ( {} && {} )\n\
             {{\n\
             \x20   scorep_mpi_request_tested( {req} );\n\
             }}\n\
             scorep_mpi_unmark_request( {req} );\n",
            cx.param("request")?,
            cx.param("flag")?,
            cx.param("status")?,
            cx.local("event_gen_active_for_group")?,
            cx.local("xreqtest_enabled")?
        ));
        Ok(())
    }
}

pub struct TaskCancel;

impl TaskType<CHook> for TaskCancel {
    fn name(&self) -> &'static str {
        "TaskCancel"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PrePmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.build())
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(scorep_request_local())
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let req = cx.local("local_scorep_req")?;
        out.push(format!(
            "{req} = scorep_mpi_request_get( *{} );\n\
             scorep_mpi_request_set_cancel( {req} );\n\
             scorep_mpi_unmark_request( {req} );\n",
            cx.param("request")?
        ));
        Ok(())
    }
}

/// Wraps the real call in a block that is skipped for requests the
/// measurement system already released. Opens the block before the call
/// and closes it right after, so it must be the first task contributing
/// to the post-call hook.
pub struct TaskRequestFree;

impl TaskType<CHook> for TaskRequestFree {
    fn name(&self) -> &'static str {
        "TaskRequestFree"
    }

    fn has_conflict_with(&self, other: &dyn TaskType<CHook>) -> bool {
        other.hooks().contains(&CHook::PostPmpiCall)
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::PrePmpiCall, CHook::PostPmpiCall]
    }

    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        Ok(setup.mapping().param("request")?.build())
    }

    fn needs_local_variables(&self, cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::initialized(
            Binding::new("local_got_null_request", "int").constant(),
            format!("(*{} == MPI_REQUEST_NULL)", cx.param("request")?),
        )]))
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        if hook == CHook::PostPmpiCall {
            out.push("}\n");
            return Ok(());
        }
        let request = cx.param("request")?;
        out.push(format!("scorep_mpi_request_free_wrapper( {request} );\n"));
        out.push(format!(
            "if ( *{request} != MPI_REQUEST_NULL || {} ) \n",
            cx.local("local_got_null_request")?
        ));
        out.push("{\n");
        Ok(())
    }
}
