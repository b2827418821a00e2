//! Marker tasks and auxiliaries shared across procedure families

use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::c::CHook;
use crate::task::{TaskContext, TaskType};
use crate::types::{Binding, Scope, Variable};

/// Marks the default behavior as explicitly wanted, so the wrapper is not
/// reported as unfinished. Must be the only task.
pub struct TaskDefault;

impl TaskType<CHook> for TaskDefault {
    fn name(&self) -> &'static str {
        "TaskDefault"
    }

    fn has_conflict_with(&self, _other: &dyn TaskType<CHook>) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::Comment]
    }

    fn emit(&self, _hook: CHook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push("* Default wrapper: Only enter and exit events are created.\n");
        Ok(())
    }
}

/// Marks the wrapper as not fully implemented.
pub struct TaskTodo;

impl TaskType<CHook> for TaskTodo {
    fn name(&self) -> &'static str {
        "TaskTodo"
    }

    fn allow_multiple_instances(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::Comment]
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let message: String = cx
            .attributes()
            .get_or("message", "This wrapper is not fully implemented.".to_string())?;
        out.push(format!("* TODO: {message}\n"));
        Ok(())
    }
}

/// Aborts the measurement with the `message` attribute.
pub struct TaskFatal;

impl TaskType<CHook> for TaskFatal {
    fn name(&self) -> &'static str {
        "TaskFatal"
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::Comment, CHook::Initialization]
    }

    fn emit(&self, hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            CHook::Comment => out.push("* Aborts the measurement.\n"),
            _ => {
                let message: String = cx.attributes().get_as("message")?;
                out.push(format!("UTILS_FATAL( \"{message}\" );\n"));
            }
        }
        Ok(())
    }
}

/// Declares `local_request_id` and draws a fresh request id on enter.
pub struct TaskGetRequestId;

impl TaskType<CHook> for TaskGetRequestId {
    fn name(&self) -> &'static str {
        "TaskGetRequestId"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [CHook] {
        &[CHook::EnterIfGroupActive]
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::new(Binding::new(
            "local_request_id",
            "SCOREP_MpiRequestId",
        ))]))
    }

    fn emit(&self, _hook: CHook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "{} = scorep_mpi_get_request_id();\n",
            cx.local("local_request_id")?
        ));
        Ok(())
    }
}
