//! Marker tasks and auxiliaries shared across procedure families

use crate::error::Result;
use crate::hooks::Fragments;
use crate::layers::f08::{F08Hook, render};
use crate::task::{TaskContext, TaskType};
use crate::types::{Binding, Scope, Variable};

/// Marks the default behavior as explicitly wanted. Must be the only task.
pub struct TaskDefault;

impl TaskType<F08Hook> for TaskDefault {
    fn name(&self) -> &'static str {
        "TaskDefault"
    }

    fn has_conflict_with(&self, _other: &dyn TaskType<F08Hook>) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::Comment]
    }

    fn emit(&self, _hook: F08Hook, _cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push("!> Default wrapper: Only enter and exit events are created.\n");
        Ok(())
    }
}

pub struct TaskTodo;

impl TaskType<F08Hook> for TaskTodo {
    fn name(&self) -> &'static str {
        "TaskTodo"
    }

    fn allow_multiple_instances(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::Comment]
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let message: String = cx
            .attributes()
            .get_or("message", "This wrapper is not fully implemented.".to_string())?;
        out.push(format!("!> TODO: {message} \n"));
        Ok(())
    }
}

/// Stops the program with the `message` attribute.
pub struct TaskFatal;

impl TaskType<F08Hook> for TaskFatal {
    fn name(&self) -> &'static str {
        "TaskFatal"
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::Comment, F08Hook::Initialization]
    }

    fn emit(&self, hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        match hook {
            F08Hook::Comment => out.push("!> Aborts the measurement.\n"),
            _ => {
                let message: String = cx.attributes().get_as("message")?;
                out.push(render::fatal(&message));
            }
        }
        Ok(())
    }
}

pub struct TaskGetRequestId;

impl TaskType<F08Hook> for TaskGetRequestId {
    fn name(&self) -> &'static str {
        "TaskGetRequestId"
    }

    fn is_auxiliary(&self) -> bool {
        true
    }

    fn hooks(&self) -> &'static [F08Hook] {
        &[F08Hook::EnterIfGroupActive]
    }

    fn needs_local_variables(&self, _cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        Ok(Scope::from_named([Variable::new(Binding::new(
            "local_request_id",
            "integer(SCOREP_MpiRequestId)",
        ))]))
    }

    fn emit(&self, _hook: F08Hook, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        out.push(format!(
            "{} = scorep_mpi_get_request_id()\n",
            cx.local("local_request_id")?
        ));
        Ok(())
    }
}
