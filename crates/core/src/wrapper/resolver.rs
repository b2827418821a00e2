//! Attachment rules
//!
//! Pure checks over the list of attached task types. The wrapper uses them
//! before constructing tasks, introspection uses them without constructing
//! anything.

use tracing::debug;

use crate::error::{DependencyErrorKind, Error, Result};
use crate::hooks::Hook;
use crate::task::{TaskRef, is_a};

/// Check whether `task` may be attached after `attached`, in rule order:
/// duplicate, conflict, unmet dependency, auxiliary with a regular dependency.
pub fn check_attachable<H: Hook>(
    procedure: &str,
    attached: &[TaskRef<H>],
    task: TaskRef<H>,
) -> Result<()> {
    if !task.allow_multiple_instances() && attached.iter().any(|a| a.name() == task.name()) {
        return Err(Error::dependency(
            procedure,
            DependencyErrorKind::Duplicate,
            format!("Cannot add the same task twice ({})", task.name()),
        ));
    }

    for other in attached {
        if task.has_conflict_with(*other) {
            return Err(Error::dependency(
                procedure,
                DependencyErrorKind::Conflict,
                format!("Task {} conflicts with {}", task.name(), other.name()),
            ));
        }
    }

    for dependency in task.dependencies() {
        if !attached.iter().any(|a| is_a(*a, *dependency)) {
            return Err(Error::dependency(
                procedure,
                DependencyErrorKind::Unmet,
                format!(
                    "Dependency of task {} is not fulfilled ({})",
                    task.name(),
                    dependency.name()
                ),
            ));
        }
    }

    if task.is_auxiliary() {
        if let Some(dependency) = task.dependencies().iter().find(|d| !d.is_auxiliary()) {
            return Err(Error::dependency(
                procedure,
                DependencyErrorKind::AuxiliaryWithRegularDependency,
                format!(
                    "Auxiliary task {} has a non-auxiliary dependency {}",
                    task.name(),
                    dependency.name()
                ),
            ));
        }
    }

    Ok(())
}

/// The task types one `attach(task)` call adds, in order.
///
/// Missing auxiliary dependencies come first, depth-first and sorted by name
/// at each level, followed by `task` itself. Every step is validated against
/// the attached list as it would be at that point.
pub fn plan_attachment<H: Hook>(
    procedure: &str,
    attached: &[TaskRef<H>],
    task: TaskRef<H>,
) -> Result<Vec<TaskRef<H>>> {
    let mut simulated = attached.to_vec();
    let mut planned = Vec::new();
    add_auxiliary_dependencies(procedure, &mut simulated, &mut planned, task)?;
    check_attachable(procedure, &simulated, task)?;
    planned.push(task);
    Ok(planned)
}

fn add_auxiliary_dependencies<H: Hook>(
    procedure: &str,
    simulated: &mut Vec<TaskRef<H>>,
    planned: &mut Vec<TaskRef<H>>,
    task: TaskRef<H>,
) -> Result<()> {
    let mut auxiliaries: Vec<TaskRef<H>> = task
        .dependencies()
        .iter()
        .copied()
        .filter(|d| d.is_auxiliary())
        .collect();
    auxiliaries.sort_by_key(|d| d.name());

    for dependency in auxiliaries {
        if simulated.iter().any(|a| a.name() == dependency.name()) {
            continue;
        }
        add_auxiliary_dependencies(procedure, simulated, planned, dependency)?;
        check_attachable(procedure, simulated, dependency)?;
        debug!("{}: auto-attaching auxiliary {}", procedure, dependency.name());
        simulated.push(dependency);
        planned.push(dependency);
    }
    Ok(())
}
