//! Task introspection
//!
//! Describes what attaching a task type brings along without a real
//! procedure: the auto-attached dependencies, the declared locals and which
//! task contributes to which hook.

use serde::Serialize;

use crate::error::Result;
use crate::hooks::Hook;
use crate::registry::TaskRegistry;
use crate::task::{Attributes, TaskContext, TaskRef};
use crate::types::{ProcedureDescriptor, Scope, Version};
use crate::wrapper::plan_attachment;

const TRACKER: &str = "Dependency Tracker";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDescription {
    pub name: String,
    pub auxiliary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookDescription {
    pub hook: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDescription {
    pub name: String,
    pub dependencies: Vec<DependencyDescription>,
    /// Local names, or a placeholder for tasks whose locals depend on the
    /// procedure.
    pub locals: Vec<String>,
    pub hooks: Vec<HookDescription>,
}

/// Attach the non-auxiliary dependencies of `task`, then `task` itself, to
/// an empty tracker and describe the result.
pub fn describe_task<H: Hook>(task: TaskRef<H>) -> Result<TaskDescription> {
    let mut attached: Vec<TaskRef<H>> = Vec::new();
    for dependency in task.dependencies() {
        if dependency.is_auxiliary() || attached.iter().any(|a| a.name() == dependency.name()) {
            continue;
        }
        let plan = plan_attachment(TRACKER, &attached, *dependency)?;
        attached.extend(plan);
    }
    let plan = plan_attachment(TRACKER, &attached, task)?;
    attached.extend(plan);

    let dependencies = attached[..attached.len() - 1]
        .iter()
        .map(|t| DependencyDescription {
            name: t.name().to_string(),
            auxiliary: t.is_auxiliary(),
        })
        .collect();

    Ok(TaskDescription {
        name: task.name().to_string(),
        dependencies,
        locals: describe_locals(&attached),
        hooks: describe_hooks(&attached),
    })
}

/// Describe every non-auxiliary task type of a registry, sorted by name.
pub fn describe_layer<H: Hook>(registry: &TaskRegistry<H>) -> Result<Vec<TaskDescription>> {
    registry
        .tasks()
        .into_iter()
        .filter(|t| !t.is_auxiliary())
        .map(describe_task)
        .collect()
}

fn describe_locals<H: Hook>(attached: &[TaskRef<H>]) -> Vec<String> {
    let procedure = ProcedureDescriptor::new(TRACKER, Version::default());
    let attributes = Attributes::new();
    let aliases = Scope::new();
    let wrapper_locals = Scope::new();
    let mut task_locals = Scope::new();
    let mut placeholders = Vec::new();

    for task in attached {
        let cx = TaskContext::new(
            task.name(),
            &procedure,
            &attributes,
            &aliases,
            &wrapper_locals,
            &task_locals,
        );
        match task.needs_local_variables(&cx) {
            Ok(locals) => task_locals.merge(locals),
            Err(_) => placeholders.push(format!(
                "local_from_{} (procedure specific, cannot be shown here)",
                task.name()
            )),
        }
    }

    task_locals
        .names()
        .map(str::to_string)
        .chain(placeholders)
        .collect()
}

fn describe_hooks<H: Hook>(attached: &[TaskRef<H>]) -> Vec<HookDescription> {
    H::all()
        .iter()
        .filter_map(|hook| {
            let tasks: Vec<String> = attached
                .iter()
                .filter(|t| t.hooks().contains(hook))
                .map(|t| t.name().to_string())
                .collect();
            (!tasks.is_empty()).then(|| HookDescription {
                hook: hook.name().to_string(),
                tasks,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn test_describe_task_with_regular_dependency() {
        let description = describe_task(&TaskB).unwrap();
        assert_eq!(description.name, "TaskB");
        assert_eq!(
            description.dependencies,
            vec![DependencyDescription {
                name: "TaskA".to_string(),
                auxiliary: false,
            }]
        );
        assert_eq!(
            description.hooks,
            vec![
                HookDescription {
                    hook: "enter".to_string(),
                    tasks: vec!["TaskA".to_string(), "TaskB".to_string()],
                },
                HookDescription {
                    hook: "exit".to_string(),
                    tasks: vec!["TaskB".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_procedure_specific_locals_get_a_placeholder() {
        let description = describe_task(&SendLike).unwrap();
        let names: Vec<_> = description.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["AuxBytes", "AuxComm"]);
        assert!(description.dependencies.iter().all(|d| d.auxiliary));
        assert_eq!(
            description.locals,
            vec![
                "local_bytes".to_string(),
                "local_from_AuxComm (procedure specific, cannot be shown here)".to_string(),
            ]
        );
    }

    #[test]
    fn test_describe_layer_skips_auxiliaries() {
        let registry = TaskRegistry::<TestHook>::builder(crate::types::Layer::C)
            .with_tasks(&[&TaskA, &TaskB, &AuxBytes])
            .build();
        let names: Vec<_> = describe_layer(&registry)
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["TaskA", "TaskB"]);
    }
}
