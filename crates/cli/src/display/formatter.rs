use std::fmt::Write;
use wrapgen_core::TaskDescription;

/// Human readable rendering of one task description.
pub fn format_task(task: &TaskDescription) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🔧 {}", task.name);

    if !task.dependencies.is_empty() {
        let deps: Vec<String> = task
            .dependencies
            .iter()
            .map(|dep| {
                if dep.auxiliary {
                    format!("{} (auxiliary)", dep.name)
                } else {
                    dep.name.clone()
                }
            })
            .collect();
        let _ = writeln!(out, "   Depends on: {}", deps.join(", "));
    }

    if !task.locals.is_empty() {
        let _ = writeln!(out, "   Locals:");
        for local in &task.locals {
            let _ = writeln!(out, "     {local}");
        }
    }

    for hook in &task.hooks {
        let _ = writeln!(out, "   {} <- {}", hook.hook, hook.tasks.join(", "));
    }
    out
}

pub fn print_tasks(tasks: &[TaskDescription]) {
    for task in tasks {
        println!("{}", format_task(task));
    }
    println!("{} task types", tasks.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapgen_core::introspect::{DependencyDescription, HookDescription};

    #[test]
    fn test_format_task() {
        let task = TaskDescription {
            name: "TaskSend".to_string(),
            dependencies: vec![
                DependencyDescription {
                    name: "TaskP2pBytes".to_string(),
                    auxiliary: true,
                },
                DependencyDescription {
                    name: "TaskEnterRegion".to_string(),
                    auxiliary: false,
                },
            ],
            locals: vec!["int sz".to_string()],
            hooks: vec![HookDescription {
                hook: "PrePmpiCall".to_string(),
                tasks: vec!["TaskSend".to_string(), "TaskP2pBytes".to_string()],
            }],
        };
        let text = format_task(&task);
        assert!(text.starts_with("🔧 TaskSend\n"));
        assert!(text.contains("Depends on: TaskP2pBytes (auxiliary), TaskEnterRegion\n"));
        assert!(text.contains("     int sz\n"));
        assert!(text.contains("PrePmpiCall <- TaskSend, TaskP2pBytes\n"));
    }

    #[test]
    fn test_format_bare_task() {
        let task = TaskDescription {
            name: "TaskPcontrol".to_string(),
            dependencies: Vec::new(),
            locals: Vec::new(),
            hooks: Vec::new(),
        };
        assert_eq!(format_task(&task), "🔧 TaskPcontrol\n");
    }
}
