//! Task registry
//!
//! Maps catalog task names to the statically declared task types of one
//! binding layer.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::hooks::Hook;
use crate::task::TaskRef;
use crate::types::Layer;

/// Registry of the task types of one layer
pub struct TaskRegistry<H: Hook> {
    layer: Layer,
    tasks: HashMap<&'static str, TaskRef<H>>,
}

impl<H: Hook> std::fmt::Debug for TaskRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("layer", &self.layer)
            .field("tasks", &self.list_tasks())
            .finish()
    }
}

impl<H: Hook> TaskRegistry<H> {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            tasks: HashMap::new(),
        }
    }

    pub fn builder(layer: Layer) -> TaskRegistryBuilder<H> {
        TaskRegistryBuilder {
            registry: Self::new(layer),
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Register a task type under its name, replacing any previous entry.
    pub fn register(&mut self, task: TaskRef<H>) {
        self.tasks.insert(task.name(), task);
    }

    pub fn get(&self, name: &str) -> Option<TaskRef<H>> {
        self.tasks.get(name).copied()
    }

    /// Like [`get`](Self::get), failing with [`Error::UnknownTask`].
    pub fn lookup(&self, name: &str) -> Result<TaskRef<H>> {
        self.get(name).ok_or_else(|| Error::UnknownTask {
            layer: self.layer.to_string(),
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn list_tasks(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.tasks.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Registered task types, sorted by name.
    pub fn tasks(&self) -> Vec<TaskRef<H>> {
        let mut tasks: Vec<_> = self.tasks.values().copied().collect();
        tasks.sort_by_key(|t| t.name());
        tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Builder for [`TaskRegistry`]
pub struct TaskRegistryBuilder<H: Hook> {
    registry: TaskRegistry<H>,
}

impl<H: Hook> TaskRegistryBuilder<H> {
    pub fn with_task(mut self, task: TaskRef<H>) -> Self {
        self.registry.register(task);
        self
    }

    pub fn with_tasks(mut self, tasks: &[TaskRef<H>]) -> Self {
        for task in tasks {
            self.registry.register(*task);
        }
        self
    }

    pub fn build(self) -> TaskRegistry<H> {
        self.registry
    }
}
