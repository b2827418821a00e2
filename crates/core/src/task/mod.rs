//! Tasks: composable behavior extensions of a wrapper
//!
//! A task type is a zero-sized value implementing [`TaskType`]. It declares
//! its relations to other task types (dependencies, conflicts, auxiliary
//! status), the hooks it contributes to, and how to build its per-instance
//! [`TaskState`] when attached to a wrapper.

pub mod attributes;
pub mod context;
pub mod mapping;

pub use attributes::{AttributeView, Attributes};
pub use context::{TaskContext, TaskSetup};
pub use mapping::ParameterMapping;

use crate::error::Result;
use crate::hooks::{Fragments, Hook};
use crate::types::{Binding, Scope, Variable};

/// Reference to a statically declared task type.
pub type TaskRef<H> = &'static dyn TaskType<H>;

/// Static contract of a task type for the hook catalog `H`.
///
/// Type identity is the [`name`](TaskType::name); names are unique within a
/// layer's registry.
pub trait TaskType<H: Hook>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Supertype of this task type. A dependency on a type is also met by
    /// any attached subtype of it.
    fn parent(&self) -> Option<TaskRef<H>> {
        None
    }

    /// Task types that must be attached before this one. Auxiliary
    /// dependencies are attached automatically.
    fn dependencies(&self) -> &'static [TaskRef<H>] {
        &[]
    }

    /// Whether this type refuses to be attached after `other`.
    ///
    /// Only the task being attached is asked, about each already attached
    /// type. Attaching `other` after `self` does not consult this method on
    /// `self`.
    fn has_conflict_with(&self, other: &dyn TaskType<H>) -> bool {
        let _ = other;
        false
    }

    fn allow_multiple_instances(&self) -> bool {
        false
    }

    /// Auxiliary tasks take no attributes and are attached on demand.
    fn is_auxiliary(&self) -> bool {
        false
    }

    /// Hooks this type contributes to; [`emit`](TaskType::emit) is only
    /// called for these.
    fn hooks(&self) -> &'static [H] {
        &[]
    }

    /// Library names the generated wrapper must import for this task.
    fn required_imports(&self) -> &'static [&'static str] {
        &[]
    }

    /// Map aliases used by the task to procedure parameter names.
    fn needs_parameter_names(&self, setup: &TaskSetup<'_>) -> Result<Scope<String>> {
        let _ = setup;
        Ok(Scope::new())
    }

    /// Local variables declared by the task. Called once, after the
    /// parameter aliases are resolved.
    fn needs_local_variables(&self, cx: &TaskContext<'_>) -> Result<Scope<Variable>> {
        let _ = cx;
        Ok(Scope::new())
    }

    /// Append this task's output for `hook`.
    fn emit(&self, hook: H, cx: &TaskContext<'_>, out: &mut Fragments) -> Result<()> {
        let _ = (hook, cx, out);
        Ok(())
    }
}

impl<H: Hook> std::fmt::Debug for dyn TaskType<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `ty` is `target` or one of its subtypes.
pub fn is_a<H: Hook>(ty: TaskRef<H>, target: &dyn TaskType<H>) -> bool {
    lineage(ty).any(|t| t.name() == target.name())
}

/// `ty` followed by its ancestors.
pub fn lineage<H: Hook>(ty: TaskRef<H>) -> impl Iterator<Item = TaskRef<H>> {
    std::iter::successors(Some(ty), |t| t.parent())
}

/// Names of every type in the transitive dependency closure of `ty`,
/// including the ancestors of each member.
pub fn dependency_closure<H: Hook>(ty: TaskRef<H>) -> Vec<&'static str> {
    let mut closure = Vec::new();
    let mut visited = Vec::new();
    let mut stack: Vec<TaskRef<H>> = ty.dependencies().to_vec();
    while let Some(dep) = stack.pop() {
        if visited.contains(&dep.name()) {
            continue;
        }
        visited.push(dep.name());
        for t in lineage(dep) {
            if !closure.contains(&t.name()) {
                closure.push(t.name());
            }
        }
        stack.extend(dep.dependencies().iter().copied());
    }
    closure
}

/// Per-instance data of an attached task.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub task: &'static str,
    pub procedure: String,
    pub attributes: Attributes,
    /// Resolved alias → internal parameter binding.
    pub aliases: Scope<Binding>,
}

/// A task type together with its instance state.
#[derive(Debug, Clone)]
pub struct AttachedTask<H: Hook> {
    pub ty: TaskRef<H>,
    pub state: TaskState,
}

impl<H: Hook> AttachedTask<H> {
    pub fn name(&self) -> &'static str {
        self.ty.name()
    }
}
