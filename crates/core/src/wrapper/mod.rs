//! Generation target shared by all binding layers
//!
//! [`Wrapper`] keeps the procedure descriptor, the wrapper-owned locals, the
//! locals contributed by tasks and the attached task list. Layer wrappers own
//! one and define the fixed sequence of hooks in their `generate`.

pub mod resolver;

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::hooks::{DebugFormatter, Hook, HookComposer};
use crate::task::{
    AttachedTask, Attributes, TaskContext, TaskRef, TaskSetup, TaskState, dependency_closure, lineage,
};
use crate::types::{Binding, ProcedureDescriptor, Scope, Variable};

pub use resolver::{check_attachable, plan_attachment};

#[derive(Debug)]
pub struct Wrapper<H: Hook> {
    procedure: ProcedureDescriptor,
    locals: Scope<Variable>,
    task_locals: Scope<Variable>,
    /// Declaring task type per task local.
    local_owners: HashMap<String, TaskRef<H>>,
    attached: Vec<AttachedTask<H>>,
    debug_formatter: Option<DebugFormatter>,
}

struct Checkpoint<H: Hook> {
    attached: usize,
    task_locals: Scope<Variable>,
    local_owners: HashMap<String, TaskRef<H>>,
}

impl<H: Hook> Wrapper<H> {
    pub fn new(procedure: ProcedureDescriptor, locals: Scope<Variable>) -> Self {
        Self {
            procedure,
            locals,
            task_locals: Scope::new(),
            local_owners: HashMap::new(),
            attached: Vec::new(),
            debug_formatter: None,
        }
    }

    pub fn procedure(&self) -> &ProcedureDescriptor {
        &self.procedure
    }

    /// Locals declared by the wrapper itself.
    pub fn own_locals(&self) -> &Scope<Variable> {
        &self.locals
    }

    /// Locals declared by attached tasks.
    pub fn task_locals(&self) -> &Scope<Variable> {
        &self.task_locals
    }

    /// Wrapper locals followed by task locals.
    pub fn all_locals(&self) -> impl Iterator<Item = &Variable> {
        self.locals.values().chain(self.task_locals.values())
    }

    pub fn attached_tasks(&self) -> &[AttachedTask<H>] {
        &self.attached
    }

    pub fn attached_types(&self) -> Vec<TaskRef<H>> {
        self.attached.iter().map(|t| t.ty).collect()
    }

    pub fn has_task(&self, name: &str) -> bool {
        self.attached.iter().any(|t| t.name() == name)
    }

    pub fn set_debug_formatter(&mut self, formatter: DebugFormatter) {
        self.debug_formatter = Some(formatter);
    }

    pub fn unset_debug_formatter(&mut self) {
        self.debug_formatter = None;
    }

    pub fn debug_formatter(&self) -> Option<DebugFormatter> {
        self.debug_formatter
    }

    pub fn composer(&self) -> HookComposer<'_, H> {
        HookComposer::new(self)
    }

    /// Attach a task, auto-attaching its missing auxiliary dependencies first.
    ///
    /// Either every planned task is attached or, on error, the wrapper is
    /// left exactly as before the call.
    pub fn attach(&mut self, task: TaskRef<H>, attributes: Attributes) -> Result<()> {
        let plan = plan_attachment(&self.procedure.canonical_name, &self.attached_types(), task)?;
        let checkpoint = self.checkpoint();

        let result = match plan.split_last() {
            Some((last, auxiliaries)) => auxiliaries
                .iter()
                .try_for_each(|aux| self.construct(*aux, Attributes::new()))
                .and_then(|()| self.construct(*last, attributes)),
            None => Ok(()),
        };

        if let Err(e) = result {
            debug!(
                "{}: rolling back attachment of {}: {}",
                self.procedure.canonical_name,
                task.name(),
                e
            );
            self.rollback(checkpoint);
            return Err(e);
        }
        Ok(())
    }

    /// Remove all attached tasks and the locals they declared.
    pub fn clear_attached_tasks(&mut self) {
        self.attached.clear();
        self.task_locals = Scope::new();
        self.local_owners.clear();
    }

    /// Context for an attached task, as seen by its hooks.
    pub fn context<'a>(&'a self, task: &'a AttachedTask<H>) -> TaskContext<'a> {
        TaskContext::new(
            task.state.task,
            &self.procedure,
            &task.state.attributes,
            &task.state.aliases,
            &self.locals,
            &self.task_locals,
        )
    }

    fn construct(&mut self, ty: TaskRef<H>, attributes: Attributes) -> Result<()> {
        let setup = TaskSetup::new(ty.name(), &self.procedure, &attributes);
        let names = ty.needs_parameter_names(&setup)?;

        let mut aliases: Scope<Binding> = Scope::new();
        for (alias, actual) in names.iter() {
            let parameter = self.procedure.parameter(actual)?;
            aliases.set(alias, parameter.internal_binding());
        }

        let locals = {
            let cx = TaskContext::new(
                ty.name(),
                &self.procedure,
                &attributes,
                &aliases,
                &self.locals,
                &self.task_locals,
            );
            ty.needs_local_variables(&cx)?
        };
        self.merge_task_locals(ty, locals)?;

        trace!("{}: attached {}", self.procedure.canonical_name, ty.name());
        self.attached.push(AttachedTask {
            ty,
            state: TaskState {
                task: ty.name(),
                procedure: self.procedure.canonical_name.clone(),
                attributes,
                aliases,
            },
        });
        Ok(())
    }

    /// A task may redeclare a local owned by its own type or by a type that
    /// is a member of its dependency closure, including subtypes attached to
    /// satisfy a dependency. Any other clash is an error.
    fn merge_task_locals(&mut self, ty: TaskRef<H>, locals: Scope<Variable>) -> Result<()> {
        let closure = dependency_closure(ty);
        for name in locals.names() {
            let owner = if self.locals.contains(name) {
                Some("the wrapper")
            } else {
                self.local_owners
                    .get(name)
                    .copied()
                    .filter(|owner| {
                        owner.name() != ty.name()
                            && !lineage(*owner).any(|t| closure.contains(&t.name()))
                    })
                    .map(|owner| owner.name())
            };
            if let Some(owner) = owner {
                return Err(Error::LocalCollision {
                    procedure: self.procedure.canonical_name.clone(),
                    task: ty.name().to_string(),
                    name: name.to_string(),
                    owner: owner.to_string(),
                });
            }
        }

        for name in locals.names() {
            self.local_owners.insert(name.to_string(), ty);
        }
        self.task_locals.merge(locals);
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint<H> {
        Checkpoint {
            attached: self.attached.len(),
            task_locals: self.task_locals.clone(),
            local_owners: self.local_owners.clone(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint<H>) {
        self.attached.truncate(checkpoint.attached);
        self.task_locals = checkpoint.task_locals;
        self.local_owners = checkpoint.local_owners;
    }
}
