use super::attributes::{AttributeView, Attributes};
use super::mapping::ParameterMapping;
use crate::error::{Error, Result};
use crate::types::{Binding, ProcedureDescriptor, Scope, Variable};

/// What a task sees while resolving its parameter aliases.
#[derive(Debug, Clone, Copy)]
pub struct TaskSetup<'a> {
    procedure: &'a ProcedureDescriptor,
    attributes: AttributeView<'a>,
}

impl<'a> TaskSetup<'a> {
    pub fn new(task: &'a str, procedure: &'a ProcedureDescriptor, attributes: &'a Attributes) -> Self {
        Self {
            procedure,
            attributes: AttributeView::new(task, &procedure.std_name, attributes),
        }
    }

    pub fn procedure(&self) -> &'a ProcedureDescriptor {
        self.procedure
    }

    pub fn attributes(&self) -> &AttributeView<'a> {
        &self.attributes
    }

    pub fn mapping(&self) -> ParameterMapping<'a> {
        ParameterMapping::new(self.procedure)
    }
}

/// What a task sees while declaring locals and emitting hook output.
///
/// Parameter access goes through the task's resolved aliases; local access
/// covers the wrapper's own locals and every task local declared so far.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    procedure: &'a ProcedureDescriptor,
    attributes: AttributeView<'a>,
    aliases: &'a Scope<Binding>,
    wrapper_locals: &'a Scope<Variable>,
    task_locals: &'a Scope<Variable>,
}

impl<'a> TaskContext<'a> {
    pub fn new(
        task: &'a str,
        procedure: &'a ProcedureDescriptor,
        attributes: &'a Attributes,
        aliases: &'a Scope<Binding>,
        wrapper_locals: &'a Scope<Variable>,
        task_locals: &'a Scope<Variable>,
    ) -> Self {
        Self {
            procedure,
            attributes: AttributeView::new(task, &procedure.std_name, attributes),
            aliases,
            wrapper_locals,
            task_locals,
        }
    }

    pub fn procedure(&self) -> &'a ProcedureDescriptor {
        self.procedure
    }

    pub fn attributes(&self) -> &AttributeView<'a> {
        &self.attributes
    }

    /// Internal name of the parameter behind `alias`.
    pub fn param(&self, alias: &str) -> Result<&'a str> {
        Ok(self.aliases.get(alias)?.name.as_str())
    }

    pub fn has_param(&self, alias: &str) -> bool {
        self.aliases.contains(alias)
    }

    /// Internal name of a procedure parameter that is not aliased by the task.
    pub fn internal_name(&self, parameter: &str) -> Result<String> {
        Ok(self.procedure.parameter(parameter)?.internal_name())
    }

    /// Name of a local variable declared by the wrapper or any task.
    pub fn local(&self, name: &str) -> Result<&'a str> {
        self.task_locals
            .find(name)
            .or_else(|| self.wrapper_locals.find(name))
            .map(Variable::name)
            .ok_or_else(|| Error::Lookup(name.to_string()))
    }
}
