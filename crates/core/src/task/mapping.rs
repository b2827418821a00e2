use crate::error::{Error, Result};
use crate::types::{ProcedureDescriptor, Scope};

/// Builder for a task's alias → parameter-name mapping.
///
/// Every name is checked against the procedure's parameter list, so a task
/// attached to a procedure it cannot handle fails at attach time.
#[derive(Debug, Clone)]
pub struct ParameterMapping<'a> {
    procedure: &'a ProcedureDescriptor,
    names: Scope<String>,
}

impl<'a> ParameterMapping<'a> {
    pub fn new(procedure: &'a ProcedureDescriptor) -> Self {
        Self {
            procedure,
            names: Scope::new(),
        }
    }

    /// Use the parameter under its own name.
    pub fn param(self, name: &str) -> Result<Self> {
        self.rename(name, name)
    }

    /// Use parameter `actual` under `alias`.
    pub fn rename(mut self, alias: &str, actual: &str) -> Result<Self> {
        if !self.procedure.has_parameter(actual) {
            return Err(Error::ParameterResolution(format!(
                "No parameter named '{actual}' in '{}'",
                self.procedure.std_name
            )));
        }
        self.names.set(alias, actual.to_string());
        Ok(self)
    }

    /// Use under `alias` the one parameter among `candidates` that the
    /// procedure takes. Zero or several matches are an error.
    pub fn any_of(mut self, alias: &str, candidates: &[&str]) -> Result<Self> {
        let matching: Vec<&str> = self
            .procedure
            .parameters
            .iter()
            .map(|p| p.name())
            .filter(|name| candidates.contains(name))
            .collect();
        match matching.as_slice() {
            [single] => {
                self.names.set(alias, single.to_string());
                Ok(self)
            }
            [] => Err(Error::ParameterResolution(format!(
                "None of {candidates:?} are parameters of '{}'",
                self.procedure.std_name
            ))),
            _ => Err(Error::ParameterResolution(format!(
                "More than one of {candidates:?} are parameters of '{}'",
                self.procedure.std_name
            ))),
        }
    }

    /// The parameter an alias resolved to so far.
    pub fn resolved(&self, alias: &str) -> Option<&str> {
        self.names.find(alias).map(String::as_str)
    }

    pub fn build(self) -> Scope<String> {
        self.names
    }
}
