use serde::Serialize;

use super::binding::Binding;
use super::names;
use super::version::Version;
use crate::error::{Error, Result};
use crate::impl_case_insensitive_deserialize;

/// Data flow direction of a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    In,
    Out,
    InOut,
}

impl_case_insensitive_deserialize!(
    Direction,
    In => "in",
    Out => "out",
    InOut => "inout"
);

impl Direction {
    /// Spelling inside a Fortran `INTENT(...)` clause.
    pub fn intent(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::InOut => "INOUT",
        }
    }
}

/// How a status output parameter is substituted when the caller passes the
/// library's "ignore" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IgnoreHandling {
    #[default]
    None,
    /// A single status.
    Status,
    /// An array of statuses with the given length expression.
    Statuses { length: String },
}

/// One parameter of a procedure in a specific binding layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub binding: Binding,
    pub direction: Direction,
    /// Forwarded to the real call under `internal_<name>`.
    pub internal_replacement: bool,
    pub ignore_handling: IgnoreHandling,
    /// Choice buffer (untyped data) parameter.
    pub buffer: bool,
}

impl Parameter {
    pub fn new(binding: Binding) -> Self {
        Self {
            binding,
            direction: Direction::In,
            internal_replacement: false,
            ignore_handling: IgnoreHandling::None,
            buffer: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.binding.name
    }

    pub fn is_optional_out(&self) -> bool {
        self.direction != Direction::In && self.binding.has_attribute("OPTIONAL")
    }

    /// The binding the wrapper forwards to the real call.
    ///
    /// Without an internal replacement this is the parameter itself.
    /// Replacements drop `OPTIONAL` and become pointers when they stand in
    /// for an ignorable status.
    pub fn internal_binding(&self) -> Binding {
        let mut binding = self.binding.clone();
        if !self.internal_replacement {
            return binding;
        }
        binding.name = format!("internal_{}", self.binding.name);
        binding.attributes.retain(|a| !a.eq_ignore_ascii_case("OPTIONAL"));
        match &self.ignore_handling {
            IgnoreHandling::None => {}
            IgnoreHandling::Status => binding.attributes.push("POINTER".to_string()),
            IgnoreHandling::Statuses { .. } => {
                binding.dims = vec![":".to_string()];
                binding.attributes.push("POINTER".to_string());
            }
        }
        binding
    }

    pub fn internal_name(&self) -> String {
        if self.internal_replacement {
            format!("internal_{}", self.binding.name)
        } else {
            self.binding.name.clone()
        }
    }
}

/// Immutable description of one procedure in one binding layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureDescriptor {
    /// Lower case, `mpi_` prefix, no large-count suffix.
    pub canonical_name: String,
    /// Name as spelled by the standard, e.g. `MPI_Send_c`.
    pub std_name: String,
    pub version: Version,
    pub return_type: Option<String>,
    pub parameters: Vec<Parameter>,
    pub embiggened: bool,
}

impl ProcedureDescriptor {
    pub fn new(std_name: impl Into<String>, version: Version) -> Self {
        let std_name = std_name.into();
        Self {
            canonical_name: names::canonical_name(&std_name),
            std_name,
            version,
            return_type: None,
            parameters: Vec::new(),
            embiggened: false,
        }
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn embiggened(mut self) -> Self {
        self.embiggened = true;
        self
    }

    pub fn parameter(&self, name: &str) -> Result<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| {
                Error::Lookup(format!("no parameter named '{name}' in '{}'", self.std_name))
            })
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name() == name)
    }

    pub fn internal_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.internal_replacement)
    }
}
