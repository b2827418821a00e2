use serde::{Deserialize, Serialize};

use super::scope::Named;

/// A named parameter or local variable with its type metadata.
///
/// The type is kept as the spelling of the target language, e.g. `MPI_Comm`
/// for C or `TYPE(MPI_Comm)` for Fortran. `attributes` only matter for
/// Fortran declarations (`OPTIONAL`, `ASYNCHRONOUS`, `POINTER`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub pointer: u8,
    #[serde(default)]
    pub dims: Vec<String>,
    #[serde(default, rename = "const")]
    pub is_const: bool,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl Binding {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            pointer: 0,
            dims: Vec::new(),
            is_const: false,
            attributes: Vec::new(),
        }
    }

    pub fn with_pointer(mut self, level: u8) -> Self {
        self.pointer = level;
        self
    }

    pub fn with_dim(mut self, dim: impl Into<String>) -> Self {
        self.dims.push(dim.into());
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case(attribute))
    }

    /// Pointer or array binding.
    pub fn is_indirect(&self) -> bool {
        self.pointer > 0 || !self.dims.is_empty()
    }
}

impl Named for Binding {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A local variable: a binding plus an optional initializer expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub binding: Binding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<String>,
}

impl Variable {
    pub fn new(binding: Binding) -> Self {
        Self {
            binding,
            initializer: None,
        }
    }

    pub fn initialized(binding: Binding, initializer: impl Into<String>) -> Self {
        Self {
            binding,
            initializer: Some(initializer.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.binding.name
    }
}

impl Named for Variable {
    fn name(&self) -> &str {
        &self.binding.name
    }
}
