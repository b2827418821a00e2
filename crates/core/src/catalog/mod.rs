//! Procedure catalog
//!
//! A JSON document listing, per procedure, the signatures in each binding
//! layer and the declarative task list that drives its wrapper:
//!
//! ```json
//! {
//!   "procedures": [
//!     {
//!       "canonical_name": "mpi_send",
//!       "version": "1.0",
//!       "group": "p2p",
//!       "tasks": [{ "type": "TaskSend" }],
//!       "c": { "name": "MPI_Send", "return_type": "int", "parameters": [] }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::layers::{Template, WrapperOptions};
use crate::task::Attributes;
use crate::types::{
    Binding, Direction, IgnoreHandling, Layer, Parameter, ProcedureDescriptor, Version, names,
};

/// Large-count variants were introduced with this version.
const EMBIGGENED_SINCE: Version = Version::new(4, 0);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub procedures: Vec<ProcedureRecord>,
}

impl Catalog {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents).map_err(|e| match e {
            Error::Catalog(msg) => Error::Catalog(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        debug!(
            "Loaded {} procedures from {}",
            catalog.procedures.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parses and validates a catalog document.
    pub fn from_json(contents: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(contents)
            .map_err(|e| Error::Catalog(format!("Failed to parse catalog: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for record in &self.procedures {
            if !names::is_canonical(&record.canonical_name) {
                return Err(Error::Catalog(format!(
                    "'{}' is not a canonical procedure name, expected '{}'",
                    record.canonical_name,
                    names::canonical_name(&record.canonical_name)
                )));
            }
            if !seen.insert(record.canonical_name.as_str()) {
                return Err(Error::Catalog(format!(
                    "Procedure '{}' is listed more than once",
                    record.canonical_name
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, canonical_name: &str) -> Option<&ProcedureRecord> {
        self.procedures
            .iter()
            .find(|p| p.canonical_name == canonical_name)
    }

    /// Like [`Catalog::get`], but also accepts standard spellings such as
    /// `MPI_Send`.
    pub fn lookup(&self, name: &str) -> Result<&ProcedureRecord> {
        self.get(name)
            .or_else(|| self.get(&names::canonical_name(name)))
            .ok_or_else(|| Error::UnknownProcedure(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.procedures.iter().map(|p| p.canonical_name.as_str())
    }
}

/// One procedure and how to wrap it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureRecord {
    pub canonical_name: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub group: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guards: Vec<String>,
    #[serde(default)]
    pub template: Template,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub c_variants: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f08: Option<Signature>,
}

impl ProcedureRecord {
    /// Signature in `layer`, `None` if the procedure is not expressible there.
    pub fn signature(&self, layer: Layer) -> Option<&Signature> {
        match layer {
            Layer::C => self.c.as_ref(),
            Layer::F08 => self.f08.as_ref(),
        }
    }

    /// Task list for `layer`. A list on the signature replaces the
    /// procedure-wide one.
    pub fn tasks_for(&self, layer: Layer) -> &[TaskData] {
        self.signature(layer)
            .and_then(|s| s.tasks.as_deref())
            .unwrap_or(self.tasks.as_slice())
    }

    /// Descriptor of the regular signature in `layer`.
    pub fn descriptor(&self, layer: Layer) -> Result<ProcedureDescriptor> {
        let signature = self.signature(layer).ok_or_else(|| self.not_expressible(layer))?;
        signature.to_descriptor(&self.canonical_name, self.version, layer, false)
    }

    /// Descriptor of the large-count signature in `layer`, if there is one.
    pub fn embiggened_descriptor(&self, layer: Layer) -> Result<Option<ProcedureDescriptor>> {
        let Some(signature) = self.signature(layer).and_then(|s| s.embiggened.as_deref()) else {
            return Ok(None);
        };
        let version = self.version.max(EMBIGGENED_SINCE);
        signature
            .to_descriptor(&self.canonical_name, version, layer, true)
            .map(Some)
    }

    pub fn options(&self, debug: bool, strict: bool) -> WrapperOptions {
        WrapperOptions {
            template: self.template,
            guards: self.guards.clone(),
            group: self.group.clone(),
            c_variants: self.c_variants.clone(),
            debug,
            strict,
        }
    }

    pub fn not_expressible(&self, layer: Layer) -> Error {
        Error::NotExpressible {
            procedure: self.canonical_name.clone(),
            layer: layer.to_string(),
        }
    }
}

/// Signature of a procedure in one binding layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    /// Name as spelled by the standard, e.g. `MPI_Send`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embiggened: Option<Box<Signature>>,
}

impl Signature {
    pub fn to_descriptor(
        &self,
        canonical_name: &str,
        version: Version,
        layer: Layer,
        embiggened: bool,
    ) -> Result<ProcedureDescriptor> {
        let mut descriptor = ProcedureDescriptor::new(&self.name, version);
        descriptor.canonical_name = canonical_name.to_string();
        descriptor.return_type = self.return_type.clone();
        descriptor.embiggened = embiggened;
        descriptor.parameters = self
            .parameters
            .iter()
            .map(|p| p.to_parameter(layer))
            .collect::<Result<_>>()?;
        Ok(descriptor)
    }
}

/// One parameter of a [`Signature`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRecord {
    #[serde(flatten)]
    pub binding: Binding,
    #[serde(default)]
    pub direction: Direction,
    /// Forward under `internal_<name>`.
    #[serde(default)]
    pub internal: bool,
    /// Choice buffer.
    #[serde(default)]
    pub buffer: bool,
    #[serde(default)]
    pub handle_status_ignore: bool,
    #[serde(default)]
    pub handle_statuses_ignore: bool,
    /// Length expression of an ignorable status array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuses_length: Option<String>,
}

impl ParameterRecord {
    /// In the Fortran layer, optional outputs and ignorable statuses always
    /// go through an internal replacement.
    pub fn to_parameter(&self, layer: Layer) -> Result<Parameter> {
        let ignore_handling = match (self.handle_status_ignore, self.handle_statuses_ignore) {
            (false, false) => IgnoreHandling::None,
            (true, false) => IgnoreHandling::Status,
            (false, true) => IgnoreHandling::Statuses {
                length: self.statuses_length.clone().ok_or_else(|| {
                    Error::Catalog(format!(
                        "Parameter '{}' handles ignored statuses but has no 'statuses_length'",
                        self.binding.name
                    ))
                })?,
            },
            (true, true) => {
                return Err(Error::Catalog(format!(
                    "Parameter '{}' cannot handle both a status and a status array",
                    self.binding.name
                )));
            }
        };

        let mut parameter = Parameter::new(self.binding.clone());
        parameter.direction = self.direction;
        parameter.buffer = self.buffer;
        parameter.ignore_handling = ignore_handling;
        parameter.internal_replacement = self.internal
            || (layer == Layer::F08
                && (parameter.is_optional_out() || parameter.ignore_handling != IgnoreHandling::None));
        Ok(parameter)
    }
}

/// A task type name and the attributes of the instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl TaskData {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: Attributes::new(),
        }
    }
}
