use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Free-form per-instance task configuration from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Attribute access for one task instance.
///
/// Errors name the task type and the procedure it is attached to.
#[derive(Debug, Clone, Copy)]
pub struct AttributeView<'a> {
    task: &'a str,
    procedure: &'a str,
    attributes: &'a Attributes,
}

impl<'a> AttributeView<'a> {
    pub fn new(task: &'a str, procedure: &'a str, attributes: &'a Attributes) -> Self {
        Self {
            task,
            procedure,
            attributes,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.raw(name).is_some()
    }

    /// Present and not `null`.
    pub fn is_set(&self, name: &str) -> bool {
        self.attributes.raw(name).is_some_and(|v| !v.is_null())
    }

    /// Raw attribute value. Missing attributes are an error.
    pub fn get(&self, name: &str) -> Result<&'a Value> {
        self.attributes
            .raw(name)
            .ok_or_else(|| Error::MissingAttribute {
                task: self.task.to_string(),
                procedure: self.procedure.to_string(),
                attribute: name.to_string(),
            })
    }

    /// Attribute deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let raw = self.get(name)?;
        serde_json::from_value(raw.clone())
            .map_err(|_| self.conversion_error(name, raw, std::any::type_name::<T>()))
    }

    /// Attribute deserialized into `T`, or `default` when missing.
    pub fn get_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T> {
        if self.contains(name) {
            self.get_as(name)
        } else {
            Ok(default)
        }
    }

    /// Attribute converted by `convert`; `None` is reported as a failed
    /// conversion to `expected`.
    pub fn get_with<T>(
        &self,
        name: &str,
        expected: &str,
        convert: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<T> {
        let raw = self.get(name)?;
        convert(raw).ok_or_else(|| self.conversion_error(name, raw, expected))
    }

    fn conversion_error(&self, name: &str, raw: &Value, expected: &str) -> Error {
        Error::AttributeConversion {
            task: self.task.to_string(),
            procedure: self.procedure.to_string(),
            attribute: name.to_string(),
            value: raw.to_string(),
            expected: expected.to_string(),
        }
    }
}
