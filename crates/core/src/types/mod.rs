pub mod binding;
pub mod names;
pub mod procedure;
pub mod scope;
pub mod version;

use crate::impl_case_insensitive_deserialize;
use serde::Serialize;
use std::fmt;

/// Target binding layer of a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    C,
    F08,
}

impl_case_insensitive_deserialize!(
    Layer,
    C => "c",
    F08 => "f08"
);

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::C, Layer::F08];

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::C => "c",
            Layer::F08 => "f08",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Re-export commonly used types
pub use binding::{Binding, Variable};
pub use procedure::{Direction, IgnoreHandling, Parameter, ProcedureDescriptor};
pub use scope::{Named, Scope};
pub use version::Version;
