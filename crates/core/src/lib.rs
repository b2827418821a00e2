//! wrapgen-core - Task/hook composition engine for measurement wrappers
//!
//! This crate provides functionality to:
//! - Describe procedures of a library in several binding layers
//! - Attach composable tasks to a wrapper and check their dependencies
//! - Compose the text of every hook from the wrapper and its tasks
//! - Drive the generation of whole layers from a JSON catalog
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod hooks;
pub mod introspect;
pub mod layers;
pub mod registry;
pub mod task;
pub mod types;
pub mod utils;
pub mod wrapper;

#[cfg(test)]
mod testing;

// Re-export commonly used types and traits
pub use error::{DependencyErrorKind, Error, Result};
pub use types::*;

// Re-export main API components
pub use catalog::{Catalog, ProcedureRecord};
pub use config::WrapgenConfig;
pub use generator::{GenerationReport, Generator, GeneratorOptions, LayerOutput, WrapperStatus};
pub use hooks::{Fragments, Hook, HookComposer};
pub use introspect::{TaskDescription, describe_layer, describe_task};
pub use layers::{BindingLayer, CWrapper, F08Wrapper, Template, WrapperOptions};
pub use registry::TaskRegistry;
pub use task::{Attributes, TaskRef, TaskType};
pub use wrapper::Wrapper;
