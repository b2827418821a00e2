//! Binding layers
//!
//! Each layer defines its hook catalog, a wrapper that fixes the generation
//! sequence around those hooks, and a static registry of task types. The
//! generation driver only talks to layers through [`BindingLayer`].

pub mod c;
pub mod collectives;
pub mod f08;

use serde::Serialize;

use crate::error::Result;
use crate::hooks::{Fragments, Hook};
use crate::impl_case_insensitive_deserialize;
use crate::registry::TaskRegistry;
use crate::task::{Attributes, TaskRef};
use crate::types::{Layer, ProcedureDescriptor};
use crate::wrapper::Wrapper;

pub use c::{CHook, CWrapper};
pub use f08::{F08Hook, F08Wrapper};

/// Wrapper skeleton variant selected per procedure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Template {
    #[default]
    DefaultWrapper,
    /// Replaces the real finalize call by a barrier.
    FakeFinalizationWrapper,
    /// Additionally guarded by a configure-time compliance check.
    GuardComplianceWrapper,
    /// Signature taken from a configure-time prototype macro.
    ProtoArgsWrapper,
}

impl_case_insensitive_deserialize!(
    Template,
    DefaultWrapper => "defaultwrapper",
    FakeFinalizationWrapper => "fakefinalizationwrapper",
    GuardComplianceWrapper => "guardcompliancewrapper",
    ProtoArgsWrapper => "protoargswrapper"
);

/// Per-procedure settings that shape a wrapper but are not part of the
/// procedure signature.
#[derive(Debug, Clone, Default)]
pub struct WrapperOptions {
    pub template: Template,
    /// Names `X` of `SCOREP_MPI_NO_X` macros that disable the wrapper.
    pub guards: Vec<String>,
    /// Measurement group, e.g. `p2p`.
    pub group: String,
    /// Alternative prototypes, required by [`Template::ProtoArgsWrapper`].
    pub c_variants: Vec<String>,
    /// Interleave hook trace comments with the output.
    pub debug: bool,
    /// Reject inconsistent options instead of warning about them.
    pub strict: bool,
}

/// A target binding layer.
pub trait BindingLayer: Sized {
    type Hook: Hook;

    const LAYER: Layer;

    /// Static registry of the layer's task types.
    fn registry() -> &'static TaskRegistry<Self::Hook>;

    /// Task type marking a wrapper as not fully implemented.
    fn todo_task() -> TaskRef<Self::Hook>;

    fn new_wrapper(procedure: ProcedureDescriptor, options: &WrapperOptions) -> Result<Self>;

    fn wrapper(&self) -> &Wrapper<Self::Hook>;

    fn wrapper_mut(&mut self) -> &mut Wrapper<Self::Hook>;

    /// Run the layer's fixed generation sequence once.
    fn generate(&self) -> Result<Fragments>;

    /// Comment standing in for a wrapper that could not be generated.
    fn placeholder(name: &str, reason: &str) -> String;

    fn attach(&mut self, task: TaskRef<Self::Hook>, attributes: Attributes) -> Result<()> {
        self.wrapper_mut().attach(task, attributes)
    }
}
