//! wrapgen - measurement wrapper generator
//!
//! Umbrella crate over [`wrapgen_core`]; the `wrapgen` binary lives in the
//! `wrapgen-cli` crate.
pub use wrapgen_core::*;
