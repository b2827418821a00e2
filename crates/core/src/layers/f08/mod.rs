//! Fortran 2008 binding layer

pub mod hooks;
pub mod render;
pub mod tasks;
mod wrapper;

pub use hooks::F08Hook;
pub use wrapper::F08Wrapper;
