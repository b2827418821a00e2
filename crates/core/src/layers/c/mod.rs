//! C binding layer

pub mod hooks;
pub mod render;
pub mod tasks;
mod wrapper;

pub use hooks::CHook;
pub use wrapper::CWrapper;
