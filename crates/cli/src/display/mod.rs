pub mod formatter;

pub use formatter::{format_task, print_tasks};
