pub mod generate;
pub mod init;
pub mod tasks;

pub use generate::{GenerateArgs, generate_command};
pub use init::init_command;
pub use tasks::tasks_command;
