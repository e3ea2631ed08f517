//! External command execution and platform detection.

pub mod command;
pub mod mock;
pub mod platform;

pub use command::{
    absolutize, is_not_found, CommandResult, CommandRunner, CommandSpec, SystemRunner,
};
pub use mock::{MockResponse, MockRunner};
pub use platform::{default_python, is_ci, is_elevated};
