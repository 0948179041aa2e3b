pub mod command;
pub mod error;
pub mod fsops;
pub mod paths;

pub use command::Command;
pub use error::{HarnessError, Result};
