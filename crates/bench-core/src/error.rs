use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// A subprocess wrote to stderr and errors were not ignored.
    #[error("command `{command}` reported errors: {stderr}")]
    Execution { command: String, stderr: String },

    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A recognized metadata key carried a value of the wrong shape.
    #[error("invalid metadata value for `{key}`: {value:?} ({reason})")]
    MetadataParse {
        key: String,
        value: String,
        reason: String,
    },

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl HarnessError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}
