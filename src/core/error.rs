use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tuning runs
#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("No executable configured (expected one of 'executable', 'exe', 'program')")]
    MissingExecutable,

    #[error("Failed to launch '{}': {source}", executable.display())]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Candidate has {actual} components but the parameter space has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for tuning operations
pub type TuneResult<T> = Result<T, TuneError>;

impl TuneError {
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// True for errors that must abort the run before any search starts.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::InvalidParameter { .. }
                | Self::MissingExecutable
                | Self::Launch { .. }
                | Self::Serialization(_)
        )
    }
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::core::TuneError::Config(format!($($arg)*))
    };
}
