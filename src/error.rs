//! Error types
//!
//! Failures surfaced by [`InterpreterHandle`](crate::InterpreterHandle).
//! Leaked handles are reported through `tracing` rather than as an error
//! value, since nobody is left to receive it.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error from creating or using an interpreter handle
#[derive(Debug, Error)]
pub enum Error {
    /// The engine could not allocate a context
    #[error("cannot create interpreter instance: engine is out of resources")]
    OutOfResources,

    /// The engine configuration was rejected before any context existed
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The script threw, failed to parse, or otherwise errored in the engine
    #[error(transparent)]
    ScriptEvaluation(#[from] ScriptError),

    /// The handle was used after `release()`
    #[error("interpreter handle used after release")]
    UseAfterRelease,
}

impl Error {
    /// The script failure, if this is one
    pub fn as_script_error(&self) -> Option<&ScriptError> {
        match self {
            Error::ScriptEvaluation(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure payload reported by the engine for a single evaluation
///
/// `message` and `stack` are the engine's own text, unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file_name}: {message}")]
pub struct ScriptError {
    /// Advisory name the script was submitted under
    pub file_name: String,
    /// Engine diagnostic: the thrown value as a string, e.g. `Error: boom`
    pub message: String,
    /// Script-level stack trace, when the engine supplies one
    pub stack: Option<String>,
}

impl ScriptError {
    pub fn new(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        ScriptError {
            file_name: file_name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack.filter(|s| !s.is_empty());
        self
    }
}
