//! Error types for scene interpretation, compilation and buffer sizing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed command or wrong number of fields
    #[error("line {line}: {message}")]
    Format { line: usize, message: String },

    /// A required scalar was never assigned
    #[error("required variable `{0}` was never assigned")]
    MissingVariable(String),

    /// Transform attached to an object which cannot be transformed,
    /// or material assigned to a boolean combination
    #[error("invalid scene structure: {0}")]
    Structural(String),

    #[error("line {line}: `{name}` was never declared")]
    UndeclaredName { line: usize, name: String },

    #[error("no object was submitted as the scene root")]
    MissingRoot,

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("render needs an estimated {required} bytes, limit is {limit} bytes")]
    MemoryBudget { required: u64, limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
