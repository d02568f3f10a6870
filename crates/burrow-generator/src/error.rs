use thiserror::Error;

/// Errors returned when configuring a generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid code length {length}; expected {min}..={max}")]
    InvalidLength {
        length: usize,
        min: usize,
        max: usize,
    },
    #[error("invalid fixed code: {0}")]
    InvalidCode(String),
    #[error("invalid sequence prefix: {0:?}")]
    InvalidPrefix(String),
}
