//! Error types for wingbeat-lib.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The data handed to an operation cannot be analysed (e.g. an empty series).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A parameter is outside its valid range (sample rate, window length, band, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
