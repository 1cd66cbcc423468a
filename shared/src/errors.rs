//! Shared error types for the quoting system

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SharedError {
    #[error("Invalid ZIP code: {input:?}")]
    InvalidZipCode { input: String },

    #[error("Invalid date: {input:?}")]
    InvalidDate { input: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Serialization failed: {message}")]
    SerializationError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
