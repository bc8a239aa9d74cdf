use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidDimensions,
    OutOfBounds,
    RaggedRows,
    EmptyRegion,
    CountMismatch,
    InvalidCadence,
    Internal,
}

/// Wire form of a failed grid operation, pushed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct GridFault {
    pub code: ErrorCode,
    pub message: String,
}

impl GridFault {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
