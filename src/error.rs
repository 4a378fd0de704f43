//! Errors of the load path. The builder and the engine never fail; misuse of either is a
//! panic.

use crate::record::SwVersion;
use thiserror::Error;

/// A saved component record that cannot be turned back into geometry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("component type {0} not recognized")]
    NotRecognized(u32),

    #[error("component type {type_id} is missing field `{field}`")]
    MissingField { type_id: u32, field: &'static str },

    #[error("component type {type_id} has invalid `{field}`: {reason}")]
    InvalidValue {
        type_id: u32,
        field: &'static str,
        reason: String,
    },
}

impl RecordError {
    pub fn missing(type_id: u32, field: &'static str) -> Self {
        Self::MissingField { type_id, field }
    }

    pub fn invalid(type_id: u32, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            type_id,
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed circuit document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document needs a newer version of the simulator.
    #[error("circuit requires version {0} or newer")]
    NewerIncompatible(SwVersion),
}
