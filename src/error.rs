//! Domain errors for the sizing calculator

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SizingError {
    /// Total daily energy is zero, so there is nothing to size for.
    #[error("No load defined: add equipment before running the sizing")]
    NoLoadDefined,

    #[error("Invalid equipment: {0}")]
    InvalidEquipment(String),

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Load sheet line {line}: {message}")]
    LoadSheet { line: usize, message: String },
}

impl SizingError {
    pub(crate) fn parameter(name: &'static str, message: impl Into<String>) -> Self {
        SizingError::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}
