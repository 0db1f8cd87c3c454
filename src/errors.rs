use thiserror::Error;

use crate::stage::StageError;

#[derive(Debug, Error)]
pub enum WellPathError {
    #[error("Validation error in `{field}`: {message}")]
    Validation { field: String, message: String },
    #[error("Data integrity error in `{field}`: {message}")]
    DataIntegrity { field: String, message: String },
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),
}

impl WellPathError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn data_integrity(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataIntegrity {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } | Self::DataIntegrity { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WellPathError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<csv::Error> for WellPathError {
    fn from(err: csv::Error) -> Self {
        Self::Io(format!("CSV write failed: {}", err))
    }
}
