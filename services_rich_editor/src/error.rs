//! Editor error taxonomy

use document_model::{ModelError, ObjectId, ValueError};
use services_storage::{PersistenceError, StorageError};
use thiserror::Error;

/// Editor error
///
/// Every variant is recoverable: the failing operation leaves the document
/// as it was.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("No text selection")]
    NoSelection,

    #[error("Selection is empty")]
    EmptySelection,

    #[error("Invalid table dimensions: {rows}x{cols}")]
    InvalidDimension { rows: i64, cols: i64 },

    #[error("Stored document is corrupt: {0}")]
    Corrupt(String),

    #[error("Image could not be decoded: {0}")]
    DecodeFailure(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Editor result
pub type EditorResult<T> = Result<T, EditorError>;

impl EditorError {
    /// Text for the acknowledgment prompt shown to the user
    pub fn user_message(&self) -> String {
        match self {
            EditorError::NoSelection => "Select text first.".to_string(),
            EditorError::EmptySelection => "Select the text to link first.".to_string(),
            EditorError::InvalidDimension { .. } => {
                "Rows and columns must be positive numbers.".to_string()
            }
            EditorError::Corrupt(_) => {
                "The saved document could not be read. Starting with a blank document."
                    .to_string()
            }
            EditorError::DecodeFailure(_) => "That file is not a supported image.".to_string(),
            EditorError::InvalidValue(reason) => format!("Invalid value: {}.", reason),
            EditorError::InvalidPosition(_) => "That position is no longer valid.".to_string(),
            EditorError::ObjectNotFound(_) => "That object no longer exists.".to_string(),
            EditorError::Storage(_) => "Changes could not be saved.".to_string(),
        }
    }
}

impl From<ModelError> for EditorError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ObjectNotFound(id) => EditorError::ObjectNotFound(id),
            other => EditorError::InvalidPosition(other.to_string()),
        }
    }
}

impl From<ValueError> for EditorError {
    fn from(err: ValueError) -> Self {
        EditorError::Corrupt(err.to_string())
    }
}

impl From<PersistenceError> for EditorError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Storage(storage) => EditorError::Storage(storage),
            PersistenceError::Corrupt(reason) | PersistenceError::SerializationFailed(reason) => {
                EditorError::Corrupt(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_conversion() {
        let id = ObjectId::new();
        assert!(matches!(
            EditorError::from(ModelError::ObjectNotFound(id)),
            EditorError::ObjectNotFound(found) if found == id
        ));
        assert!(matches!(
            EditorError::from(ModelError::NotTextBlock(2)),
            EditorError::InvalidPosition(_)
        ));
    }

    #[test]
    fn test_persistence_error_conversion() {
        assert!(matches!(
            EditorError::from(PersistenceError::Corrupt("bad".into())),
            EditorError::Corrupt(reason) if reason == "bad"
        ));
        assert!(matches!(
            EditorError::from(PersistenceError::Storage(StorageError::Full)),
            EditorError::Storage(StorageError::Full)
        ));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(EditorError::NoSelection.user_message(), "Select text first.");
        let dims = EditorError::InvalidDimension { rows: 0, cols: 3 };
        assert_eq!(dims.to_string(), "Invalid table dimensions: 0x3");
        assert!(EditorError::InvalidValue("color".into())
            .user_message()
            .contains("color"));
    }
}
