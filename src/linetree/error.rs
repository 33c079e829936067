use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Position out of range: {0}")]
    OutOfRange(String),

    #[error("Identifier already in use: {0}")]
    DuplicateIdentifier(String),

    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Operation not allowed on the root element: {0}")]
    IllegalRootOperation(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Malformed XML: {0}")]
    MalformedContent(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditError {
    /// Validation failures leave the document untouched and can be retried
    /// with different arguments; I/O and serialization failures cannot.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            EditError::Io(_) | EditError::Serialization(_) | EditError::UnsupportedFileType(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EditError>;
