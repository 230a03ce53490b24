use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to parse ledger: {0}")]
    Parse(String),

    #[error("Ledger document is not a JSON object keyed by NPC id")]
    InvalidDocument,

    #[error("Ledger writer is not running")]
    WriterUnavailable,

    #[error("Ledger writer requires a Tokio runtime")]
    NoRuntime,
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Parse(error.to_string())
    }
}
