use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("admission request not found: {0}")]
    RequestNotFound(String),
    #[error("admission request {id} is already {status}")]
    RequestNotPending { id: String, status: String },
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to read directory file: {0}")]
    DirectoryRead(std::io::Error),
    #[error("directory schema mismatch at {path}: {message}")]
    DirectorySchema { path: String, message: String },
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl From<resq_types::TextError> for CoreError {
    fn from(err: resq_types::TextError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}
