use std::path::PathBuf;

/// Storage-layer failures. Unreadable or missing data is never an error (the
/// store bootstraps an empty profile instead); these variants cover the cases
/// where the storage medium itself rejects a write or delete.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to list stored users: {0}")]
    List(std::io::Error),

    #[error("failed to serialize profile data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Engine-level errors surfaced to callers. Data-shape problems on restaurant
/// payloads never land here; only boundary-validation rejections and storage
/// failures do, so callers can retry or degrade to unscored candidates.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
