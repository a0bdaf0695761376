use flow_shared::error::IdentityError;
use thiserror::Error;

use crate::engine::EngineError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No file record under this id, or the stored value is undecodable.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// No client record under this id, or the stored value is undecodable.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("No client matches the recovery code")]
    RecoveryCodeNotFound,

    /// Neither a file id nor a download link matched.
    #[error("No file matches download reference: {0}")]
    DownloadNotFound(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    #[error("Blob too large: {size} bytes (max {max})")]
    BlobTooLarge { size: usize, max: usize },

    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failure reported by the key-value engine.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// A record could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the caller layer should treat this as an absent resource.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileNotFound(_)
            | Self::ClientNotFound(_)
            | Self::RecoveryCodeNotFound
            | Self::DownloadNotFound(_)
            | Self::BlobNotFound(_) => true,
            Self::Engine(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
