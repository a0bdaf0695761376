use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid namespace UUID: {0}")]
    InvalidNamespace(#[from] uuid::Error),

    #[error("Recovery code must not be empty")]
    EmptyRecoveryCode,
}
