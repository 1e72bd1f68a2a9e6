use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid repository reference: {0}")]
    InvalidReference(String),

    #[error("keychain resolution failed: {0}")]
    Keychain(String),

    #[error("credential storage error: {0}")]
    CredentialStorage(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}
