use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid payload: {0}")]
    Validation(String),

    #[error("unsupported event type: {0}")]
    UnsupportedEvent(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("missing webhook signature headers")]
    MissingSignature,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
