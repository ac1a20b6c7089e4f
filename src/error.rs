use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event store error: {0}")]
    Store(String),
    #[error("state lock poisoned")]
    StateLock,
}
