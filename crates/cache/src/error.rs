use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
