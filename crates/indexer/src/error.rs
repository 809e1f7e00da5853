use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    CacheError(#[from] content_scan_cache::CacheError),

    #[error("Invalid library path: {0}")]
    InvalidPath(String),

    #[error("{0}")]
    Other(String),
}
