use thiserror::Error;

/// Failure of a single source call. Every variant is recoverable at the
/// entity level; none of them aborts a monitoring cycle.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value: {0}")]
    Invalid(String),
}
