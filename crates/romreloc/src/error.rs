use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load ROM image {path}: {reason}")]
    LoadFailure { path: String, reason: String },

    #[error("ROM image is empty: {0}")]
    EmptyImage(String),

    #[error("Unknown structure: {0}")]
    UnknownStructure(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid structure catalog: {0}")]
    InvalidCatalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether a report, table or catalogue file was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Whether the error aborts a comparison run before any result exists
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Error::LoadFailure { .. } | Error::EmptyImage(_))
    }
}
