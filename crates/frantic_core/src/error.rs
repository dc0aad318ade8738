use std::path::PathBuf;

/// Errors raised while loading the columnar payloads.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("payload declares schema version {found}, this build expects {expected}")]
    Stale { found: u32, expected: u32 },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoadError {
    /// Short cause tag carried on `status=error` wire messages.
    pub fn cause(&self) -> &'static str {
        match self {
            LoadError::Network(_) => "network",
            LoadError::Stale { .. } => "stale",
            LoadError::Io { .. } | LoadError::Malformed(_) | LoadError::Json(_) => "unknown",
        }
    }
}
