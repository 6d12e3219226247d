use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file type: .{extension} (allowed: {allowed})")]
    UnsupportedExtension { extension: String, allowed: String },

    #[error("no text content found in {0}")]
    EmptyContent(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Construction-time failures: a malformed built-in pattern or an HTTP
/// client that cannot be built. Neither occurs during normal operation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
