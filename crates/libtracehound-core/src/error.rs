use thiserror::Error;

/// Main error type for tracehound operations
#[derive(Debug, Error)]
pub enum TracehoundError {
    #[error("unsupported bug db type: {0}")]
    UnsupportedSource(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("cache schema version {found} does not match expected version {expected}")]
    CacheVersion { found: u32, expected: u32 },

    #[error("remote fetch failed: {0}")]
    RemoteFetch(String),

    #[error("could not extract a traceback from the input")]
    NoTraces,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TracehoundError {
    /// Stable error code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            TracehoundError::UnsupportedSource(_) => "unsupported_source",
            TracehoundError::InvalidConfig(_) => "invalid_config",
            TracehoundError::CacheVersion { .. } => "cache_version",
            TracehoundError::RemoteFetch(_) => "remote_fetch",
            TracehoundError::NoTraces => "no_traces",
            TracehoundError::Io(_) => "io_error",
            TracehoundError::Sled(_) => "db_error",
            TracehoundError::Json(_) => "internal_error",
            TracehoundError::Internal(_) => "internal_error",
        }
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            TracehoundError::UnsupportedSource(_) => 2,
            TracehoundError::InvalidConfig(_) => 2,
            TracehoundError::NoTraces => 3,
            TracehoundError::CacheVersion { .. } => 4,
            TracehoundError::RemoteFetch(_) => 5,
            TracehoundError::Io(_) => 5,
            TracehoundError::Sled(_) => 5,
            _ => 1,
        }
    }
}
