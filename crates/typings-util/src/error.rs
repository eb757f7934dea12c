//! Error types for typings-util.

/// Errors produced by the path/URL classifier, hashing, and filesystem helpers.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// An I/O operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Cannot determine the user's home directory.
    #[error("cannot determine home directory — set the HOME environment variable")]
    NoHomeDir,
}

/// Errors produced by the unified fetcher and its content-addressed cache.
///
/// Maps directly onto the "transport errors" class (§7 class 4): every
/// variant carries the offending URL or path for diagnosability.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The local file did not exist.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// A filesystem operation other than "not found" failed.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// An HTTP request to `url` returned a non-200 status.
    #[error("request to {url} failed with status {code}")]
    HttpStatus { url: String, code: u16 },

    /// The HTTP request could not be completed (DNS, connect, TLS, timeout, ...).
    #[error("network error fetching {url}: {message}")]
    NetworkError { url: String, message: String },

    /// The fetched text was not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    JsonParse {
        path: String,
        source: serde_json::Error,
    },

    /// The cache directory could not be initialized or written to.
    #[error("cache I/O error at {path}: {source}")]
    CacheIo {
        path: String,
        source: std::io::Error,
    },

    /// Could not acquire the per-entry cache lockfile within the retry budget.
    #[error("timed out waiting for cache lock {path} ({retries} retries)")]
    LockTimeout { path: String, retries: u32 },
}
