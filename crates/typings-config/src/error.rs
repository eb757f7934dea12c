//! Error types for typings-config.

/// Errors produced by the manifest readers.
///
/// A missing manifest file is never an error (§4.C) — only malformed content
/// reaching this point is, mirroring the teacher's `ManifestError::Parse`.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The file exists but could not be read (permissions, I/O failure).
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The file's content is not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Errors produced by the dependency-string parser (§4.D).
#[derive(Debug, thiserror::Error)]
pub enum DependencyParseError {
    /// A `github:` form was missing the `owner/repo` portion.
    #[error("invalid github dependency `{raw}`: expected `github:owner/repo[#ref]`")]
    InvalidGithubForm { raw: String },
}
