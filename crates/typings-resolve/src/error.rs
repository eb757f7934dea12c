//! Error types for typings-resolve.

/// Errors produced by the tree resolver.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A dependency cycle was detected while walking `parent` links (I1).
    #[error("dependency cycle detected: {chain}")]
    CircularDependency { chain: String },

    /// A manifest operation failed.
    #[error("{0}")]
    Manifest(#[from] typings_config::error::ManifestError),

    /// A dependency string could not be parsed.
    #[error("{0}")]
    DependencyParse(#[from] typings_config::error::DependencyParseError),

    /// A utility operation failed.
    #[error("{0}")]
    Util(#[from] typings_util::error::UtilError),

    /// Fetching a remote manifest failed.
    #[error("{0}")]
    Fetch(#[from] typings_util::error::FetchError),
}
