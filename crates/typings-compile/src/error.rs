//! Error types for typings-compile.

/// Errors produced by entry resolution and the namespacing rewriter.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A node's `main` pointed at an implementation file with no sibling
    /// `.d.ts` (§4.F rule 4).
    #[error("no declaration file found for `{name}`")]
    EntryNotFound { name: String },

    /// A node had none of `typings`/`browserTypings`/a usable `main` (§4.F
    /// rule 5).
    #[error("unable to resolve entry `.d.ts` file for `{name}`")]
    EntryResolution { name: String },

    /// The chosen entry file could not be read.
    #[error("failed to read declaration file for `{namespace}`")]
    TypingsReadFailure { namespace: String },

    /// A module specifier was neither a dependency of its node nor
    /// resolvable relative to the current file, in a non-ambient context
    /// (§4.H).
    #[error("unresolved specifier `{specifier}` in `{namespace}`")]
    UnresolvedSpecifier { namespace: String, specifier: String },

    /// A dependency the compiler needed was resolved as `missing:true`.
    #[error("missing dependency `{key}` required by `{namespace}`")]
    MissingDependency { namespace: String, key: String },

    /// The root of the tree itself resolved as `missing:true` (every
    /// ecosystem came up empty).
    #[error("Missing dependency \"{name}\", unable to compile dependency tree")]
    MissingRoot { name: String },

    /// A manifest or fetch operation failed while reading an entry file.
    #[error("{0}")]
    Fetch(#[from] typings_util::error::FetchError),
}
