#![forbid(unsafe_code)]
//! The multi-ecosystem dependency tree resolver: manifest discovery, the
//! short-form dependency grammar, concurrent fan-out, and cycle detection.

pub mod error;
pub mod resolve;
pub mod tree;

pub use error::ResolveError;
pub use resolve::{resolve_dependencies, ResolveOptions, ResolvedTree};
pub use tree::{graft, Arena, EcosystemKind, NodeId, SubTree, TreeNodeData};
