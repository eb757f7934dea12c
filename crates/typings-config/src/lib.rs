//! Manifest shapes for the three typings ecosystems, the dependency-string
//! grammar, and upward manifest discovery.

pub mod dependency;
pub mod discovery;
pub mod error;
pub mod manifest;

pub use dependency::{DependencyDescriptor, DependencyValue};
pub use discovery::find_upward;
pub use manifest::{BowerManifest, BowerRc, BrowserField, NativeManifest, NpmManifest};
