#![forbid(unsafe_code)]
//! Path/URL classification, hashing, filesystem helpers, and the unified
//! fetcher shared by the resolver and compiler crates.

pub mod error;
pub mod fetch;
pub mod fs;
pub mod hash;
pub mod locator;
