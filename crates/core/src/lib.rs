//! Core domain types and shared logic for the scout content server.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content classes, OS namespaces and validated content paths
//! - SHA-256 content hashes
//! - Server, content and signing configuration

pub mod config;
pub mod error;
pub mod hash;
pub mod path;


pub use error::PathError;
pub use hash::ContentHash;
pub use path::{ContentClass, ContentPath, Namespace};

/// Namespaces a script path may carry, one per operating-system family.
pub const ALLOWED_NAMESPACES: [&str; Namespace::ALL.len()] = {
    let mut names = [""; Namespace::ALL.len()];
    let mut i = 0;
    while i < names.len() {
        names[i] = Namespace::ALL[i].as_str();
        i += 1;
    }
    names
};

/// Default time-to-live for cached remote lookups, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
