//! Path Resolver
//!
//! Maps validated references to jailed absolute paths under the store root.
//!
//! - `security.rs` - segment sanitizing, traversal checks, local source checks
//! - `resolver.rs` - `StorePaths` (cache and skill locations)

mod resolver;
mod security;

pub use resolver::StorePaths;
pub use security::{
    normalize_path, sanitize_path_segment, validate_local_path, validate_path_within_base,
};
