//! Shared string constants
//!
//! Names that appear on disk, in the address grammar or in the environment.
//! Kept in one place so the grammar, the resolver and the CLI agree.

// ============================================================================
// Address Grammar
// ============================================================================

/// Host tag selecting a GitHub repository source
pub const HOST_GITHUB: &str = "github.com";
/// Host tag selecting a local directory source
pub const HOST_LOCAL: &str = "localhost";

// ============================================================================
// Store Layout
// ============================================================================

/// Fixed manifest filename inside every skill directory
pub const MANIFEST_FILE: &str = "SKILL.md";
/// Default store directory under the home directory
pub const STORE_DIR_NAME: &str = ".skillbox";
/// Subdirectory holding cached remote sources (`<host>/<owner>/<repo>`)
pub const REPOS_DIR: &str = "repos";
/// Subdirectory holding local skills; this is the git working tree
pub const SKILLS_DIR: &str = "skills";
/// Optional settings file at the store root
pub const SETTINGS_FILE: &str = "settings.json";

// ============================================================================
// Environment
// ============================================================================

/// Overrides the store root when set and non-empty
pub const ENV_STORE_HOME: &str = "SKILLBOX_HOME";
