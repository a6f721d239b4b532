//! # skillbox-foundation
//!
//! Foundation layer for skillbox:
//! - Error: the single error taxonomy every layer reports through
//! - Config: store root resolution and `settings.json`
//! - Strings: on-disk names, grammar host tags, environment variables
//!
//! ## Store layout
//!
//! ```text
//! <root>/                      SKILLBOX_HOME or ~/.skillbox
//! ├── settings.json            optional
//! ├── repos/<host>/<owner>/<repo>
//! └── skills/                  git working tree
//!     └── <name>/SKILL.md
//! ```

pub mod config;
pub mod error;
pub mod strings;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, NetworkFailure, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{StoreConfig, StoreSettings};

// ============================================================================
// Strings
// ============================================================================
pub use strings::{
    ENV_STORE_HOME, HOST_GITHUB, HOST_LOCAL, MANIFEST_FILE, REPOS_DIR, SETTINGS_FILE, SKILLS_DIR,
    STORE_DIR_NAME,
};
