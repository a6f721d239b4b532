//! SKILL.md manifests
//!
//! - `frontmatter`: tolerant header parsing and `name` rewriting
//! - `template`: the manifest written by `init`

mod frontmatter;
mod template;

pub use frontmatter::{LineEnding, Manifest};
pub use template::generate_manifest;

use skillbox_foundation::{Error, Result};
use std::path::Path;

/// Shown when neither the header nor the body yields a description
pub const DESCRIPTION_PLACEHOLDER: &str = "No description";

/// Body-derived descriptions are cut to this many characters
pub const DESCRIPTION_MAX_CHARS: usize = 100;

impl Manifest {
    /// Read and parse a manifest file; invalid UTF-8 is replaced, not rejected
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::at_path(path, e))?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Header `name`, else `fallback` (the skill's folder name)
    pub fn resolved_name(&self, fallback: &str) -> String {
        self.name().unwrap_or_else(|| fallback.to_string())
    }

    /// Header `description`, else the first body paragraph line, else the
    /// placeholder
    pub fn resolved_description(&self) -> String {
        self.description()
            .or_else(|| self.first_paragraph_line(DESCRIPTION_MAX_CHARS))
            .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string())
    }
}
