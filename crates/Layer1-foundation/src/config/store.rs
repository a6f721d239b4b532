//! Store Config - where the skill store lives and how it talks to git
//!
//! The root is resolved once at startup and passed around explicitly, so
//! tests can point independent stores at their own temp directories.

use crate::strings::{ENV_STORE_HOME, REPOS_DIR, SETTINGS_FILE, SKILLS_DIR, STORE_DIR_NAME};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// StoreSettings - optional settings.json
// ============================================================================

/// Tunables read from `<root>/settings.json`; every field is optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Timeout for git operations that never leave the machine
    pub local_timeout_secs: u64,

    /// Timeout for clone/fetch against a remote
    pub network_timeout_secs: u64,

    /// Commit author used when git has no identity configured
    pub author_name: String,

    /// Commit email used when git has no identity configured
    pub author_email: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            local_timeout_secs: 10,
            network_timeout_secs: 60,
            author_name: "skillbox".to_string(),
            author_email: "skillbox@localhost".to_string(),
        }
    }
}

// ============================================================================
// StoreConfig
// ============================================================================

/// Resolved store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    root: PathBuf,
    settings: StoreSettings,
}

impl StoreConfig {
    /// Config rooted at an explicit directory with default settings
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            settings: StoreSettings::default(),
        }
    }

    /// Resolve the root from `SKILLBOX_HOME` or `~/.skillbox`, then overlay
    /// `settings.json` when present.
    pub fn from_env() -> Result<Self> {
        let override_value = std::env::var(ENV_STORE_HOME).ok();
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        let home = dirs::home_dir();

        let root = Self::resolve_root(override_value.as_deref(), &cwd, home.as_deref())?;
        debug!("Store root: {}", root.display());

        Self::at(root).with_settings_file()
    }

    /// Pure root resolution: non-empty override (made absolute against
    /// `cwd`) wins, otherwise the dot-directory under `home`.
    pub fn resolve_root(
        override_value: Option<&str>,
        cwd: &Path,
        home: Option<&Path>,
    ) -> Result<PathBuf> {
        if let Some(value) = override_value.map(str::trim).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(value);
            return Ok(if path.is_absolute() {
                path
            } else {
                cwd.join(path)
            });
        }

        home.map(|h| h.join(STORE_DIR_NAME))
            .ok_or_else(|| Error::Config("Cannot find home directory".to_string()))
    }

    /// Overlay `<root>/settings.json` if it exists
    pub fn with_settings_file(mut self) -> Result<Self> {
        let path = self.root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(self);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        self.settings = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        debug!("Loaded settings from {}", path.display());
        Ok(self)
    }

    /// Replace settings wholesale
    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/repos`
    pub fn repos_dir(&self) -> PathBuf {
        self.root.join(REPOS_DIR)
    }

    /// `<root>/skills`
    pub fn skills_dir(&self) -> PathBuf {
        self.root.join(SKILLS_DIR)
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn local_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.local_timeout_secs)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.network_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_root_override_absolute() {
        let root = StoreConfig::resolve_root(
            Some("/srv/skills"),
            Path::new("/work"),
            Some(Path::new("/home/u")),
        )
        .unwrap();
        assert_eq!(root, PathBuf::from("/srv/skills"));
    }

    #[test]
    fn test_resolve_root_override_relative() {
        let root =
            StoreConfig::resolve_root(Some("store"), Path::new("/work"), Some(Path::new("/home/u")))
                .unwrap();
        assert_eq!(root, PathBuf::from("/work/store"));
    }

    #[test]
    fn test_resolve_root_empty_override_falls_back() {
        let root =
            StoreConfig::resolve_root(Some("  "), Path::new("/work"), Some(Path::new("/home/u")))
                .unwrap();
        assert_eq!(root, PathBuf::from("/home/u/.skillbox"));
    }

    #[test]
    fn test_resolve_root_without_home() {
        assert!(StoreConfig::resolve_root(None, Path::new("/work"), None).is_err());
    }

    #[test]
    fn test_layout() {
        let config = StoreConfig::at("/data");
        assert_eq!(config.repos_dir(), PathBuf::from("/data/repos"));
        assert_eq!(config.skills_dir(), PathBuf::from("/data/skills"));
        assert_eq!(config.local_timeout(), Duration::from_secs(10));
        assert_eq!(config.network_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_settings_file_overlay() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(SETTINGS_FILE),
            r#"{ "networkTimeoutSecs": 5, "authorName": "me" }"#,
        )
        .unwrap();

        let config = StoreConfig::at(temp.path()).with_settings_file().unwrap();
        assert_eq!(config.network_timeout(), Duration::from_secs(5));
        assert_eq!(config.local_timeout(), Duration::from_secs(10));
        assert_eq!(config.settings().author_name, "me");
        assert_eq!(config.settings().author_email, "skillbox@localhost");
    }

    #[test]
    fn test_settings_file_invalid() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(SETTINGS_FILE), "{ not json").unwrap();

        let err = StoreConfig::at(temp.path()).with_settings_file().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
