//! Error types for skillbox
//!
//! Every failure a command can surface is a variant here, grouped by the
//! category that decides how the CLI reports it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Why a network operation against a remote source failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    /// The repository does not exist or is not accessible
    NotFound,
    /// The operation exceeded its timeout
    TimedOut,
    /// DNS lookup for the host failed
    ResolveHost,
    /// Anything else reported by the transport
    Other,
}

impl std::fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            NetworkFailure::NotFound => "repository not found",
            NetworkFailure::TimedOut => "timed out",
            NetworkFailure::ResolveHost => "could not resolve host",
            NetworkFailure::Other => "transport error",
        };
        f.write_str(text)
    }
}

/// skillbox error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Grammar
    // ========================================================================
    #[error("Invalid reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    #[error("Invalid skill name '{name}': {reason}")]
    InvalidSkillName { name: String, reason: String },

    #[error("Unsupported host '{host}': expected 'github.com' or 'localhost'")]
    UnsupportedHost { host: String },

    #[error("Path traversal detected")]
    PathTraversal,

    // ========================================================================
    // Existence
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{what} already exists{}", .hint.as_ref().map(|h| format!(" ({h})")).unwrap_or_default())]
    AlreadyExists { what: String, hint: Option<String> },

    // ========================================================================
    // Filesystem
    // ========================================================================
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ========================================================================
    // Version control
    // ========================================================================
    #[error("Version control error: {0}")]
    Vcs(String),

    #[error("Skill store is not under version control yet")]
    NotVersioned,

    #[error("No commits to undo")]
    NoCommits,

    #[error("Already at initial commit, nothing to undo")]
    AtInitialCommit,

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // Network
    // ========================================================================
    #[error("Failed to fetch {reference}: {kind}")]
    Network {
        reference: String,
        kind: NetworkFailure,
    },

    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Grammar error helper
    pub fn invalid_reference(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidReference {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Skill-name error helper
    pub fn invalid_skill_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidSkillName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Collision helper
    pub fn already_exists(what: impl Into<String>, hint: Option<&str>) -> Self {
        Error::AlreadyExists {
            what: what.into(),
            hint: hint.map(str::to_string),
        }
    }

    /// Wrap an IO error with the path it happened on.
    ///
    /// `NotFound` and `PermissionDenied` get their dedicated variants so the
    /// message stays readable.
    pub fn at_path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(path),
            _ => Error::FileSystem { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_with_hint() {
        let err = Error::already_exists("Skill 'xlsx'", Some("use --rename to pick another name"));
        assert_eq!(
            err.to_string(),
            "Skill 'xlsx' already exists (use --rename to pick another name)"
        );
    }

    #[test]
    fn test_already_exists_without_hint() {
        let err = Error::already_exists("Skill 'xlsx'", None);
        assert_eq!(err.to_string(), "Skill 'xlsx' already exists");
    }

    #[test]
    fn test_at_path_maps_kinds() {
        let err = Error::at_path(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, Error::NotFound(_)));

        let err = Error::at_path(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, Error::PermissionDenied(_)));

        let err = Error::at_path("/tmp/x", std::io::Error::other("boom"));
        assert!(err.to_string().starts_with("/tmp/x"));
    }

    #[test]
    fn test_network_message() {
        let err = Error::Network {
            reference: "github.com@a/b".into(),
            kind: NetworkFailure::ResolveHost,
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch github.com@a/b: could not resolve host"
        );
    }
}
