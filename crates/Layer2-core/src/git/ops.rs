//! Git Operations
//!
//! The [`Vcs`] capability and its production implementation, [`GitCli`],
//! which shells out to the `git` executable. Every call is bounded by a
//! timeout; children are killed when the wait is abandoned.

use async_trait::async_trait;
use skillbox_foundation::{Error, NetworkFailure, StoreConfig};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("git executable not found in PATH")]
    Unavailable,

    #[error("No changes to commit")]
    NothingToCommit,

    #[error("git {op} timed out after {secs}s")]
    Timeout { op: String, secs: u64 },

    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("{kind}: {detail}")]
    Transport { kind: NetworkFailure, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VcsResult<T> = std::result::Result<T, VcsError>;

/// How a failure inside the mutation log is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Report and keep the filesystem change
    Warn,
    /// Propagate as an error
    Abort,
}

impl VcsError {
    pub fn severity(&self) -> Severity {
        match self {
            VcsError::Timeout { .. } => Severity::Abort,
            _ => Severity::Warn,
        }
    }
}

impl From<VcsError> for Error {
    fn from(e: VcsError) -> Self {
        match e {
            VcsError::Timeout { op, secs } => {
                Error::Timeout(format!("git {} did not finish within {}s", op, secs))
            }
            other => Error::Vcs(other.to_string()),
        }
    }
}

// ============================================================================
// Log records
// ============================================================================

/// One commit as reported by [`Vcs::log`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub hash: String,
    /// Committer time, seconds since the Unix epoch
    pub timestamp: i64,
    pub subject: String,
    pub body: String,
}

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';
const LOG_FORMAT: &str = "--format=%H%x1f%ct%x1f%s%x1f%b%x1e";

fn parse_log(output: &str) -> Vec<LogRecord> {
    output
        .split(RECORD_SEP)
        .map(|record| record.trim_start_matches(['\n', '\r']))
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let mut fields = record.splitn(4, FIELD_SEP);
            let hash = fields.next()?.trim().to_string();
            let timestamp = fields.next()?.trim().parse().ok()?;
            let subject = fields.next()?.trim().to_string();
            let body = fields.next().unwrap_or_default().trim().to_string();
            Some(LogRecord {
                hash,
                timestamp,
                subject,
                body,
            })
        })
        .collect()
}

// ============================================================================
// Vcs capability
// ============================================================================

/// Version-control operations the store relies on
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether the backend can run at all (e.g. `git` is installed)
    fn is_available(&self) -> bool;

    /// `dir` itself holds a repository (parents are not consulted)
    async fn is_repository(&self, dir: &Path) -> bool;

    async fn init(&self, dir: &Path) -> VcsResult<()>;

    /// Configure a repository-local identity unless one is already effective
    async fn ensure_identity(&self, dir: &Path, name: &str, email: &str) -> VcsResult<()>;

    /// Stage every change, including deletions
    async fn add_all(&self, dir: &Path) -> VcsResult<()>;

    /// Commit the index; [`VcsError::NothingToCommit`] when it matches HEAD
    async fn commit(&self, dir: &Path, message: &str) -> VcsResult<String>;

    /// Commits reachable from HEAD; zero when HEAD does not exist
    async fn commit_count(&self, dir: &Path) -> VcsResult<usize>;

    /// Newest first, skipping `skip` commits
    async fn log(&self, dir: &Path, skip: usize, limit: usize) -> VcsResult<Vec<LogRecord>>;

    /// Move HEAD and the working tree to `rev`
    async fn reset_hard(&self, dir: &Path, rev: &str) -> VcsResult<()>;

    /// Shallow clone of `url` into `dest`
    async fn clone_shallow(&self, url: &str, dest: &Path) -> VcsResult<()>;

    /// Bring a shallow clone to the remote's latest HEAD
    async fn fetch_latest(&self, dir: &Path) -> VcsResult<()>;
}

// ============================================================================
// GitCli
// ============================================================================

/// [`Vcs`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    git: Option<PathBuf>,
    local_timeout: Duration,
    network_timeout: Duration,
}

impl GitCli {
    pub fn new(config: &StoreConfig) -> Self {
        let git = which::which("git").ok();
        if git.is_none() {
            debug!("git not found in PATH");
        }
        Self {
            git,
            local_timeout: config.local_timeout(),
            network_timeout: config.network_timeout(),
        }
    }

    /// Override both timeouts
    pub fn with_timeouts(mut self, local: Duration, network: Duration) -> Self {
        self.local_timeout = local;
        self.network_timeout = network;
        self
    }

    /// Run git, returning trimmed stdout on success
    async fn run_git(&self, dir: &Path, args: &[&str], limit: Duration) -> VcsResult<String> {
        let git = self.git.as_ref().ok_or(VcsError::Unavailable)?;
        debug!("git {} (in {})", args.join(" "), dir.display());

        let child = Command::new(git)
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(VcsError::Timeout {
                    op: args.first().copied().unwrap_or("command").to_string(),
                    secs: limit.as_secs(),
                })
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(VcsError::CommandFailed(stderr))
        }
    }

    async fn local(&self, dir: &Path, args: &[&str]) -> VcsResult<String> {
        self.run_git(dir, args, self.local_timeout).await
    }

    async fn has_head(&self, dir: &Path) -> VcsResult<bool> {
        match self.local(dir, &["rev-parse", "--verify", "-q", "HEAD"]).await {
            Ok(_) => Ok(true),
            Err(VcsError::CommandFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn config_value(&self, dir: &Path, key: &str) -> VcsResult<Option<String>> {
        match self.local(dir, &["config", "--get", key]).await {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            Ok(_) | Err(VcsError::CommandFailed(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Map git's clone/fetch stderr onto a failure kind
pub fn classify_transport_error(stderr: &str) -> NetworkFailure {
    let lower = stderr.to_lowercase();
    if lower.contains("could not resolve host") {
        NetworkFailure::ResolveHost
    } else if lower.contains("not found")
        || lower.contains("could not read username")
        || lower.contains("authentication failed")
    {
        NetworkFailure::NotFound
    } else if lower.contains("timed out") {
        NetworkFailure::TimedOut
    } else {
        NetworkFailure::Other
    }
}

fn transport_error(e: VcsError) -> VcsError {
    match e {
        VcsError::CommandFailed(stderr) => VcsError::Transport {
            kind: classify_transport_error(&stderr),
            detail: stderr,
        },
        other => other,
    }
}

#[async_trait]
impl Vcs for GitCli {
    fn is_available(&self) -> bool {
        self.git.is_some()
    }

    async fn is_repository(&self, dir: &Path) -> bool {
        dir.join(".git").exists()
    }

    async fn init(&self, dir: &Path) -> VcsResult<()> {
        self.local(dir, &["init", "-q"]).await?;
        Ok(())
    }

    async fn ensure_identity(&self, dir: &Path, name: &str, email: &str) -> VcsResult<()> {
        if self.config_value(dir, "user.name").await?.is_none() {
            self.local(dir, &["config", "user.name", name]).await?;
        }
        if self.config_value(dir, "user.email").await?.is_none() {
            self.local(dir, &["config", "user.email", email]).await?;
        }
        Ok(())
    }

    async fn add_all(&self, dir: &Path) -> VcsResult<()> {
        self.local(dir, &["add", "-A"]).await?;
        Ok(())
    }

    async fn commit(&self, dir: &Path, message: &str) -> VcsResult<String> {
        let staged = self.local(dir, &["status", "--porcelain"]).await?;
        if staged.is_empty() {
            return Err(VcsError::NothingToCommit);
        }

        self.local(dir, &["commit", "-q", "-m", message]).await?;
        self.local(dir, &["rev-parse", "HEAD"]).await
    }

    async fn commit_count(&self, dir: &Path) -> VcsResult<usize> {
        if !self.has_head(dir).await? {
            return Ok(0);
        }
        let count = self.local(dir, &["rev-list", "--count", "HEAD"]).await?;
        count
            .parse()
            .map_err(|_| VcsError::CommandFailed(format!("unexpected rev-list output: {}", count)))
    }

    async fn log(&self, dir: &Path, skip: usize, limit: usize) -> VcsResult<Vec<LogRecord>> {
        if limit == 0 || !self.has_head(dir).await? {
            return Ok(Vec::new());
        }

        let skip = format!("--skip={}", skip);
        let limit = format!("--max-count={}", limit);
        let output = self.local(dir, &["log", skip.as_str(), limit.as_str(), LOG_FORMAT]).await?;
        Ok(parse_log(&output))
    }

    async fn reset_hard(&self, dir: &Path, rev: &str) -> VcsResult<()> {
        self.local(dir, &["reset", "--hard", "-q", rev]).await?;
        Ok(())
    }

    async fn clone_shallow(&self, url: &str, dest: &Path) -> VcsResult<()> {
        let parent = dest.parent().unwrap_or(dest);
        tokio::fs::create_dir_all(parent).await?;

        let dest_arg = dest.to_string_lossy();
        self.run_git(
            parent,
            &["clone", "--depth", "1", "-q", url, &*dest_arg],
            self.network_timeout,
        )
        .await
        .map_err(transport_error)?;
        Ok(())
    }

    async fn fetch_latest(&self, dir: &Path) -> VcsResult<()> {
        self.run_git(
            dir,
            &["fetch", "--depth", "1", "-q", "origin", "HEAD"],
            self.network_timeout,
        )
        .await
        .map_err(transport_error)?;
        self.reset_hard(dir, "FETCH_HEAD").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log() {
        let output = "abc\u{1f}1700000000\u{1f}feat(xlsx): add skill\u{1f}\u{1e}\n\
                      def\u{1f}1699999000\u{1f}chore(store): baseline existing skills\u{1f}Migrated skills:\n- a\n\u{1e}";
        let records = parse_log(output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hash, "abc");
        assert_eq!(records[0].timestamp, 1_700_000_000);
        assert_eq!(records[0].body, "");
        assert_eq!(records[1].subject, "chore(store): baseline existing skills");
        assert_eq!(records[1].body, "Migrated skills:\n- a");
    }

    #[test]
    fn test_classify_transport_error() {
        assert_eq!(
            classify_transport_error("remote: Repository not found.\nfatal: repository 'x' not found"),
            NetworkFailure::NotFound
        );
        assert_eq!(
            classify_transport_error("fatal: unable to access 'x': Could not resolve host: github.com"),
            NetworkFailure::ResolveHost
        );
        assert_eq!(
            classify_transport_error("fatal: could not read Username for 'https://github.com'"),
            NetworkFailure::NotFound
        );
        assert_eq!(classify_transport_error("boom"), NetworkFailure::Other);
    }

    #[test]
    fn test_severity() {
        let timeout = VcsError::Timeout {
            op: "commit".into(),
            secs: 10,
        };
        assert_eq!(timeout.severity(), Severity::Abort);
        assert_eq!(VcsError::Unavailable.severity(), Severity::Warn);
        assert_eq!(
            VcsError::CommandFailed("x".into()).severity(),
            Severity::Warn
        );
        assert!(matches!(Error::from(timeout), Error::Timeout(_)));
    }
}
