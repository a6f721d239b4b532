//! Versioned Mutation Log
//!
//! Wraps the filesystem edits of one command in "ensure repository, migrate
//! existing content, stage, commit". A command must call
//! [`MutationLog::prepare`] before touching the skills directory; only the
//! returned [`PreparedMutation`] can commit.

use super::commit::CommitMessage;
use super::ops::{LogRecord, Severity, Vcs, VcsError};
use crate::store::list_visible_dirs;
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use skillbox_foundation::{Error, Result, StoreConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// `history` timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default page size of `history`
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Version-control state of the skills directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    /// No repository yet; the next mutation bootstraps one
    Uninitialized,
    Ready,
    /// Version control cannot run; mutations proceed unrecorded
    Degraded,
}

/// Result of committing a prepared mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { hash: String },
    NothingToCommit,
    Skipped { warning: String },
}

/// One `history` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub hash: String,
    pub timestamp: DateTime<Local>,
    pub subject: String,
    pub body: String,
}

impl HistoryEntry {
    fn from_record(record: LogRecord) -> Self {
        let timestamp = Local
            .timestamp_opt(record.timestamp, 0)
            .earliest()
            .unwrap_or_else(Local::now);
        Self {
            hash: record.hash,
            timestamp,
            subject: record.subject,
            body: record.body,
        }
    }

    /// Local time, second precision
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }
}

/// The commit removed by `undo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoOutcome {
    pub hash: String,
    pub subject: String,
}

// ============================================================================
// MutationLog
// ============================================================================

pub struct MutationLog<'a, V: Vcs + ?Sized> {
    vcs: &'a V,
    dir: PathBuf,
    author_name: String,
    author_email: String,
}

impl<'a, V: Vcs + ?Sized> MutationLog<'a, V> {
    pub fn new(vcs: &'a V, config: &StoreConfig) -> Self {
        let settings = config.settings();
        Self {
            vcs,
            dir: config.skills_dir(),
            author_name: settings.author_name.clone(),
            author_email: settings.author_email.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn state(&self) -> RepoState {
        if !self.vcs.is_available() {
            RepoState::Degraded
        } else if self.vcs.is_repository(&self.dir).await {
            RepoState::Ready
        } else {
            RepoState::Uninitialized
        }
    }

    /// Make sure the skills directory is versioned before a command edits it.
    ///
    /// First use initializes the repository and commits every folder that
    /// already existed as a baseline. A repository still without commits
    /// retries the baseline. Failures other than timeouts degrade
    /// the mutation to an unrecorded one.
    pub async fn prepare(&self) -> Result<PreparedMutation<'a, V>> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::at_path(&self.dir, e))?;

        let mut prepared = PreparedMutation {
            vcs: self.vcs,
            dir: self.dir.clone(),
            migrated: Vec::new(),
            degraded: None,
        };

        let result = match self.state().await {
            RepoState::Degraded => Err(VcsError::Unavailable),
            RepoState::Ready => match self.vcs.commit_count(&self.dir).await {
                // An earlier bootstrap initialized but never recorded its baseline
                Ok(0) => {
                    let existing = list_visible_dirs(&self.dir)?;
                    self.baseline(&existing).await
                }
                Ok(_) => self.ensure_identity().await.map(|()| Vec::new()),
                Err(e) => Err(e),
            },
            RepoState::Uninitialized => {
                let existing = list_visible_dirs(&self.dir)?;
                match self.init_repository().await {
                    Ok(()) => self.baseline(&existing).await,
                    Err(e) => Err(e),
                }
            }
        };

        match result {
            Ok(migrated) => prepared.migrated = migrated,
            Err(e) => match e.severity() {
                Severity::Abort => return Err(e.into()),
                Severity::Warn => {
                    warn!("Version control degraded: {}", e);
                    prepared.degraded = Some(format!("change not versioned: {}", e));
                }
            },
        }

        Ok(prepared)
    }

    async fn ensure_identity(&self) -> std::result::Result<(), VcsError> {
        self.vcs
            .ensure_identity(&self.dir, &self.author_name, &self.author_email)
            .await
    }

    async fn init_repository(&self) -> std::result::Result<(), VcsError> {
        info!("Initializing skill repository at {}", self.dir.display());
        self.vcs.init(&self.dir).await
    }

    /// Commit the folders that predate versioning; returns the migrated folders
    async fn baseline(&self, existing: &[String]) -> std::result::Result<Vec<String>, VcsError> {
        self.ensure_identity().await?;
        if existing.is_empty() {
            return Ok(Vec::new());
        }

        self.vcs.add_all(&self.dir).await?;
        let message = CommitMessage::baseline(existing);
        match self.vcs.commit(&self.dir, &message.render()).await {
            Ok(hash) => {
                debug!("Baseline commit {} ({} skills)", hash, existing.len());
                Ok(existing.to_vec())
            }
            Err(VcsError::NothingToCommit) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Discard the most recent commit, restoring the tree to its parent
    pub async fn undo(&self) -> Result<UndoOutcome> {
        if !self.vcs.is_available() {
            return Err(VcsError::Unavailable.into());
        }
        if !self.vcs.is_repository(&self.dir).await {
            return Err(Error::NotVersioned);
        }

        match self.vcs.commit_count(&self.dir).await? {
            0 => return Err(Error::NoCommits),
            1 => return Err(Error::AtInitialCommit),
            _ => {}
        }

        let head = self
            .vcs
            .log(&self.dir, 0, 1)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoCommits)?;

        self.vcs.reset_hard(&self.dir, "HEAD~1").await?;
        info!("Undid {} {}", head.hash, head.subject);

        Ok(UndoOutcome {
            hash: head.hash,
            subject: head.subject,
        })
    }

    /// Newest first; an unversioned store has no history
    pub async fn history(&self, offset: usize, limit: usize) -> Result<Vec<HistoryEntry>> {
        if !self.vcs.is_available() || !self.vcs.is_repository(&self.dir).await {
            return Ok(Vec::new());
        }

        let records = self.vcs.log(&self.dir, offset, limit).await?;
        Ok(records.into_iter().map(HistoryEntry::from_record).collect())
    }

    /// Total number of commits; zero when unversioned
    pub async fn commit_count(&self) -> Result<usize> {
        if !self.vcs.is_available() || !self.vcs.is_repository(&self.dir).await {
            return Ok(0);
        }
        Ok(self.vcs.commit_count(&self.dir).await?)
    }
}

// ============================================================================
// PreparedMutation
// ============================================================================

/// Proof that the log was prepared; consumed by [`commit`](Self::commit)
#[must_use = "a prepared mutation must be committed"]
pub struct PreparedMutation<'a, V: Vcs + ?Sized> {
    vcs: &'a V,
    dir: PathBuf,
    migrated: Vec<String>,
    degraded: Option<String>,
}

impl<V: Vcs + ?Sized> std::fmt::Debug for PreparedMutation<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedMutation")
            .field("dir", &self.dir)
            .field("migrated", &self.migrated)
            .field("degraded", &self.degraded)
            .finish()
    }
}

impl<V: Vcs + ?Sized> PreparedMutation<'_, V> {
    /// Folders committed by the baseline, if this call bootstrapped
    pub fn migrated(&self) -> &[String] {
        &self.migrated
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// Stage everything and commit `message`
    pub async fn commit(self, message: &CommitMessage) -> Result<CommitOutcome> {
        if let Some(warning) = self.degraded {
            return Ok(CommitOutcome::Skipped { warning });
        }

        let result = match self.vcs.add_all(&self.dir).await {
            Ok(()) => self.vcs.commit(&self.dir, &message.render()).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(hash) => {
                debug!("Committed {} {}", hash, message.subject());
                Ok(CommitOutcome::Committed { hash })
            }
            Err(VcsError::NothingToCommit) => Ok(CommitOutcome::NothingToCommit),
            Err(e) => match e.severity() {
                Severity::Abort => Err(e.into()),
                Severity::Warn => {
                    warn!("Commit failed: {}", e);
                    Ok(CommitOutcome::Skipped {
                        warning: format!("change not versioned: {}", e),
                    })
                }
            },
        }
    }
}
