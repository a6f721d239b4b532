//! Command Operations
//!
//! [`SkillCommands`] runs one user command against the store:
//! validate references, resolve paths, fetch remote sources, check
//! existence, prepare the mutation log, edit the filesystem, commit.
//!
//! - `local`: init, delete, copy, rename, upsert
//! - `inspect`: list, view, download
//! - `remote`: remote list, remote add
//! - `history`: undo, history

mod history;
mod inspect;
mod local;
mod remote;

pub use inspect::{DownloadOutcome, ViewEntry, ViewOutput};
pub use remote::RemoteListing;

use crate::fsutil::copy_dir_recursive;
use crate::git::{CommitMessage, CommitOutcome, MutationLog, PreparedMutation, Vcs};
use crate::paths::StorePaths;
use crate::remote::RemoteCache;
use crate::store::LocalSkillStore;
use skillbox_foundation::{Error, Result, StoreConfig, MANIFEST_FILE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a mutating command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    /// One-line description for the user
    pub summary: String,
    pub commit: CommitOutcome,
    /// Folders committed as the baseline when this command bootstrapped
    pub migrated: Vec<String>,
    pub warnings: Vec<String>,
}

impl MutationReport {
    /// A command that changed nothing on disk
    fn unchanged(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commit: CommitOutcome::NothingToCommit,
            migrated: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Entry point for every store command
pub struct SkillCommands<V: Vcs> {
    config: StoreConfig,
    paths: StorePaths,
    vcs: V,
}

impl<V: Vcs> SkillCommands<V> {
    pub fn new(config: StoreConfig, vcs: V) -> Self {
        Self {
            paths: StorePaths::new(&config),
            config,
            vcs,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn store(&self) -> LocalSkillStore {
        LocalSkillStore::new(self.paths.skills_dir())
    }

    pub fn mutation_log(&self) -> MutationLog<'_, V> {
        MutationLog::new(&self.vcs, &self.config)
    }

    fn remote_cache(&self) -> RemoteCache<'_, V> {
        RemoteCache::new(&self.vcs, &self.paths)
    }

    /// Directory of an existing local skill
    fn existing_skill(&self, name: &str) -> Result<PathBuf> {
        let path = self.paths.local_skill_path(name)?;
        if !self.store().exists(name) {
            return Err(Error::NotFound(format!("Skill '@{}'", name)));
        }
        Ok(path)
    }

    /// Directory for a skill that must not exist yet
    fn vacant_skill(&self, name: &str, hint: Option<&str>) -> Result<PathBuf> {
        let path = self.paths.local_skill_path(name)?;
        if path.exists() {
            return Err(Error::already_exists(format!("Skill '@{}'", name), hint));
        }
        Ok(path)
    }

    /// Commit a prepared mutation and assemble the report
    async fn finish(
        &self,
        prepared: PreparedMutation<'_, V>,
        message: CommitMessage,
        summary: String,
        mut warnings: Vec<String>,
    ) -> Result<MutationReport> {
        let migrated = prepared.migrated().to_vec();
        let commit = prepared.commit(&message).await?;

        if let CommitOutcome::Skipped { warning } = &commit {
            warnings.push(warning.clone());
        }
        debug!("{} -> {:?}", message.subject(), commit);

        Ok(MutationReport {
            summary,
            commit,
            migrated,
            warnings,
        })
    }
}

/// Copy a skill tree into a vacant `dest`; a failed copy leaves nothing behind
async fn copy_skill_tree(source: &Path, dest: &Path) -> Result<usize> {
    match copy_dir_recursive(source, dest).await {
        Ok(files) => Ok(files),
        Err(e) => {
            let _ = tokio::fs::remove_dir_all(dest).await;
            Err(e)
        }
    }
}

/// Rewrite the `name` field of the manifest in `skill_dir`, if there is one
async fn rewrite_manifest_name(skill_dir: &Path, name: &str) -> Result<()> {
    let manifest_path = skill_dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Ok(());
    }

    let manifest = crate::manifest::Manifest::load(&manifest_path)?;
    tokio::fs::write(&manifest_path, manifest.render_with_name(name))
        .await
        .map_err(|e| Error::at_path(&manifest_path, e))
}
