//! Store Paths - deterministic locations under the store root

use super::security::{sanitize_path_segment, validate_path_within_base};
use crate::reference::{RemoteHost, RepoRef};
use skillbox_foundation::{Result, StoreConfig};
use std::path::{Path, PathBuf};

/// Resolves references to concrete paths under a store root
#[derive(Debug, Clone)]
pub struct StorePaths {
    repos_dir: PathBuf,
    skills_dir: PathBuf,
}

impl StorePaths {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            repos_dir: config.repos_dir(),
            skills_dir: config.skills_dir(),
        }
    }

    /// `<root>/repos`
    pub fn repos_dir(&self) -> &Path {
        &self.repos_dir
    }

    /// `<root>/skills`, the version-controlled working tree
    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Where the skills of a source live on disk.
    ///
    /// Remote sources map to `repos/<host>/<owner>/<repo>`; local sources
    /// are used in place.
    pub fn source_path(&self, repo: &RepoRef) -> Result<PathBuf> {
        match repo {
            RepoRef::Remote { host, owner, repo } => self.repo_cache_path(*host, owner, repo),
            RepoRef::Local { path } => Ok(path.clone()),
        }
    }

    /// `repos/<host>/<owner>/<repo>`
    pub fn repo_cache_path(&self, host: RemoteHost, owner: &str, repo: &str) -> Result<PathBuf> {
        let path = self
            .repos_dir
            .join(sanitize_path_segment(host.as_str())?)
            .join(sanitize_path_segment(owner)?)
            .join(sanitize_path_segment(repo)?);
        validate_path_within_base(&path, &self.repos_dir)
    }

    /// `skills/<name>` for an already validated skill name
    pub fn local_skill_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.skills_dir.join(sanitize_path_segment(name)?);
        validate_path_within_base(&path, &self.skills_dir)
    }

    /// `skills/<name>/<relative>`; an empty `relative` is the skill itself
    pub fn skill_file_path(&self, name: &str, relative: &str) -> Result<PathBuf> {
        let skill_dir = self.local_skill_path(name)?;
        if relative.is_empty() {
            return Ok(skill_dir);
        }
        validate_path_within_base(&skill_dir.join(relative), &skill_dir)
    }
}
