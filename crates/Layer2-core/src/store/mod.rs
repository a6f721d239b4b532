//! Local Skill Store - `skills/` 아래의 스킬 목록
//!
//! Each top-level, non-hidden directory of the skills directory is one skill;
//! its folder name is the authoritative `@name` handle.

use crate::manifest::{Manifest, DESCRIPTION_PLACEHOLDER};
use serde::Serialize;
use skillbox_foundation::{Error, Result, MANIFEST_FILE};
use std::path::{Path, PathBuf};

/// A skill in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalSkill {
    /// Folder name under `skills/`
    pub folder: String,
    /// Header `name`, else the folder name
    pub name: String,
    pub description: String,
    pub path: PathBuf,
}

impl LocalSkill {
    fn load(folder: String, path: PathBuf) -> Self {
        let manifest_path = path.join(MANIFEST_FILE);
        match Manifest::load(&manifest_path) {
            Ok(manifest) => Self {
                name: manifest.resolved_name(&folder),
                description: manifest.resolved_description(),
                folder,
                path,
            },
            Err(_) => Self {
                name: folder.clone(),
                description: DESCRIPTION_PLACEHOLDER.to_string(),
                folder,
                path,
            },
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }
}

/// Read-only view over the skills directory
#[derive(Debug, Clone)]
pub struct LocalSkillStore {
    skills_dir: PathBuf,
}

impl LocalSkillStore {
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills_dir: skills_dir.into(),
        }
    }

    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Folder names of every non-hidden top-level directory, sorted
    pub fn folders(&self) -> Result<Vec<String>> {
        list_visible_dirs(&self.skills_dir)
    }

    /// All skills sorted by folder name; a missing directory is an empty store
    pub fn list(&self) -> Result<Vec<LocalSkill>> {
        Ok(self
            .folders()?
            .into_iter()
            .map(|folder| {
                let path = self.skills_dir.join(&folder);
                LocalSkill::load(folder, path)
            })
            .collect())
    }

    /// Whether `folder` is a skill directory; `folder` must already be validated
    pub fn exists(&self, folder: &str) -> bool {
        self.skills_dir.join(folder).is_dir()
    }
}

/// Non-hidden child directories of `dir`, sorted; missing `dir` yields none
pub fn list_visible_dirs(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::at_path(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::at_path(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}
