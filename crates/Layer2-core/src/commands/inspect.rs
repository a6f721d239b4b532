//! Read-only commands: list, view, download

use super::SkillCommands;
use crate::fsutil::{copy_dir_recursive, is_binary_file};
use crate::git::Vcs;
use crate::reference::parse_skill_path_ref;
use crate::store::LocalSkill;
use skillbox_foundation::{Error, Result, MANIFEST_FILE};
use std::path::{Path, PathBuf};
use tokio::fs;

/// What `view` shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutput {
    Text(String),
    Directory(Vec<ViewEntry>),
    /// Not printed; size in bytes
    Binary { path: PathBuf, size: u64 },
}

/// One line of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub destination: PathBuf,
    pub files: usize,
}

async fn list_directory(dir: &Path) -> Result<Vec<ViewEntry>> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await.map_err(|e| Error::at_path(dir, e))?;
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| Error::at_path(dir, e))?
    {
        let metadata = entry
            .metadata()
            .await
            .map_err(|e| Error::at_path(entry.path(), e))?;
        entries.push(ViewEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: metadata.is_dir(),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
        });
    }

    // Directories first, then by name
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

impl<V: Vcs> SkillCommands<V> {
    /// `list`: every local skill, sorted by folder name
    pub fn list(&self) -> Result<Vec<LocalSkill>> {
        self.store().list()
    }

    /// `view <@skill[/path]>`
    pub async fn view(&self, reference: &str) -> Result<ViewOutput> {
        let target = parse_skill_path_ref(reference, true)?;
        let skill_dir = self.existing_skill(&target.skill)?;

        let path = if target.is_whole_skill() {
            let manifest = skill_dir.join(MANIFEST_FILE);
            if !manifest.is_file() {
                return Ok(ViewOutput::Directory(list_directory(&skill_dir).await?));
            }
            manifest
        } else {
            self.paths.skill_file_path(&target.skill, &target.path)?
        };

        let metadata = fs::metadata(&path)
            .await
            .map_err(|_| Error::NotFound(format!("'{}' in @{}", target.path, target.skill)))?;

        if metadata.is_dir() {
            return Ok(ViewOutput::Directory(list_directory(&path).await?));
        }

        if is_binary_file(&path)? {
            return Ok(ViewOutput::Binary {
                path,
                size: metadata.len(),
            });
        }

        let bytes = fs::read(&path).await.map_err(|e| Error::at_path(&path, e))?;
        Ok(ViewOutput::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// `download <@skill[/path]> <dest>`
    ///
    /// An existing directory as `dest` receives the item under its own name.
    /// Nothing is ever overwritten.
    pub async fn download(&self, reference: &str, dest: &Path) -> Result<DownloadOutcome> {
        let target = parse_skill_path_ref(reference, true)?;
        let skill_dir = self.existing_skill(&target.skill)?;

        let source = if target.is_whole_skill() {
            skill_dir
        } else {
            self.paths.skill_file_path(&target.skill, &target.path)?
        };
        let metadata = fs::metadata(&source)
            .await
            .map_err(|_| Error::NotFound(format!("'{}' in @{}", target.path, target.skill)))?;

        let destination = if dest.is_dir() {
            let name = source
                .file_name()
                .ok_or_else(|| Error::InvalidInput(format!("cannot name {}", target)))?;
            dest.join(name)
        } else {
            dest.to_path_buf()
        };

        if destination.exists() {
            return Err(Error::already_exists(
                format!("'{}'", destination.display()),
                Some("choose another destination"),
            ));
        }

        let files = if metadata.is_dir() {
            copy_dir_recursive(&source, &destination).await?
        } else {
            if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::at_path(parent, e))?;
            }
            fs::copy(&source, &destination)
                .await
                .map_err(|e| Error::at_path(&source, e))?;
            1
        };

        Ok(DownloadOutcome { destination, files })
    }
}
