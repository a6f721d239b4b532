//! 로컬 스킬 변경 명령: init, delete, copy, rename, upsert

use super::{copy_skill_tree, rewrite_manifest_name, MutationReport, SkillCommands};
use crate::git::{CommitKind, CommitMessage, Vcs};
use crate::manifest::generate_manifest;
use crate::reference::{parse_local_skill_name, parse_skill_path_ref, validate_skill_name};
use skillbox_foundation::{Error, Result, MANIFEST_FILE};
use std::path::Path;
use tokio::fs;
use tracing::info;

impl<V: Vcs> SkillCommands<V> {
    /// `init <name>`: new skill from the manifest template
    pub async fn init(&self, name: &str) -> Result<MutationReport> {
        let name = validate_skill_name(name)?;
        let skill_dir = self.vacant_skill(&name, None)?;

        let prepared = self.mutation_log().prepare().await?;

        fs::create_dir_all(&skill_dir)
            .await
            .map_err(|e| Error::at_path(&skill_dir, e))?;
        let manifest_path = skill_dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, generate_manifest(&name))
            .await
            .map_err(|e| Error::at_path(&manifest_path, e))?;
        info!("Created skill {}", name);

        self.finish(
            prepared,
            CommitMessage::new(CommitKind::Feature, &name, "create skill"),
            format!("Created skill @{} at {}", name, skill_dir.display()),
            Vec::new(),
        )
        .await
    }

    /// `delete <@skill | @skill/path>`
    pub async fn delete(&self, reference: &str) -> Result<MutationReport> {
        let target = parse_skill_path_ref(reference, true)?;
        let skill_dir = self.existing_skill(&target.skill)?;

        if target.is_whole_skill() {
            let prepared = self.mutation_log().prepare().await?;
            fs::remove_dir_all(&skill_dir)
                .await
                .map_err(|e| Error::at_path(&skill_dir, e))?;

            return self
                .finish(
                    prepared,
                    CommitMessage::new(CommitKind::Chore, &target.skill, "delete skill"),
                    format!("Deleted skill @{}", target.skill),
                    Vec::new(),
                )
                .await;
        }

        if target.path == MANIFEST_FILE {
            return Err(Error::InvalidInput(format!(
                "refusing to delete {} alone; delete the whole skill with @{}",
                MANIFEST_FILE, target.skill
            )));
        }

        let path = self.paths.skill_file_path(&target.skill, &target.path)?;
        let metadata = fs::symlink_metadata(&path)
            .await
            .map_err(|_| Error::NotFound(format!("'{}' in @{}", target.path, target.skill)))?;

        let prepared = self.mutation_log().prepare().await?;
        let removed = if metadata.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.map_err(|e| Error::at_path(&path, e))?;

        self.finish(
            prepared,
            CommitMessage::new(
                CommitKind::Chore,
                &target.skill,
                format!("delete {}", target.path),
            ),
            format!("Deleted {}", target),
            Vec::new(),
        )
        .await
    }

    /// `copy <src> <dst>`
    pub async fn copy(&self, source: &str, destination: &str) -> Result<MutationReport> {
        let (source, destination) = self.source_and_destination(source, destination)?;
        let source_dir = self.existing_skill(&source)?;
        let dest_dir = self.vacant_skill(&destination, None)?;

        let prepared = self.mutation_log().prepare().await?;
        let files = copy_skill_tree(&source_dir, &dest_dir).await?;
        rewrite_manifest_name(&dest_dir, &destination).await?;

        self.finish(
            prepared,
            CommitMessage::new(
                CommitKind::Feature,
                &destination,
                format!("copy from {}", source),
            ),
            format!("Copied @{} to @{} ({} files)", source, destination, files),
            Vec::new(),
        )
        .await
    }

    /// `rename <src> <dst>`
    pub async fn rename(&self, source: &str, destination: &str) -> Result<MutationReport> {
        let (source, destination) = self.source_and_destination(source, destination)?;
        let source_dir = self.existing_skill(&source)?;
        let dest_dir = self.vacant_skill(&destination, None)?;

        let prepared = self.mutation_log().prepare().await?;
        fs::rename(&source_dir, &dest_dir)
            .await
            .map_err(|e| Error::at_path(&source_dir, e))?;
        rewrite_manifest_name(&dest_dir, &destination).await?;

        self.finish(
            prepared,
            CommitMessage::new(
                CommitKind::Refactor,
                &destination,
                format!("rename from {}", source),
            ),
            format!("Renamed @{} to @{}", source, destination),
            Vec::new(),
        )
        .await
    }

    fn source_and_destination(&self, source: &str, destination: &str) -> Result<(String, String)> {
        let source = parse_local_skill_name(source)?;
        let destination = parse_local_skill_name(destination)?;
        if source == destination {
            return Err(Error::InvalidInput(
                "source and destination are the same skill".to_string(),
            ));
        }
        Ok((source, destination))
    }

    /// `upsert <localfile> <@skill/path> [-m msg]`
    ///
    /// Creating a file records a feature, replacing one records a fix.
    /// Identical content changes nothing and records nothing.
    pub async fn upsert(
        &self,
        local_file: &Path,
        reference: &str,
        message: Option<&str>,
    ) -> Result<MutationReport> {
        let target = parse_skill_path_ref(reference, false)?;
        self.existing_skill(&target.skill)?;

        let metadata = fs::metadata(local_file)
            .await
            .map_err(|e| Error::at_path(local_file, e))?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a regular file",
                local_file.display()
            )));
        }
        let content = fs::read(local_file)
            .await
            .map_err(|e| Error::at_path(local_file, e))?;

        let path = self.paths.skill_file_path(&target.skill, &target.path)?;
        if path.is_dir() {
            return Err(Error::InvalidInput(format!("{} is a directory", target)));
        }

        let existed = path.exists();
        if existed {
            let current = fs::read(&path).await.map_err(|e| Error::at_path(&path, e))?;
            if current == content {
                return Ok(MutationReport::unchanged(format!(
                    "{} is already up to date",
                    target
                )));
            }
        }

        let prepared = self.mutation_log().prepare().await?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::at_path(parent, e))?;
        }
        fs::write(&path, &content)
            .await
            .map_err(|e| Error::at_path(&path, e))?;

        let (kind, verb, summary_verb) = if existed {
            (CommitKind::Fix, "update", "Updated")
        } else {
            (CommitKind::Feature, "add", "Added")
        };
        let mut commit = CommitMessage::new(kind, &target.skill, format!("{} {}", verb, target.path));
        if let Some(body) = message {
            commit = commit.with_body(body);
        }

        self.finish(
            prepared,
            commit,
            format!("{} {}", summary_verb, target),
            Vec::new(),
        )
        .await
    }
}
