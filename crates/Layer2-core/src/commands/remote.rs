//! Remote commands: list a source, add one of its skills to the store

use super::{copy_skill_tree, rewrite_manifest_name, MutationReport, SkillCommands};
use crate::discovery::{discover_skills, find_skill_by_name, DiscoveredSkill};
use crate::git::{CommitKind, CommitMessage, Vcs};
use crate::reference::{parse_local_skill_name, parse_repo_reference, parse_skill_reference, RepoRef};
use skillbox_foundation::{Error, Result};
use tracing::info;

const RENAME_HINT: &str = "use --rename <name> to add it under another name";

/// Skills offered by a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteListing {
    pub repo: RepoRef,
    pub skills: Vec<DiscoveredSkill>,
    pub warnings: Vec<String>,
}

impl<V: Vcs> SkillCommands<V> {
    /// `remote list <repo>`
    pub async fn remote_list(&self, reference: &str) -> Result<RemoteListing> {
        let repo = parse_repo_reference(reference)?;
        let tree = self.remote_cache().ensure(&repo).await?;
        let skills = discover_skills(&tree.root, &repo)?;

        Ok(RemoteListing {
            repo,
            skills,
            warnings: tree.warnings,
        })
    }

    /// `remote add <skillref> [--rename name]`
    ///
    /// The local folder takes the discovered name unless `rename` is given.
    /// A discovered name that is not a valid local handle requires `rename`.
    pub async fn remote_add(&self, reference: &str, rename: Option<&str>) -> Result<MutationReport> {
        let skill_ref = parse_skill_reference(reference)?;
        let local_name = rename.map(parse_local_skill_name).transpose()?;

        let tree = self.remote_cache().ensure(&skill_ref.repo).await?;
        let skill = find_skill_by_name(&tree.root, &skill_ref.skill, &skill_ref.repo)?;

        let name = match local_name {
            Some(name) => name,
            None => parse_local_skill_name(&skill.name).map_err(|_| {
                Error::invalid_skill_name(
                    &skill.name,
                    format!("not usable as a local name; {}", RENAME_HINT),
                )
            })?,
        };
        let dest = self.vacant_skill(&name, Some(RENAME_HINT))?;

        let prepared = self.mutation_log().prepare().await?;
        let files = copy_skill_tree(&skill.dir, &dest).await?;
        if rename.is_some() {
            rewrite_manifest_name(&dest, &name).await?;
        }
        info!("Added {} as @{}", skill.reference, name);

        self.finish(
            prepared,
            CommitMessage::new(
                CommitKind::Feature,
                &name,
                format!("add from {}", skill_ref),
            ),
            format!("Added @{} from {} ({} files)", name, skill_ref, files),
            tree.warnings,
        )
        .await
    }
}
