//! Skill Discovery - 소스 트리에서 SKILL.md 찾기
//!
//! Walks a cached remote or a local directory and turns every manifest into a
//! [`DiscoveredSkill`]. Ignore files are not honored; a fixed set of VCS and
//! build directories is skipped instead.

use crate::manifest::Manifest;
use crate::reference::RepoRef;
use ignore::WalkBuilder;
use serde::Serialize;
use skillbox_foundation::{Error, Result, MANIFEST_FILE};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directories never descended into
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
];

/// A manifest found under a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredSkill {
    /// Header `name`, else the skill directory name
    pub name: String,
    pub description: String,
    /// Directory containing the manifest
    pub dir: PathBuf,
    /// Path to `SKILL.md`
    pub manifest: PathBuf,
    /// `host@owner/repo@name` or `localhost@path@name`
    pub reference: String,
}

fn is_skipped(entry: &ignore::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_some_and(|t| t.is_dir())
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Every `SKILL.md` under `root`, ordered by manifest path
pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false) // no .gitignore / hidden-file handling
        .follow_links(false)
        .filter_entry(|entry| !is_skipped(entry))
        .build();

    let mut manifests = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_some_and(|t| t.is_file()) && entry.file_name() == MANIFEST_FILE {
            manifests.push(entry.into_path());
        }
    }

    manifests.sort();
    Ok(manifests)
}

/// Parse every manifest under `root` into skills of `repo`
pub fn discover_skills(root: &Path, repo: &RepoRef) -> Result<Vec<DiscoveredSkill>> {
    let mut skills = Vec::new();

    for manifest_path in find_manifests(root)? {
        let manifest = match Manifest::load(&manifest_path) {
            Ok(m) => m,
            Err(e) => {
                warn!("Cannot read {}: {}", manifest_path.display(), e);
                continue;
            }
        };

        let dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        let folder = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let name = manifest.resolved_name(&folder);
        skills.push(DiscoveredSkill {
            reference: format!("{}@{}", repo, name),
            description: manifest.resolved_description(),
            name,
            dir,
            manifest: manifest_path,
        });
    }

    debug!("Discovered {} skills in {}", skills.len(), repo);
    Ok(skills)
}

/// First skill (in path order) whose resolved name equals `name`
pub fn find_skill_by_name(root: &Path, name: &str, repo: &RepoRef) -> Result<DiscoveredSkill> {
    discover_skills(root, repo)?
        .into_iter()
        .find(|skill| skill.name == name)
        .ok_or_else(|| Error::NotFound(format!("Skill '{}' in {}", name, repo)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn local(root: &Path) -> RepoRef {
        RepoRef::Local {
            path: root.to_path_buf(),
        }
    }

    #[test]
    fn test_discover_nested_and_skipped() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "document-skills/xlsx/SKILL.md", "---\nname: xlsx\ndescription: Sheets\n---\n");
        write(root, "pdf/SKILL.md", "# PDF\n\nRead PDFs.\n");
        write(root, "node_modules/junk/SKILL.md", "---\nname: junk\n---\n");
        write(root, ".git/hooks/SKILL.md", "---\nname: hidden\n---\n");
        write(root, ".claude/skills/dot/SKILL.md", "---\nname: dot\n---\n");

        let skills = discover_skills(root, &local(root)).unwrap();
        let names: Vec<_> = skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["dot", "xlsx", "pdf"]);

        let pdf = &skills[2];
        assert_eq!(pdf.description, "Read PDFs.");
        assert_eq!(pdf.dir, root.join("pdf"));
        assert_eq!(
            pdf.reference,
            format!("localhost@{}@pdf", root.display())
        );
    }

    #[test]
    fn test_find_skill_by_name() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "a/SKILL.md", "---\nname: shared\ndescription: first\n---\n");
        write(root, "b/SKILL.md", "---\nname: shared\ndescription: second\n---\n");

        let skill = find_skill_by_name(root, "shared", &local(root)).unwrap();
        assert_eq!(skill.description, "first");

        let err = find_skill_by_name(root, "missing", &local(root)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_discover_missing_root() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(discover_skills(&missing, &local(&missing)).is_err());
    }
}
