//! In-memory [`Vcs`] for tests and git-less environments
//!
//! Commits are full snapshots of the working tree (everything except
//! `.git`). Remotes are plain directories registered under a URL; a clone
//! copies them, a fetch copies them again.

use super::ops::{LogRecord, Vcs, VcsError, VcsResult};
use crate::paths::normalize_path;
use async_trait::async_trait;
use skillbox_foundation::NetworkFailure;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Snapshot = BTreeMap<PathBuf, Vec<u8>>;

const EPOCH_BASE: i64 = 1_700_000_000;

/// Failure injected into the next local operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    #[default]
    None,
    /// Stage and commit fail as if git reported an error
    CommandFailed,
    /// Stage and commit time out
    Timeout,
}

#[derive(Debug, Clone)]
struct MemoryCommit {
    hash: String,
    timestamp: i64,
    message: String,
    tree: Snapshot,
}

#[derive(Debug, Default)]
struct MemoryRepo {
    commits: Vec<MemoryCommit>,
    staged: Option<Snapshot>,
    identity: Option<(String, String)>,
    origin: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    repos: HashMap<PathBuf, MemoryRepo>,
    remotes: HashMap<String, PathBuf>,
    fault: Fault,
    network_down: bool,
    clock: i64,
    clones: usize,
    fetches: usize,
}

/// Snapshot-based fake of the git executable
#[derive(Debug)]
pub struct MemoryVcs {
    available: bool,
    state: Mutex<MemoryState>,
}

impl Default for MemoryVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVcs {
    pub fn new() -> Self {
        Self {
            available: true,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Behaves like a machine without git installed
    pub fn unavailable() -> Self {
        Self {
            available: false,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Serve the contents of `source` for clones of `url`
    pub async fn register_remote(&self, url: impl Into<String>, source: impl Into<PathBuf>) {
        self.state
            .lock()
            .await
            .remotes
            .insert(url.into(), source.into());
    }

    pub async fn inject_fault(&self, fault: Fault) {
        self.state.lock().await.fault = fault;
    }

    /// Make clone and fetch fail with "could not resolve host"
    pub async fn set_network_down(&self, down: bool) {
        self.state.lock().await.network_down = down;
    }

    pub async fn clone_count(&self) -> usize {
        self.state.lock().await.clones
    }

    pub async fn fetch_count(&self) -> usize {
        self.state.lock().await.fetches
    }

    /// Identity configured for the repository at `dir`
    pub async fn identity(&self, dir: &Path) -> Option<(String, String)> {
        self.state
            .lock()
            .await
            .repos
            .get(&normalize_path(dir))
            .and_then(|repo| repo.identity.clone())
    }

    fn check_available(&self) -> VcsResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(VcsError::Unavailable)
        }
    }
}

fn not_a_repository(dir: &Path) -> VcsError {
    VcsError::CommandFailed(format!(
        "fatal: not a git repository: {}",
        dir.display()
    ))
}

fn fault_error(fault: Fault, op: &str) -> VcsResult<()> {
    match fault {
        Fault::None => Ok(()),
        Fault::CommandFailed => Err(VcsError::CommandFailed(format!("injected {} failure", op))),
        Fault::Timeout => Err(VcsError::Timeout {
            op: op.to_string(),
            secs: 10,
        }),
    }
}

/// Every file under `dir` except `.git`, keyed by relative path
fn snapshot(dir: &Path) -> VcsResult<Snapshot> {
    fn walk(base: &Path, current: &Path, out: &mut Snapshot) -> VcsResult<()> {
        for entry in std::fs::read_dir(current)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                if entry.file_name() == ".git" {
                    continue;
                }
                walk(base, &path, out)?;
            } else if file_type.is_file() {
                let relative = path.strip_prefix(base).unwrap_or(&path).to_path_buf();
                out.insert(relative, std::fs::read(&path)?);
            }
        }
        Ok(())
    }

    let mut out = Snapshot::new();
    if dir.is_dir() {
        walk(dir, dir, &mut out)?;
    }
    Ok(out)
}

/// Remove empty directories from `start` upwards, stopping at `root`
fn prune_empty_dirs(root: &Path, start: &Path) {
    let mut current = start.to_path_buf();
    while current != root && current.starts_with(root) {
        if std::fs::remove_dir(&current).is_err() {
            break;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
}

/// Replace the tracked content of `dir` (`from`) with `to`
fn checkout(dir: &Path, from: &Snapshot, to: &Snapshot) -> VcsResult<()> {
    for relative in from.keys().filter(|k| !to.contains_key(*k)) {
        let path = dir.join(relative);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        if let Some(parent) = path.parent() {
            prune_empty_dirs(dir, parent);
        }
    }

    for (relative, content) in to {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
    }
    Ok(())
}

fn copy_tree(source: &Path, dest: &Path) -> VcsResult<Snapshot> {
    let tree = snapshot(source)?;
    std::fs::create_dir_all(dest)?;
    checkout(dest, &Snapshot::new(), &tree)?;
    Ok(tree)
}

/// `HEAD`, `HEAD~n` or a (prefix of a) hash, as an index into `commits`
fn resolve_rev(commits: &[MemoryCommit], rev: &str) -> Option<usize> {
    let head = commits.len().checked_sub(1)?;
    if rev == "HEAD" {
        return Some(head);
    }
    if let Some(n) = rev.strip_prefix("HEAD~") {
        let n: usize = if n.is_empty() { 1 } else { n.parse().ok()? };
        return head.checked_sub(n);
    }
    commits.iter().position(|c| c.hash.starts_with(rev))
}

fn split_message(message: &str) -> (String, String) {
    match message.split_once("\n\n") {
        Some((subject, body)) => (subject.trim().to_string(), body.trim().to_string()),
        None => (message.trim().to_string(), String::new()),
    }
}

#[async_trait]
impl Vcs for MemoryVcs {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn is_repository(&self, dir: &Path) -> bool {
        self.state
            .lock()
            .await
            .repos
            .contains_key(&normalize_path(dir))
    }

    async fn init(&self, dir: &Path) -> VcsResult<()> {
        self.check_available()?;
        std::fs::create_dir_all(dir)?;
        self.state
            .lock()
            .await
            .repos
            .entry(normalize_path(dir))
            .or_default();
        Ok(())
    }

    async fn ensure_identity(&self, dir: &Path, name: &str, email: &str) -> VcsResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let repo = state
            .repos
            .get_mut(&normalize_path(dir))
            .ok_or_else(|| not_a_repository(dir))?;
        if repo.identity.is_none() {
            repo.identity = Some((name.to_string(), email.to_string()));
        }
        Ok(())
    }

    async fn add_all(&self, dir: &Path) -> VcsResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        fault_error(state.fault, "add")?;
        let tree = snapshot(dir)?;
        let repo = state
            .repos
            .get_mut(&normalize_path(dir))
            .ok_or_else(|| not_a_repository(dir))?;
        repo.staged = Some(tree);
        Ok(())
    }

    async fn commit(&self, dir: &Path, message: &str) -> VcsResult<String> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        fault_error(state.fault, "commit")?;
        state.clock += 1;
        let timestamp = EPOCH_BASE + state.clock * 60;

        let repo = state
            .repos
            .get_mut(&normalize_path(dir))
            .ok_or_else(|| not_a_repository(dir))?;
        let tree = repo.staged.take().unwrap_or_default();
        let unchanged = match repo.commits.last() {
            Some(head) => head.tree == tree,
            None => tree.is_empty(),
        };
        if unchanged {
            return Err(VcsError::NothingToCommit);
        }

        let hash = format!("{:040x}", (timestamp as u128) << 16 | repo.commits.len() as u128);
        repo.commits.push(MemoryCommit {
            hash: hash.clone(),
            timestamp,
            message: message.to_string(),
            tree,
        });
        Ok(hash)
    }

    async fn commit_count(&self, dir: &Path) -> VcsResult<usize> {
        self.check_available()?;
        let state = self.state.lock().await;
        state
            .repos
            .get(&normalize_path(dir))
            .map(|repo| repo.commits.len())
            .ok_or_else(|| not_a_repository(dir))
    }

    async fn log(&self, dir: &Path, skip: usize, limit: usize) -> VcsResult<Vec<LogRecord>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let repo = state
            .repos
            .get(&normalize_path(dir))
            .ok_or_else(|| not_a_repository(dir))?;

        Ok(repo
            .commits
            .iter()
            .rev()
            .skip(skip)
            .take(limit)
            .map(|commit| {
                let (subject, body) = split_message(&commit.message);
                LogRecord {
                    hash: commit.hash.clone(),
                    timestamp: commit.timestamp,
                    subject,
                    body,
                }
            })
            .collect())
    }

    async fn reset_hard(&self, dir: &Path, rev: &str) -> VcsResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let repo = state
            .repos
            .get_mut(&normalize_path(dir))
            .ok_or_else(|| not_a_repository(dir))?;

        let target = resolve_rev(&repo.commits, rev).ok_or_else(|| {
            VcsError::CommandFailed(format!("fatal: ambiguous argument '{}'", rev))
        })?;

        let current = repo
            .commits
            .last()
            .map(|c| c.tree.clone())
            .unwrap_or_default();
        checkout(dir, &current, &repo.commits[target].tree)?;

        repo.commits.truncate(target + 1);
        repo.staged = None;
        Ok(())
    }

    async fn clone_shallow(&self, url: &str, dest: &Path) -> VcsResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if state.network_down {
            return Err(VcsError::Transport {
                kind: NetworkFailure::ResolveHost,
                detail: "Could not resolve host".to_string(),
            });
        }

        let source = state.remotes.get(url).cloned().ok_or_else(|| VcsError::Transport {
            kind: NetworkFailure::NotFound,
            detail: format!("remote: Repository not found ({})", url),
        })?;

        state.clock += 1;
        let timestamp = EPOCH_BASE + state.clock * 60;
        let tree = copy_tree(&source, dest)?;

        state.clones += 1;
        state.repos.insert(
            normalize_path(dest),
            MemoryRepo {
                commits: vec![MemoryCommit {
                    hash: format!("{:040x}", timestamp),
                    timestamp,
                    message: format!("Clone of {}", url),
                    tree,
                }],
                staged: None,
                identity: None,
                origin: Some(url.to_string()),
            },
        );
        Ok(())
    }

    async fn fetch_latest(&self, dir: &Path) -> VcsResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        state.fetches += 1;
        if state.network_down {
            return Err(VcsError::Transport {
                kind: NetworkFailure::ResolveHost,
                detail: "Could not resolve host".to_string(),
            });
        }

        let origin = state
            .repos
            .get(&normalize_path(dir))
            .and_then(|repo| repo.origin.clone())
            .ok_or_else(|| not_a_repository(dir))?;
        let source = state.remotes.get(&origin).cloned().ok_or_else(|| VcsError::Transport {
            kind: NetworkFailure::NotFound,
            detail: format!("remote: Repository not found ({})", origin),
        })?;

        let current = snapshot(dir)?;
        let latest = snapshot(&source)?;
        checkout(dir, &current, &latest)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_commit_and_reset_restore_tree() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        let vcs = MemoryVcs::new();

        vcs.init(dir).await.unwrap();
        std::fs::create_dir_all(dir.join("a")).unwrap();
        std::fs::write(dir.join("a/SKILL.md"), "one").unwrap();
        vcs.add_all(dir).await.unwrap();
        vcs.commit(dir, "feat(a): create skill").await.unwrap();

        std::fs::create_dir_all(dir.join("b/scripts")).unwrap();
        std::fs::write(dir.join("b/scripts/x.sh"), "two").unwrap();
        vcs.add_all(dir).await.unwrap();
        vcs.commit(dir, "feat(b): create skill\n\nbody").await.unwrap();

        let log = vcs.log(dir, 0, 10).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].subject, "feat(b): create skill");
        assert_eq!(log[0].body, "body");
        assert!(log[0].timestamp > log[1].timestamp);

        vcs.reset_hard(dir, "HEAD~1").await.unwrap();
        assert_eq!(vcs.commit_count(dir).await.unwrap(), 1);
        assert!(dir.join("a/SKILL.md").exists());
        assert!(!dir.join("b").exists());
    }

    #[tokio::test]
    async fn test_nothing_to_commit() {
        let temp = TempDir::new().unwrap();
        let vcs = MemoryVcs::new();
        vcs.init(temp.path()).await.unwrap();
        vcs.add_all(temp.path()).await.unwrap();
        assert!(matches!(
            vcs.commit(temp.path(), "x").await.unwrap_err(),
            VcsError::NothingToCommit
        ));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let temp = TempDir::new().unwrap();
        let vcs = MemoryVcs::unavailable();
        assert!(!vcs.is_available());
        assert!(matches!(
            vcs.init(temp.path()).await.unwrap_err(),
            VcsError::Unavailable
        ));
    }

    #[test]
    fn test_resolve_rev() {
        let commit = |hash: &str| MemoryCommit {
            hash: hash.into(),
            timestamp: 0,
            message: String::new(),
            tree: Snapshot::new(),
        };
        let commits = vec![commit("aaa"), commit("bbb"), commit("ccc")];
        assert_eq!(resolve_rev(&commits, "HEAD"), Some(2));
        assert_eq!(resolve_rev(&commits, "HEAD~1"), Some(1));
        assert_eq!(resolve_rev(&commits, "HEAD~3"), None);
        assert_eq!(resolve_rev(&commits, "bb"), Some(1));
        assert_eq!(resolve_rev(&[], "HEAD"), None);
    }
}
