//! Remote Cache - 원격 저장소 캐시
//!
//! Remote sources live as shallow clones under `repos/`. The first use
//! clones (failure is fatal); later uses refresh, falling back to the cached
//! copy with a warning. Local sources are validated and used in place.

use crate::git::{Vcs, VcsError};
use crate::paths::{validate_local_path, StorePaths};
use crate::reference::RepoRef;
use skillbox_foundation::{Error, NetworkFailure, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A source tree ready to be scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    pub root: PathBuf,
    /// Non-fatal problems, e.g. a failed refresh
    pub warnings: Vec<String>,
}

pub struct RemoteCache<'a, V: Vcs + ?Sized> {
    vcs: &'a V,
    paths: &'a StorePaths,
}

impl<'a, V: Vcs + ?Sized> RemoteCache<'a, V> {
    pub fn new(vcs: &'a V, paths: &'a StorePaths) -> Self {
        Self { vcs, paths }
    }

    /// Make the source of `repo` available on disk
    pub async fn ensure(&self, repo: &RepoRef) -> Result<SourceTree> {
        match repo {
            RepoRef::Local { path } => {
                validate_local_path(path)?;
                Ok(SourceTree {
                    root: path.clone(),
                    warnings: Vec::new(),
                })
            }
            RepoRef::Remote {
                host,
                owner,
                repo: name,
            } => {
                let dest = self.paths.repo_cache_path(*host, owner, name)?;
                let mut warnings = Vec::new();

                if self.vcs.is_repository(&dest).await {
                    debug!("Refreshing {}", dest.display());
                    if let Err(e) = self.vcs.fetch_latest(&dest).await {
                        warn!("Refresh of {} failed: {}", repo, e);
                        warnings.push(format!(
                            "could not refresh {} ({}); using cached copy",
                            repo, e
                        ));
                    }
                } else {
                    if dest.exists() {
                        debug!("Removing incomplete clone at {}", dest.display());
                        std::fs::remove_dir_all(&dest).map_err(|e| Error::at_path(&dest, e))?;
                    }

                    let url = host.clone_url(owner, name);
                    info!("Cloning {}", url);
                    if let Err(e) = self.vcs.clone_shallow(&url, &dest).await {
                        if dest.exists() {
                            let _ = std::fs::remove_dir_all(&dest);
                        }
                        return Err(clone_error(repo, e));
                    }
                }

                Ok(SourceTree {
                    root: dest,
                    warnings,
                })
            }
        }
    }
}

fn clone_error(repo: &RepoRef, e: VcsError) -> Error {
    if matches!(e, VcsError::Unavailable) {
        return e.into();
    }

    let kind = match &e {
        VcsError::Transport { kind, detail } => {
            debug!("Clone failed: {}", detail);
            *kind
        }
        VcsError::Timeout { .. } => NetworkFailure::TimedOut,
        other => {
            debug!("Clone failed: {}", other);
            NetworkFailure::Other
        }
    };
    Error::Network {
        reference: repo.to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MemoryVcs;
    use crate::reference::RemoteHost;
    use skillbox_foundation::StoreConfig;
    use tempfile::TempDir;

    fn remote() -> RepoRef {
        RepoRef::Remote {
            host: RemoteHost::GitHub,
            owner: "acme".into(),
            repo: "skills".into(),
        }
    }

    #[tokio::test]
    async fn test_clone_then_refresh() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        std::fs::create_dir_all(upstream.join("pdf")).unwrap();
        std::fs::write(upstream.join("pdf/SKILL.md"), "---\nname: pdf\n---\n").unwrap();

        let paths = StorePaths::new(&StoreConfig::at(temp.path().join("store")));
        let vcs = MemoryVcs::new();
        vcs.register_remote("https://github.com/acme/skills.git", &upstream)
            .await;
        let cache = RemoteCache::new(&vcs, &paths);

        let tree = cache.ensure(&remote()).await.unwrap();
        assert!(tree.root.join("pdf/SKILL.md").exists());
        assert!(tree.warnings.is_empty());
        assert_eq!(vcs.clone_count().await, 1);

        vcs.set_network_down(true).await;
        let tree = cache.ensure(&remote()).await.unwrap();
        assert_eq!(tree.warnings.len(), 1);
        assert_eq!(vcs.clone_count().await, 1);
        assert_eq!(vcs.fetch_count().await, 1);
    }

    #[tokio::test]
    async fn test_clone_failure_is_classified() {
        let temp = TempDir::new().unwrap();
        let paths = StorePaths::new(&StoreConfig::at(temp.path()));
        let vcs = MemoryVcs::new();
        let cache = RemoteCache::new(&vcs, &paths);

        let err = cache.ensure(&remote()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Network {
                kind: NetworkFailure::NotFound,
                ..
            }
        ));
        assert!(!paths.repo_cache_path(RemoteHost::GitHub, "acme", "skills").unwrap().exists());

        vcs.set_network_down(true).await;
        let err = cache.ensure(&remote()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Network {
                kind: NetworkFailure::ResolveHost,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_local_source() {
        let temp = TempDir::new().unwrap();
        let paths = StorePaths::new(&StoreConfig::at(temp.path().join("store")));
        let vcs = MemoryVcs::new();
        let cache = RemoteCache::new(&vcs, &paths);

        let local = RepoRef::Local {
            path: temp.path().to_path_buf(),
        };
        assert_eq!(cache.ensure(&local).await.unwrap().root, temp.path());

        let missing = RepoRef::Local {
            path: temp.path().join("missing"),
        };
        assert!(matches!(
            cache.ensure(&missing).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
