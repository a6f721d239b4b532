//! skillbox-core: skill store runtime
//!
//! Layer2 - 참조 문법, 경로, 탐색, 버전 관리, 명령
//!
//! # Modules
//!
//! - `reference`: `@skill/path`, `github.com@owner/repo[@skill]`, `localhost@path[@skill]`
//! - `paths`: store layout, path sanitizing and jailing
//! - `manifest`: SKILL.md header parsing, `name` rewriting, template
//! - `discovery`: find manifests under a source tree
//! - `store`: the local skills directory
//! - `git`: [`Vcs`] capability, [`MutationLog`] with bootstrap/undo/history
//! - `remote`: clone/refresh cache for remote sources
//! - `commands`: [`SkillCommands`], one method per user command
//!
//! # Example
//!
//! ```ignore
//! use skillbox_core::{GitCli, SkillCommands};
//! use skillbox_foundation::StoreConfig;
//!
//! let config = StoreConfig::from_env()?;
//! let commands = SkillCommands::new(config.clone(), GitCli::new(&config));
//!
//! let report = commands.init("report-writer").await?;
//! println!("{}", report.summary);
//!
//! for entry in commands.history(0, 10).await? {
//!     println!("{} {}", entry.short_hash(), entry.subject);
//! }
//! ```

pub mod commands;
pub mod discovery;
pub mod fsutil;
pub mod git;
pub mod manifest;
pub mod paths;
pub mod reference;
pub mod remote;
pub mod store;

// Re-exports: Reference grammar
pub use reference::{
    normalize_relative_path, parse_local_skill_name, parse_repo_reference,
    parse_repo_reference_with, parse_skill_path_ref, parse_skill_reference,
    parse_skill_reference_with, validate_skill_name, LocalContext, RemoteHost, RepoRef,
    SkillPathRef, SkillRef,
};

// Re-exports: Paths
pub use paths::{
    normalize_path, sanitize_path_segment, validate_local_path, validate_path_within_base,
    StorePaths,
};

// Re-exports: Manifest / Discovery / Store
pub use discovery::{discover_skills, find_manifests, find_skill_by_name, DiscoveredSkill};
pub use manifest::{generate_manifest, Manifest, DESCRIPTION_PLACEHOLDER};
pub use store::{LocalSkill, LocalSkillStore};

// Re-exports: Version control
pub use git::{
    CommitKind, CommitMessage, CommitOutcome, Fault, GitCli, HistoryEntry, MemoryVcs,
    MutationLog, PreparedMutation, RepoState, Severity, UndoOutcome, Vcs, VcsError,
    DEFAULT_HISTORY_LIMIT,
};

// Re-exports: Remote / Commands
pub use commands::{
    DownloadOutcome, MutationReport, RemoteListing, SkillCommands, ViewEntry, ViewOutput,
};
pub use remote::{RemoteCache, SourceTree};
