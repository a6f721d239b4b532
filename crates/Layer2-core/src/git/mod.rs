//! Git Integration Module
//!
//! Version control for the skills directory:
//! - `ops`: the [`Vcs`] capability and [`GitCli`], which drives the `git` executable
//! - `commit`: structured `<kind>(<scope>): <description>` messages
//! - `log`: [`MutationLog`], lazy bootstrap, commit, undo and history
//! - `memory`: [`MemoryVcs`], a snapshot-based stand-in for tests

pub mod commit;
pub mod log;
pub mod memory;
pub mod ops;

pub use commit::{CommitKind, CommitMessage, BASELINE_DESCRIPTION, BASELINE_SCOPE};
pub use log::{
    CommitOutcome, HistoryEntry, MutationLog, PreparedMutation, RepoState, UndoOutcome,
    DEFAULT_HISTORY_LIMIT, TIMESTAMP_FORMAT,
};
pub use memory::{Fault, MemoryVcs};
pub use ops::{classify_transport_error, GitCli, LogRecord, Severity, Vcs, VcsError, VcsResult};
