//! undo / history

use super::SkillCommands;
use crate::git::{HistoryEntry, UndoOutcome, Vcs};
use skillbox_foundation::Result;

impl<V: Vcs> SkillCommands<V> {
    /// `undo`: drop the most recent commit and restore the tree
    pub async fn undo(&self) -> Result<UndoOutcome> {
        self.mutation_log().undo().await
    }

    /// `history [--offset n] [--limit n]`, newest first
    pub async fn history(&self, offset: usize, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.mutation_log().history(offset, limit).await
    }
}
