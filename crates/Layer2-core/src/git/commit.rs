//! Structured commit messages
//!
//! Every mutation is recorded as `<token>(<scope>): <description>` with an
//! optional body separated by a blank line.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref SUBJECT: Regex = Regex::new(r"^([a-z]+)\(([^)]*)\): (.+)$").unwrap();
}

/// Scope of the commit that migrates pre-existing skills
pub const BASELINE_SCOPE: &str = "store";

/// Description of the baseline commit
pub const BASELINE_DESCRIPTION: &str = "baseline existing skills";

// ============================================================================
// CommitKind
// ============================================================================

/// What kind of change a commit records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// New skill or new file
    Feature,
    /// Existing file changed
    Fix,
    /// Skill renamed
    Refactor,
    /// Removal, baseline
    Chore,
}

impl CommitKind {
    /// Token rendered in the subject line
    pub fn token(&self) -> &'static str {
        match self {
            CommitKind::Feature => "feat",
            CommitKind::Fix => "fix",
            CommitKind::Refactor => "refactor",
            CommitKind::Chore => "chore",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "feat" | "feature" => Some(CommitKind::Feature),
            "fix" => Some(CommitKind::Fix),
            "refactor" => Some(CommitKind::Refactor),
            "chore" => Some(CommitKind::Chore),
            _ => None,
        }
    }
}

impl fmt::Display for CommitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ============================================================================
// CommitMessage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub kind: CommitKind,
    /// Affected skill folder name
    pub scope: String,
    pub description: String,
    pub body: Option<String>,
}

impl CommitMessage {
    pub fn new(kind: CommitKind, scope: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            scope: scope.into(),
            description: description.into(),
            body: None,
        }
    }

    /// Attach a body; blank text leaves the message without one
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        let trimmed = body.trim();
        self.body = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// The commit that migrates folders found before versioning started
    pub fn baseline(migrated: &[String]) -> Self {
        let mut body = String::from("Migrated skills:");
        for name in migrated {
            body.push_str("\n- ");
            body.push_str(name);
        }
        Self::new(CommitKind::Chore, BASELINE_SCOPE, BASELINE_DESCRIPTION).with_body(body)
    }

    pub fn subject(&self) -> String {
        format!("{}({}): {}", self.kind, self.scope, self.description)
    }

    pub fn render(&self) -> String {
        match &self.body {
            Some(body) => format!("{}\n\n{}", self.subject(), body),
            None => self.subject(),
        }
    }

    /// Parse a subject (and optional body) written by [`render`](Self::render)
    pub fn parse(subject: &str, body: &str) -> Option<Self> {
        let caps = SUBJECT.captures(subject.trim())?;
        let kind = CommitKind::from_token(&caps[1])?;
        Some(Self::new(kind, &caps[2], &caps[3]).with_body(body))
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let message = CommitMessage::new(CommitKind::Feature, "xlsx", "create skill");
        assert_eq!(message.render(), "feat(xlsx): create skill");

        let message = CommitMessage::new(CommitKind::Fix, "xlsx", "update scripts/run.py")
            .with_body("Handle empty sheets");
        assert_eq!(
            message.render(),
            "fix(xlsx): update scripts/run.py\n\nHandle empty sheets"
        );
    }

    #[test]
    fn test_blank_body_is_dropped() {
        let message = CommitMessage::new(CommitKind::Chore, "a", "delete skill").with_body("  \n");
        assert!(message.body.is_none());
    }

    #[test]
    fn test_baseline() {
        let message = CommitMessage::baseline(&["alpha".into(), "beta".into()]);
        assert_eq!(
            message.render(),
            "chore(store): baseline existing skills\n\nMigrated skills:\n- alpha\n- beta"
        );
    }

    #[test]
    fn test_parse() {
        let parsed = CommitMessage::parse("refactor(new-name): rename from old-name", "").unwrap();
        assert_eq!(parsed.kind, CommitKind::Refactor);
        assert_eq!(parsed.scope, "new-name");
        assert_eq!(parsed.description, "rename from old-name");
        assert!(CommitMessage::parse("Initial commit", "").is_none());
    }
}
