//! Reference Grammar
//!
//! Turns user-supplied address strings into structured references:
//!
//! ```text
//! github.com@<owner>/<repo>            RepoRef::Remote
//! localhost@<path>                     RepoRef::Local
//! <repo>@<skill>                       SkillRef
//! @<skill>/<relative/path>             SkillPathRef
//! @<skill> | <skill>                   validate_skill_name
//! ```
//!
//! Every identifier a command receives flows through one of these functions
//! before it touches the filesystem.

use crate::paths::normalize_path;
use lazy_static::lazy_static;
use regex::Regex;
use skillbox_foundation::{Error, Result, HOST_GITHUB, HOST_LOCAL};
use std::fmt;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref SKILL_NAME: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    static ref REPO_SEGMENT: Regex = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
}

// ============================================================================
// Types
// ============================================================================

/// Remote hosts skillbox can clone from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteHost {
    GitHub,
}

impl RemoteHost {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteHost::GitHub => HOST_GITHUB,
        }
    }

    /// HTTPS clone URL for `owner/repo` on this host
    pub fn clone_url(&self, owner: &str, repo: &str) -> String {
        match self {
            RemoteHost::GitHub => format!("https://github.com/{}/{}.git", owner, repo),
        }
    }
}

/// A source of skills
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepoRef {
    /// A repository on a remote host, cached under `repos/`
    Remote {
        host: RemoteHost,
        owner: String,
        repo: String,
    },
    /// A directory on the local filesystem (absolute, normalized)
    Local { path: PathBuf },
}

impl RepoRef {
    /// The literal before the first `@`
    pub fn host_tag(&self) -> &'static str {
        match self {
            RepoRef::Remote { host, .. } => host.as_str(),
            RepoRef::Local { .. } => HOST_LOCAL,
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoRef::Remote { host, owner, repo } => {
                write!(f, "{}@{}/{}", host.as_str(), owner, repo)
            }
            RepoRef::Local { path } => write!(f, "{}@{}", HOST_LOCAL, path.display()),
        }
    }
}

/// A skill inside a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRef {
    pub repo: RepoRef,
    pub skill: String,
}

impl fmt::Display for SkillRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repo, self.skill)
    }
}

/// A file (or the whole skill, when `path` is empty) inside a local skill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillPathRef {
    pub skill: String,
    pub path: String,
}

impl SkillPathRef {
    /// True when the reference targets the whole skill
    pub fn is_whole_skill(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for SkillPathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "@{}", self.skill)
        } else {
            write!(f, "@{}/{}", self.skill, self.path)
        }
    }
}

/// Where relative and `~` paths of `localhost@` references are resolved
#[derive(Debug, Clone)]
pub struct LocalContext {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
}

impl LocalContext {
    /// Current working directory and the user's home directory
    pub fn current() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self {
            cwd,
            home: dirs::home_dir(),
        })
    }
}

// ============================================================================
// Repository references
// ============================================================================

/// Parse `github.com@owner/repo` or `localhost@path`
pub fn parse_repo_reference(input: &str) -> Result<RepoRef> {
    parse_repo_reference_with(input, &LocalContext::current()?)
}

/// `parse_repo_reference` against an explicit cwd/home
pub fn parse_repo_reference_with(input: &str, ctx: &LocalContext) -> Result<RepoRef> {
    let (host, rest) = input.split_once('@').ok_or_else(|| {
        Error::invalid_reference(
            input,
            format!(
                "expected {}@<owner>/<repo> or {}@<path>",
                HOST_GITHUB, HOST_LOCAL
            ),
        )
    })?;

    match host {
        HOST_GITHUB => parse_github(input, rest),
        HOST_LOCAL => parse_local(input, rest, ctx),
        other => Err(Error::UnsupportedHost {
            host: other.to_string(),
        }),
    }
}

fn parse_github(input: &str, rest: &str) -> Result<RepoRef> {
    let grammar = || format!("expected {}@<owner>/<repo>", HOST_GITHUB);

    let (owner, repo) = rest
        .split_once('/')
        .ok_or_else(|| Error::invalid_reference(input, grammar()))?;

    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(Error::invalid_reference(input, grammar()));
    }

    for segment in [owner, repo] {
        if segment == "." || segment == ".." || !REPO_SEGMENT.is_match(segment) {
            return Err(Error::invalid_reference(
                input,
                format!("'{}' is not a valid owner or repository name", segment),
            ));
        }
    }

    Ok(RepoRef::Remote {
        host: RemoteHost::GitHub,
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

fn parse_local(input: &str, rest: &str, ctx: &LocalContext) -> Result<RepoRef> {
    if rest.is_empty() {
        return Err(Error::invalid_reference(
            input,
            format!("expected {}@<path>", HOST_LOCAL),
        ));
    }
    if rest.contains('\0') {
        return Err(Error::invalid_reference(input, "path contains a null byte"));
    }

    let path = expand_local_path(rest, ctx)
        .ok_or_else(|| Error::Config("Cannot find home directory".to_string()))?;

    Ok(RepoRef::Local {
        path: normalize_path(&path),
    })
}

/// `~` → home, `~/rest` → home/rest, relative → cwd/rest.
/// `None` only when `~` is used and there is no home directory.
fn expand_local_path(raw: &str, ctx: &LocalContext) -> Option<PathBuf> {
    if raw == "~" {
        return ctx.home.clone();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return ctx.home.as_ref().map(|home| home.join(rest));
    }

    let path = Path::new(raw);
    Some(if path.is_absolute() {
        path.to_path_buf()
    } else {
        ctx.cwd.join(path)
    })
}

// ============================================================================
// Skill references
// ============================================================================

/// Parse `<repo-reference>@<skill>`; the skill is whatever follows the last `@`
pub fn parse_skill_reference(input: &str) -> Result<SkillRef> {
    parse_skill_reference_with(input, &LocalContext::current()?)
}

/// `parse_skill_reference` against an explicit cwd/home
pub fn parse_skill_reference_with(input: &str, ctx: &LocalContext) -> Result<SkillRef> {
    let grammar = || {
        format!(
            "expected {}@<owner>/<repo>@<skill> or {}@<path>@<skill>",
            HOST_GITHUB, HOST_LOCAL
        )
    };

    let idx = input
        .rfind('@')
        .ok_or_else(|| Error::invalid_reference(input, grammar()))?;
    let (repo_part, skill) = (&input[..idx], &input[idx + 1..]);

    if skill.trim().is_empty() {
        return Err(Error::invalid_reference(input, "skill name is empty"));
    }
    if skill.contains('\0') {
        return Err(Error::invalid_reference(input, "skill name contains a null byte"));
    }
    if !repo_part.contains('@') {
        return Err(Error::invalid_reference(input, grammar()));
    }

    Ok(SkillRef {
        repo: parse_repo_reference_with(repo_part, ctx)?,
        skill: skill.trim().to_string(),
    })
}

/// Parse `@<skill>/<path>`.
///
/// With `allow_empty_path`, `@<skill>` and `@<skill>/` address the whole skill.
pub fn parse_skill_path_ref(input: &str, allow_empty_path: bool) -> Result<SkillPathRef> {
    let rest = input.strip_prefix('@').ok_or_else(|| {
        Error::invalid_reference(input, "expected @<skill>/<path>")
    })?;

    let (skill, raw_path) = match rest.split_once('/') {
        Some((skill, path)) => (skill, path),
        None if allow_empty_path => (rest, ""),
        None => {
            return Err(Error::invalid_reference(
                input,
                "file path required, expected @<skill>/<path>",
            ))
        }
    };

    let skill = validate_skill_name(skill)?;
    let path = normalize_relative_path(raw_path)?;

    if path.is_empty() && !allow_empty_path {
        return Err(Error::invalid_reference(
            input,
            "file path required, expected @<skill>/<path>",
        ));
    }

    Ok(SkillPathRef { skill, path })
}

/// Collapse repeated separators, strip leading/trailing ones, drop `.`
/// segments. Rejects `..` segments and null bytes.
pub fn normalize_relative_path(raw: &str) -> Result<String> {
    if raw.contains('\0') {
        return Err(Error::PathTraversal);
    }

    let mut segments = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => continue,
            s if s.split('\\').any(|part| part == "..") => return Err(Error::PathTraversal),
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}

// ============================================================================
// Skill names
// ============================================================================

/// Validate a bare skill handle (`name` or `@name`) and return it cleaned
pub fn validate_skill_name(input: &str) -> Result<String> {
    let name = input.strip_prefix('@').unwrap_or(input).trim();

    let reason = if name.is_empty() {
        Some("name cannot be empty")
    } else if name == "." || name == ".." {
        Some("reserved path name")
    } else if name.contains('/') || name.contains('\\') {
        Some("path separators are not allowed")
    } else if name.contains("..") {
        Some("'..' is not allowed")
    } else if name.contains('\0') {
        Some("null bytes are not allowed")
    } else if !SKILL_NAME.is_match(name) {
        Some("only letters, digits, '-' and '_' are allowed")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::invalid_skill_name(input, reason)),
        None => Ok(name.to_string()),
    }
}

/// Alias used by commands that take a local skill handle
pub fn parse_local_skill_name(input: &str) -> Result<String> {
    validate_skill_name(input)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LocalContext {
        LocalContext {
            cwd: PathBuf::from("/work/dir"),
            home: Some(PathBuf::from("/home/alice")),
        }
    }

    #[test]
    fn test_parse_github_reference() {
        let r = parse_repo_reference_with("github.com@owner/repo", &ctx()).unwrap();
        assert_eq!(
            r,
            RepoRef::Remote {
                host: RemoteHost::GitHub,
                owner: "owner".into(),
                repo: "repo".into(),
            }
        );
        assert_eq!(r.to_string(), "github.com@owner/repo");
        assert_eq!(r.host_tag(), "github.com");
    }

    #[test]
    fn test_parse_github_reference_rejects_bad_shapes() {
        for input in [
            "github.com@owner",
            "github.com@/repo",
            "github.com@owner/",
            "github.com@owner/repo/extra",
            "github.com@../repo",
            "github.com@own er/repo",
        ] {
            let err = parse_repo_reference_with(input, &ctx()).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::InvalidReference { .. }
                        | Error::InvalidSkillName { .. }
                        | Error::UnsupportedHost { .. }
                        | Error::PathTraversal
                ),
                "{input} should be a grammar error"
            );
        }
    }

    #[test]
    fn test_parse_unsupported_host() {
        let err = parse_repo_reference_with("gitlab.com@a/b", &ctx()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedHost { ref host } if host == "gitlab.com"));
        assert!(err.to_string().contains("github.com"));
        assert!(err.to_string().contains("localhost"));
    }

    #[test]
    fn test_parse_missing_host() {
        assert!(parse_repo_reference_with("owner/repo", &ctx()).is_err());
    }

    #[test]
    fn test_parse_local_tilde() {
        let r = parse_repo_reference_with("localhost@~/x", &ctx()).unwrap();
        assert_eq!(
            r,
            RepoRef::Local {
                path: PathBuf::from("/home/alice/x")
            }
        );

        let r = parse_repo_reference_with("localhost@~", &ctx()).unwrap();
        assert_eq!(
            r,
            RepoRef::Local {
                path: PathBuf::from("/home/alice")
            }
        );
    }

    #[test]
    fn test_parse_local_relative_and_absolute() {
        let r = parse_repo_reference_with("localhost@./skills/../repo", &ctx()).unwrap();
        assert_eq!(
            r,
            RepoRef::Local {
                path: PathBuf::from("/work/dir/repo")
            }
        );

        let r = parse_repo_reference_with("localhost@/opt/skills", &ctx()).unwrap();
        assert_eq!(r.to_string(), "localhost@/opt/skills");
    }

    #[test]
    fn test_parse_local_empty() {
        assert!(parse_repo_reference_with("localhost@", &ctx()).is_err());
    }

    #[test]
    fn test_parse_skill_reference_uses_last_at() {
        let r = parse_skill_reference_with("github.com@anthropics/skills@xlsx", &ctx()).unwrap();
        assert_eq!(r.skill, "xlsx");
        assert_eq!(r.to_string(), "github.com@anthropics/skills@xlsx");

        let r = parse_skill_reference_with("localhost@~/lib@pdf", &ctx()).unwrap();
        assert_eq!(r.skill, "pdf");
        assert_eq!(
            r.repo,
            RepoRef::Local {
                path: PathBuf::from("/home/alice/lib")
            }
        );
    }

    #[test]
    fn test_parse_skill_reference_requires_skill() {
        assert!(parse_skill_reference_with("github.com@a/b@", &ctx()).is_err());
        assert!(parse_skill_reference_with("github.com@a/b", &ctx()).is_err());
        assert!(parse_skill_reference_with("xlsx", &ctx()).is_err());
    }

    #[test]
    fn test_parse_skill_path_ref() {
        let r = parse_skill_path_ref("@xlsx/SKILL.md", false).unwrap();
        assert_eq!(r.skill, "xlsx");
        assert_eq!(r.path, "SKILL.md");

        let r = parse_skill_path_ref("@xlsx//a///b.py", false).unwrap();
        assert_eq!(r.path, "a/b.py");
        assert_eq!(r.to_string(), "@xlsx/a/b.py");
    }

    #[test]
    fn test_parse_skill_path_ref_traversal() {
        let err = parse_skill_path_ref("@xlsx/../secret", false).unwrap_err();
        assert!(matches!(err, Error::PathTraversal));
        assert!(parse_skill_path_ref("@xlsx/a/..\\..\\b", false).is_err());
        assert!(parse_skill_path_ref("@xlsx/a\0b", false).is_err());
    }

    #[test]
    fn test_parse_skill_path_ref_empty_path() {
        assert!(parse_skill_path_ref("@xlsx", false).is_err());
        assert!(parse_skill_path_ref("@xlsx/", false).is_err());

        let r = parse_skill_path_ref("@xlsx", true).unwrap();
        assert!(r.is_whole_skill());
        let r = parse_skill_path_ref("@xlsx///", true).unwrap();
        assert!(r.is_whole_skill());
        assert_eq!(r.to_string(), "@xlsx");
    }

    #[test]
    fn test_parse_skill_path_ref_requires_at() {
        assert!(parse_skill_path_ref("xlsx/SKILL.md", false).is_err());
        assert!(parse_skill_path_ref("@bad name/SKILL.md", false).is_err());
    }

    #[test]
    fn test_validate_skill_name_accepts() {
        for name in ["xlsx", "my-skill", "my_skill_2", "@pdf", "  docx  ", "A1"] {
            assert!(validate_skill_name(name).is_ok(), "{name} should be valid");
        }
        assert_eq!(validate_skill_name("@pdf").unwrap(), "pdf");
        assert_eq!(parse_local_skill_name(" docx ").unwrap(), "docx");
    }

    #[test]
    fn test_validate_skill_name_rejects() {
        for name in [
            "", "@", ".", "..", "a/b", "a\\b", "a..b", "a\0b", "with space", "dot.name",
            "ümlaut",
        ] {
            let err = validate_skill_name(name).unwrap_err();
            assert!(matches!(err, Error::InvalidSkillName { .. }), "{name:?}");
        }
    }
}
