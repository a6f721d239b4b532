//! 출력 - stdout 결과, stderr 경고/오류
//!
//! Text is the default; `--json` prints one JSON document per command.
//! Warnings and errors always go to stderr as `warning:` / `error:` lines.

use serde::Serialize;
use serde_json::{json, Value};
use skillbox_core::{
    CommitOutcome, DownloadOutcome, HistoryEntry, LocalSkill, MutationReport, RemoteListing,
    UndoOutcome, ViewEntry, ViewOutput,
};

const SHORT_HASH_LEN: usize = 7;

pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn error(&self, error: &anyhow::Error) {
        eprintln!("error: {:#}", error);
    }

    fn warnings(&self, warnings: &[String]) {
        for warning in warnings {
            eprintln!("warning: {}", warning);
        }
    }

    fn emit<T: Serialize + ?Sized>(&self, text: &str, value: &T) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else if !text.is_empty() {
            println!("{}", text);
        }
        Ok(())
    }

    pub fn skills(&self, skills: &[LocalSkill]) -> anyhow::Result<()> {
        self.emit(&render_skills(skills), skills)
    }

    pub fn report(&self, report: &MutationReport) -> anyhow::Result<()> {
        self.warnings(&report.warnings);
        self.emit(&render_report(report), &report_json(report))
    }

    pub fn view(&self, output: &ViewOutput) -> anyhow::Result<()> {
        match output {
            // Printed as-is
            ViewOutput::Text(text) if !self.json => {
                print!("{}", text);
                if !text.ends_with('\n') {
                    println!();
                }
                Ok(())
            }
            _ => self.emit(&render_view(output), &view_json(output)),
        }
    }

    pub fn download(&self, outcome: &DownloadOutcome) -> anyhow::Result<()> {
        let text = format!(
            "Downloaded {} to {}",
            plural(outcome.files, "file"),
            outcome.destination.display()
        );
        self.emit(
            &text,
            &json!({
                "destination": outcome.destination,
                "files": outcome.files,
            }),
        )
    }

    pub fn remote(&self, listing: &RemoteListing) -> anyhow::Result<()> {
        self.warnings(&listing.warnings);
        self.emit(
            &render_remote(listing),
            &json!({
                "repo": listing.repo.to_string(),
                "skills": listing.skills,
                "warnings": listing.warnings,
            }),
        )
    }

    pub fn undo(&self, outcome: &UndoOutcome) -> anyhow::Result<()> {
        let text = format!("Reverted {} {}", short(&outcome.hash), outcome.subject);
        self.emit(
            &text,
            &json!({ "hash": outcome.hash, "subject": outcome.subject }),
        )
    }

    pub fn history(&self, entries: &[HistoryEntry]) -> anyhow::Result<()> {
        self.emit(&render_history(entries), entries)
    }
}

// ============================================================================
// Text rendering
// ============================================================================

fn short(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

fn render_skills(skills: &[LocalSkill]) -> String {
    if skills.is_empty() {
        return "No skills installed. Create one with `skillbox init <name>`.".to_string();
    }

    let width = skills.iter().map(|s| s.folder.len()).max().unwrap_or(0) + 1;
    skills
        .iter()
        .map(|s| {
            let handle = format!("@{}", s.folder);
            let mut line = format!("{:<width$}  {}", handle, s.description, width = width);
            if s.name != s.folder {
                line.push_str(&format!(" (name: {})", s.name));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_report(report: &MutationReport) -> String {
    let mut lines = Vec::new();
    if !report.migrated.is_empty() {
        lines.push(format!(
            "Started version control; recorded {} as the baseline: {}",
            plural(report.migrated.len(), "existing skill"),
            report.migrated.join(", ")
        ));
    }

    match &report.commit {
        CommitOutcome::Committed { hash } => {
            lines.push(format!("{} [{}]", report.summary, short(hash)))
        }
        CommitOutcome::NothingToCommit | CommitOutcome::Skipped { .. } => {
            lines.push(report.summary.clone())
        }
    }
    lines.join("\n")
}

fn render_entry(entry: &ViewEntry) -> String {
    if entry.is_dir {
        format!("{}/", entry.name)
    } else {
        format!("{}  ({})", entry.name, plural(entry.size as usize, "byte"))
    }
}

fn render_view(output: &ViewOutput) -> String {
    match output {
        ViewOutput::Text(text) => text.clone(),
        ViewOutput::Directory(entries) if entries.is_empty() => "(empty directory)".to_string(),
        ViewOutput::Directory(entries) => entries
            .iter()
            .map(render_entry)
            .collect::<Vec<_>>()
            .join("\n"),
        ViewOutput::Binary { path, size } => format!(
            "Binary file {} ({}), not shown. Use `skillbox download` to copy it out.",
            path.display(),
            plural(*size as usize, "byte")
        ),
    }
}

fn render_remote(listing: &RemoteListing) -> String {
    if listing.skills.is_empty() {
        return format!("No skills found in {}", listing.repo);
    }

    let mut lines = vec![format!(
        "{} in {}:",
        plural(listing.skills.len(), "skill"),
        listing.repo
    )];
    for skill in &listing.skills {
        lines.push(format!("  {}", skill.reference));
        lines.push(format!("      {}", skill.description));
    }
    lines.join("\n")
}

fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history".to_string();
    }

    entries
        .iter()
        .map(|e| {
            format!(
                "{} {} {}",
                e.short_hash(),
                e.formatted_timestamp(),
                e.subject
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// JSON
// ============================================================================

fn report_json(report: &MutationReport) -> Value {
    let commit = match &report.commit {
        CommitOutcome::Committed { hash } => json!({ "status": "committed", "hash": hash }),
        CommitOutcome::NothingToCommit => json!({ "status": "nothing-to-commit" }),
        CommitOutcome::Skipped { warning } => json!({ "status": "skipped", "warning": warning }),
    };
    json!({
        "summary": report.summary,
        "commit": commit,
        "migrated": report.migrated,
        "warnings": report.warnings,
    })
}

fn view_json(output: &ViewOutput) -> Value {
    match output {
        ViewOutput::Text(text) => json!({ "kind": "text", "content": text }),
        ViewOutput::Directory(entries) => json!({
            "kind": "directory",
            "entries": entries
                .iter()
                .map(|e| json!({ "name": e.name, "isDir": e.is_dir, "size": e.size }))
                .collect::<Vec<_>>(),
        }),
        ViewOutput::Binary { path, size } => {
            json!({ "kind": "binary", "path": path, "size": size })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn report(commit: CommitOutcome, migrated: &[&str]) -> MutationReport {
        MutationReport {
            summary: "Created @pdf".to_string(),
            commit,
            migrated: migrated.iter().map(|s| s.to_string()).collect(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_render_report_with_baseline() {
        let text = render_report(&report(
            CommitOutcome::Committed {
                hash: "0123456789abcdef".to_string(),
            },
            &["alpha", "beta"],
        ));
        assert_eq!(
            text,
            "Started version control; recorded 2 existing skills as the baseline: alpha, beta\n\
             Created @pdf [0123456]"
        );
    }

    #[test]
    fn test_report_json_status() {
        let value = report_json(&report(
            CommitOutcome::Skipped {
                warning: "git not found".to_string(),
            },
            &[],
        ));
        assert_eq!(value["commit"]["status"], "skipped");
        assert_eq!(value["commit"]["warning"], "git not found");
        assert_eq!(render_report(&report(CommitOutcome::NothingToCommit, &[])), "Created @pdf");
    }

    #[test]
    fn test_render_skills() {
        let skills = vec![
            LocalSkill {
                folder: "a".to_string(),
                name: "a".to_string(),
                description: "First".to_string(),
                path: PathBuf::from("/s/a"),
            },
            LocalSkill {
                folder: "long-name".to_string(),
                name: "Other".to_string(),
                description: "Second".to_string(),
                path: PathBuf::from("/s/long-name"),
            },
        ];
        let text = render_skills(&skills);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "@a          First");
        assert_eq!(lines[1], "@long-name  Second (name: Other)");
        assert!(render_skills(&[]).starts_with("No skills installed"));
    }

    #[test]
    fn test_render_view_directory_and_binary() {
        let listing = ViewOutput::Directory(vec![
            ViewEntry {
                name: "scripts".to_string(),
                is_dir: true,
                size: 0,
            },
            ViewEntry {
                name: "SKILL.md".to_string(),
                is_dir: false,
                size: 1,
            },
        ]);
        assert_eq!(render_view(&listing), "scripts/\nSKILL.md  (1 byte)");

        let binary = ViewOutput::Binary {
            path: PathBuf::from("logo.png"),
            size: 2048,
        };
        assert!(render_view(&binary).starts_with("Binary file logo.png (2048 bytes)"));
        assert_eq!(view_json(&binary)["kind"], "binary");
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short("abc"), "abc");
        assert_eq!(short("0123456789"), "0123456");
        assert_eq!(render_history(&[]), "No history");
    }
}
