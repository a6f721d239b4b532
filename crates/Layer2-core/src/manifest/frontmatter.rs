//! SKILL.md frontmatter
//!
//! Parsing is tolerant: a missing, unterminated or malformed header reads as
//! an empty one. Rewriting works on the raw lines so everything the caller
//! did not ask to change survives byte-for-byte.

use lazy_static::lazy_static;
use regex::Regex;
use serde_yaml::{Mapping, Value};

lazy_static! {
    static ref TOP_LEVEL_KEY: Regex = Regex::new(r#"^([^\s#\-][^:]*):(\s|$)"#).unwrap();
    static ref BARE_SCALAR: Regex = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_ .-]*$").unwrap();
}

const DELIMITER: &str = "---";

/// Line terminator convention of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    fn detect(content: &str) -> Self {
        if content.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Header lines kept verbatim (terminators included) plus their parsed form
#[derive(Debug, Clone)]
struct Header {
    open: String,
    lines: Vec<String>,
    close: String,
    fields: Mapping,
}

/// A manifest split into header and body
#[derive(Debug, Clone)]
pub struct Manifest {
    header: Option<Header>,
    body: String,
    line_ending: LineEnding,
}

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

impl Manifest {
    /// Split `content` into header and body; never fails
    pub fn parse(content: &str) -> Self {
        let line_ending = LineEnding::detect(content);
        let lines: Vec<&str> = content.split_inclusive('\n').collect();

        let headerless = || Self {
            header: None,
            body: content.to_string(),
            line_ending,
        };

        if lines.first().map(|l| strip_terminator(l)) != Some(DELIMITER) {
            return headerless();
        }

        let Some(end) = lines
            .iter()
            .skip(1)
            .position(|l| strip_terminator(l) == DELIMITER)
            .map(|i| i + 1)
        else {
            return headerless();
        };

        let yaml: String = lines[1..end].concat();
        let fields = match serde_yaml::from_str::<Value>(&yaml) {
            Ok(Value::Mapping(mapping)) => mapping,
            _ => Mapping::new(),
        };

        Self {
            header: Some(Header {
                open: lines[0].to_string(),
                lines: lines[1..end].iter().map(|l| l.to_string()).collect(),
                close: lines[end].to_string(),
                fields,
            }),
            body: lines[end + 1..].concat(),
            line_ending,
        }
    }

    pub fn has_header(&self) -> bool {
        self.header.is_some()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Everything after the closing delimiter (the whole file without header)
    pub fn body(&self) -> &str {
        &self.body
    }

    /// A header field rendered as text; empty strings count as absent
    pub fn field(&self, key: &str) -> Option<String> {
        let value = self.header.as_ref()?.fields.get(key)?;
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn name(&self) -> Option<String> {
        self.field("name")
    }

    pub fn description(&self) -> Option<String> {
        self.field("description")
    }

    /// First body line that is neither blank nor a markdown heading,
    /// truncated to `max_chars` characters
    pub fn first_paragraph_line(&self, max_chars: usize) -> Option<String> {
        self.body
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.chars().take(max_chars).collect())
    }

    /// Render the manifest with `name` set to `new_name`.
    ///
    /// `name` comes first; every other top-level entry keeps its original
    /// text and order. Body and line endings are untouched. A manifest
    /// without a header gains one holding only `name`.
    pub fn render_with_name(&self, new_name: &str) -> String {
        let le = self.line_ending.as_str();
        let name_line = format!("name: {}{}", yaml_scalar(new_name), le);

        let Some(header) = &self.header else {
            return format!("{DELIMITER}{le}{name_line}{DELIMITER}{le}{}", self.body);
        };

        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(&header.open);
        out.push_str(&name_line);

        for entry in split_entries(&header.lines) {
            if entry.key.as_deref() == Some("name") {
                continue;
            }
            for line in entry.lines {
                out.push_str(line);
            }
        }

        out.push_str(&header.close);
        out.push_str(&self.body);
        out
    }
}

/// One top-level header entry: its key line plus indented continuation lines
struct Entry<'a> {
    key: Option<String>,
    lines: Vec<&'a str>,
}

fn split_entries(lines: &[String]) -> Vec<Entry<'_>> {
    let mut entries: Vec<Entry<'_>> = Vec::new();

    for line in lines {
        let text = strip_terminator(line);
        match TOP_LEVEL_KEY.captures(text) {
            Some(caps) => {
                let key = caps[1].trim().trim_matches(|c| c == '"' || c == '\'');
                entries.push(Entry {
                    key: Some(key.to_string()),
                    lines: vec![line.as_str()],
                });
            }
            None => match entries.last_mut() {
                Some(entry) => entry.lines.push(line.as_str()),
                None => entries.push(Entry {
                    key: None,
                    lines: vec![line.as_str()],
                }),
            },
        }
    }

    entries
}

fn yaml_scalar(value: &str) -> String {
    if BARE_SCALAR.is_match(value) && !value.ends_with(' ') {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
