//! Towncrier changelog parser.

use crate::entry::{Changelog, ChangelogEntry};
use crate::errors::{ChangelogError, ChangelogResult};
use argocd_catalog_common::ChangelogSettings;
use chrono::NaiveDate;
use regex::Regex;
use semver::Version;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static RELEASE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^# (?P<project>\S.*?) (?P<version>\S+) \((?P<date>[^)]*)\)\s*$").unwrap()
});

static CATEGORY_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s+(?P<category>\S.*?)\s*$").unwrap());

static NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*]\s+(?P<text>\S.*?)\s*$").unwrap());

/// Parse a changelog from a file.
pub fn parse_file(path: &Path, settings: &ChangelogSettings) -> ChangelogResult<Changelog> {
    let text = argocd_catalog_common::error::read_to_string(path)?;
    parse(&text, settings)
}

/// Parse a towncrier-style changelog.
///
/// The preamble runs through the start marker line. Without a marker it
/// runs up to the first release heading.
pub fn parse(text: &str, settings: &ChangelogSettings) -> ChangelogResult<Changelog> {
    let lines: Vec<&str> = text.lines().collect();

    let marker_line = lines
        .iter()
        .position(|line| line.trim() == settings.start_marker);
    let body_start = match marker_line {
        Some(i) => i + 1,
        None => lines
            .iter()
            .position(|line| line.starts_with("# ") && RELEASE_HEADING.is_match(line))
            .unwrap_or(lines.len()),
    };

    let preamble = lines[..body_start].join("\n").trim_end().to_string();
    let mut changelog = Changelog {
        preamble,
        start_marker: settings.start_marker.clone(),
        has_marker: marker_line.is_some(),
        entries: Vec::new(),
    };

    let mut current: Option<ChangelogEntry> = None;
    let mut category: Option<String> = None;

    for (offset, raw) in lines[body_start..].iter().enumerate() {
        let line_no = body_start + offset + 1;
        let line = raw.trim_end();

        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("# ") {
            let caps = RELEASE_HEADING
                .captures(line)
                .ok_or_else(|| ChangelogError::MalformedHeading {
                    line: line_no,
                    text: line.to_string(),
                })?;

            let version_text = &caps["version"];
            let version =
                Version::parse(version_text).map_err(|source| ChangelogError::InvalidVersion {
                    line: line_no,
                    version: version_text.to_string(),
                    source,
                })?;

            let date_text = &caps["date"];
            let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|source| {
                ChangelogError::InvalidDate {
                    line: line_no,
                    date: date_text.to_string(),
                    source,
                }
            })?;

            if let Some(done) = current.take() {
                changelog.entries.push(done);
            }
            category = None;
            current = Some(ChangelogEntry::new(&caps["project"], version, date));
            continue;
        }

        if let Some(caps) = CATEGORY_HEADING.captures(line) {
            let entry = current
                .as_mut()
                .ok_or(ChangelogError::CategoryOutsideRelease { line: line_no })?;
            let name = caps["category"].to_string();
            if entry.sections.contains_key(&name) {
                return Err(ChangelogError::DuplicateCategory {
                    line: line_no,
                    category: name,
                });
            }
            entry.sections.insert(name.clone(), Vec::new());
            category = Some(name);
            continue;
        }

        if let Some(caps) = NOTE.captures(line) {
            let notes = match (current.as_mut(), category.as_ref()) {
                (Some(entry), Some(name)) => entry.sections.entry(name.clone()).or_default(),
                _ => return Err(ChangelogError::NoteOutsideCategory { line: line_no }),
            };
            notes.push(caps["text"].to_string());
            continue;
        }

        // Indented continuation of the previous note
        if raw.starts_with(char::is_whitespace) {
            let last = current
                .as_mut()
                .zip(category.as_ref())
                .and_then(|(entry, name)| entry.sections.get_mut(name))
                .and_then(|notes| notes.last_mut());
            if let Some(note) = last {
                note.push(' ');
                note.push_str(line.trim());
                continue;
            }
        }

        return Err(ChangelogError::UnexpectedLine {
            line: line_no,
            text: line.to_string(),
        });
    }

    if let Some(done) = current.take() {
        changelog.entries.push(done);
    }

    debug!("Parsed {} changelog entries", changelog.entries.len());
    Ok(changelog)
}
