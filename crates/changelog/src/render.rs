//! Changelog rendering and entry insertion.

use crate::entry::{Changelog, ChangelogEntry};
use crate::errors::{ChangelogError, ChangelogResult};
use crate::validation::validate;
use std::fs;
use std::path::Path;
use tracing::info;

/// Render one release in towncrier layout.
pub fn render_entry(entry: &ChangelogEntry) -> String {
    let mut out = format!("# {}\n\n", entry.heading());
    for (category, notes) in &entry.sections {
        out.push_str(&format!("### {}\n\n", category));
        for note in notes {
            out.push_str(&format!("- {}\n", note));
        }
        out.push('\n');
    }
    out
}

/// Render a whole changelog document.
pub fn render(changelog: &Changelog) -> String {
    let body = changelog
        .entries
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = String::new();
    if !changelog.preamble.is_empty() {
        out.push_str(&changelog.preamble);
        out.push_str("\n\n");
    }
    out.push_str(&body);

    let mut out = out.trim_end().to_string();
    out.push('\n');
    out
}

/// Insert a new release right after the start marker.
///
/// The entry must sort above the current head, so the document stays
/// newest first.
pub fn insert_entry(changelog: &mut Changelog, entry: ChangelogEntry) -> ChangelogResult<()> {
    if !changelog.has_marker {
        return Err(ChangelogError::MissingMarker {
            marker: changelog.start_marker.clone(),
        });
    }

    if let Some(head) = changelog.head() {
        validate(&[entry.clone(), head.clone()])?;
    }

    info!(
        "Inserting {} after {}",
        entry.heading(),
        changelog.start_marker
    );
    changelog.entries.insert(0, entry);
    Ok(())
}

/// Write a rendered changelog to disk.
pub fn write_file(path: &Path, changelog: &Changelog) -> ChangelogResult<()> {
    fs::write(path, render(changelog))?;
    Ok(())
}
