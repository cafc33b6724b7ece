//! Changelog ordering and category checks.

use crate::entry::ChangelogEntry;
use crate::errors::OrderingError;
use argocd_catalog_common::ChangelogSettings;
use tracing::debug;

/// Check entries are newest first.
///
/// Versions must strictly decrease down the list. Dates must not increase;
/// equal dates are allowed since several releases can ship on one day.
pub fn validate(entries: &[ChangelogEntry]) -> Result<(), OrderingError> {
    for (position, pair) in entries.windows(2).enumerate() {
        let (above, entry) = (&pair[0], &pair[1]);

        if entry.version >= above.version {
            return Err(OrderingError::VersionNotDecreasing {
                position: position + 1,
                version: entry.version.clone(),
                predecessor: above.version.clone(),
            });
        }

        if entry.date > above.date {
            return Err(OrderingError::DateAfterPredecessor {
                position: position + 1,
                version: entry.version.clone(),
                date: entry.date,
                predecessor: above.version.clone(),
                predecessor_date: above.date,
            });
        }
    }

    debug!("Changelog ordering ok for {} entries", entries.len());
    Ok(())
}

/// Non-fatal findings: unknown categories and empty releases.
pub fn category_warnings(entries: &[ChangelogEntry], settings: &ChangelogSettings) -> Vec<String> {
    let mut warnings = Vec::new();
    for entry in entries {
        if entry.note_count() == 0 {
            warnings.push(format!("{} has no release notes", entry.version));
        }
        for category in entry.sections.keys() {
            if !settings.is_known_category(category) {
                warnings.push(format!(
                    "{} uses unknown category `{}`",
                    entry.version, category
                ));
            }
        }
    }
    warnings
}
