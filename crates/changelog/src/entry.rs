//! Changelog entry model.

use chrono::NaiveDate;
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One release in the changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Project name from the release heading, e.g. `Port_Ocean`.
    pub project: String,
    pub version: Version,
    pub date: NaiveDate,
    /// Category label to notes, in document order.
    pub sections: IndexMap<String, Vec<String>>,
}

impl ChangelogEntry {
    pub fn new(project: impl Into<String>, version: Version, date: NaiveDate) -> Self {
        Self {
            project: project.into(),
            version,
            date,
            sections: IndexMap::new(),
        }
    }

    /// Append a note under a category, creating the category if needed.
    pub fn add_note(&mut self, category: impl Into<String>, note: impl Into<String>) -> &mut Self {
        self.sections
            .entry(category.into())
            .or_default()
            .push(note.into());
        self
    }

    /// Total number of notes across all categories.
    pub fn note_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn heading(&self) -> String {
        format!("{} {} ({})", self.project, self.version, self.date)
    }
}

/// A parsed changelog document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Changelog {
    /// Everything above the first release: title, prose, marker line.
    pub preamble: String,
    /// The insertion marker the document was parsed with.
    pub start_marker: String,
    /// Whether the preamble contains `start_marker`.
    pub has_marker: bool,
    /// Releases, newest first.
    pub entries: Vec<ChangelogEntry>,
}

impl Changelog {
    /// The most recent release.
    pub fn head(&self) -> Option<&ChangelogEntry> {
        self.entries.first()
    }

    /// The release with exactly this version.
    pub fn find(&self, version: &Version) -> Option<&ChangelogEntry> {
        self.entries.iter().find(|e| &e.version == version)
    }
}

/// Which version component a new release increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bump {
    #[default]
    Patch,
    Minor,
    Major,
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bump::Patch => write!(f, "patch"),
            Bump::Minor => write!(f, "minor"),
            Bump::Major => write!(f, "major"),
        }
    }
}

impl FromStr for Bump {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "patch" => Ok(Bump::Patch),
            "minor" => Ok(Bump::Minor),
            "major" => Ok(Bump::Major),
            _ => Err(format!("unknown bump `{}`, expected patch, minor or major", s)),
        }
    }
}

/// The version following `current`.
///
/// A pre-release of the bumped component is finalized rather than
/// incremented, so `0.2.0-beta.1` bumps to `0.2.0` at the same level.
pub fn next_version(current: &Version, bump: Bump) -> Version {
    let mut next = Version::new(current.major, current.minor, current.patch);
    if !current.pre.is_empty() {
        let finalizes = match bump {
            Bump::Patch => true,
            Bump::Minor => current.patch == 0,
            Bump::Major => current.patch == 0 && current.minor == 0,
        };
        if finalizes {
            return next;
        }
    }

    match bump {
        Bump::Patch => next.patch += 1,
        Bump::Minor => {
            next.minor += 1;
            next.patch = 0;
        }
        Bump::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
    }
    next
}
