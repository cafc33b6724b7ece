use chrono::NaiveDate;
use semver::Version;
use thiserror::Error;

/// Entries are not listed newest first.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderingError {
    #[error("entry {position}: version {version} must be lower than the entry above it ({predecessor})")]
    VersionNotDecreasing {
        position: usize,
        version: Version,
        predecessor: Version,
    },

    #[error("entry {position}: version {version} is dated {date}, after the entry above it ({predecessor}, {predecessor_date})")]
    DateAfterPredecessor {
        position: usize,
        version: Version,
        date: NaiveDate,
        predecessor: Version,
        predecessor_date: NaiveDate,
    },
}

impl OrderingError {
    /// Version of the misplaced entry.
    pub fn version(&self) -> &Version {
        match self {
            OrderingError::VersionNotDecreasing { version, .. }
            | OrderingError::DateAfterPredecessor { version, .. } => version,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("line {line}: `{category}` appears twice in the same release")]
    DuplicateCategory { line: usize, category: String },

    #[error("line {line}: category heading before any release heading")]
    CategoryOutsideRelease { line: usize },

    #[error("line {line}: invalid date `{date}`: {source}")]
    InvalidDate {
        line: usize,
        date: String,
        source: chrono::ParseError,
    },

    #[error("line {line}: invalid version `{version}`: {source}")]
    InvalidVersion {
        line: usize,
        version: String,
        source: semver::Error,
    },

    #[error("line {line}: malformed release heading `{text}`")]
    MalformedHeading { line: usize, text: String },

    #[error("changelog has no `{marker}` line to insert entries after")]
    MissingMarker { marker: String },

    #[error("line {line}: note before any category heading")]
    NoteOutsideCategory { line: usize },

    #[error(transparent)]
    Ordering(#[from] OrderingError),

    #[error(transparent)]
    Read(#[from] argocd_catalog_common::Error),

    #[error("line {line}: unexpected text `{text}`")]
    UnexpectedLine { line: usize, text: String },

    /// Error that may occur while I/O operations.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

pub type ChangelogResult<T> = Result<T, ChangelogError>;
