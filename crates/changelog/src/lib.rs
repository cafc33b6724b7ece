//! Towncrier changelog model, parser and ordering checks.

pub mod entry;
pub mod errors;
pub mod parser;
pub mod render;
pub mod validation;

pub use entry::{next_version, Bump, Changelog, ChangelogEntry};
pub use errors::{ChangelogError, ChangelogResult, OrderingError};
pub use parser::{parse, parse_file};
pub use render::{insert_entry, render, render_entry, write_file};
pub use validation::{category_warnings, validate};
