//! Common utilities and types shared across the catalog crates.

pub mod config;
pub mod error;
pub mod hash;

pub use config::{BlueprintSettings, CatalogConfig, ChangelogSettings};
pub use error::{Error, Result};
