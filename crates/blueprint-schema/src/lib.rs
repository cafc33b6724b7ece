//! Blueprint schema definitions for the ArgoCD catalog integration.
//!
//! This crate loads blueprint documents, checks them for integrity, and
//! orders them for registration with a catalog backend.

pub mod argocd;
pub mod entity;
pub mod loader;
pub mod model;
pub mod ordering;
pub mod schema;
pub mod validation;

pub use argocd::argocd_blueprints;
pub use entity::{validate_entity, Entity, EntityError, EntityViolation, EntityViolationKind};
pub use loader::{load, load_file, load_with_format, to_json, DocumentFormat, LoadError};
pub use model::{
    Blueprint, BlueprintSchema, ItemsDefinition, Property, PropertyFormat, PropertyType, Relation,
};
pub use ordering::{resolve_order, DeferredRelation, RegistrationPlan};
pub use validation::{
    validate, validate_with, SchemaIntegrityError, ValidationReport, Violation, ViolationKind,
};
