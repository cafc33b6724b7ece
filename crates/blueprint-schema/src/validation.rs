//! Cross-blueprint integrity checks.

use crate::model::{Blueprint, Property};
use argocd_catalog_common::BlueprintSettings;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Colors the catalog UI can render for enum values.
pub const ENUM_COLOR_PALETTE: &[&str] = &[
    "blue",
    "turquoise",
    "orange",
    "purple",
    "pink",
    "yellow",
    "green",
    "red",
    "gold",
    "silver",
    "paleBlue",
    "darkGray",
    "lightGray",
    "bronze",
    "lime",
    "olive",
    "brown",
];

/// What is wrong with a blueprint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    #[error("identifier is declared more than once")]
    DuplicateIdentifier,

    #[error("relation target `{target}` is not a declared blueprint")]
    DanglingTarget { target: String },

    #[error("enum value `{value}` has no entry in enumColors")]
    EnumColorMissing { value: String },

    #[error("enumColors entry `{value}` is not an enum value")]
    EnumColorExtra { value: String },

    #[error("enumColors is set but enum is not")]
    EnumColorsWithoutEnum,

    #[error("enum value `{value}` is listed more than once")]
    DuplicateEnumValue { value: String },

    #[error("required property `{property}` is not declared")]
    UnknownRequiredProperty { property: String },

    #[error("required property `{property}` is listed more than once")]
    DuplicateRequiredProperty { property: String },
}

/// A single integrity violation, located by blueprint and field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub blueprint: String,
    /// Dotted path of the offending field, e.g. `schema.properties.syncStatus`.
    pub field: String,
    pub kind: ViolationKind,
}

impl Violation {
    fn new(blueprint: &str, field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            blueprint: blueprint.to_string(),
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blueprint `{}` at {}: {}", self.blueprint, self.field, self.kind)
    }
}

/// The document parsed but violates an integrity invariant.
///
/// [`validate`] only returns it with at least one violation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Schema integrity error: {}", summarize(.violations))]
pub struct SchemaIntegrityError {
    pub violations: Vec<Violation>,
}

impl SchemaIntegrityError {
    /// The first violation found.
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no violations".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Result of a successful validation.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ValidationReport {
    /// Number of blueprints checked.
    pub blueprints: usize,
    /// Number of relations checked.
    pub relations: usize,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Validate a batch of blueprints with default settings.
pub fn validate(blueprints: &[Blueprint]) -> Result<ValidationReport, SchemaIntegrityError> {
    validate_with(blueprints, &BlueprintSettings::default())
}

/// Validate a batch of blueprints.
///
/// Every violation in the batch is collected; the batch is accepted only
/// if there are none.
pub fn validate_with(
    blueprints: &[Blueprint],
    settings: &BlueprintSettings,
) -> Result<ValidationReport, SchemaIntegrityError> {
    let mut violations = Vec::new();
    let mut report = ValidationReport {
        blueprints: blueprints.len(),
        ..Default::default()
    };

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for blueprint in blueprints {
        let count = seen.entry(blueprint.identifier.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            violations.push(Violation::new(
                &blueprint.identifier,
                "identifier",
                ViolationKind::DuplicateIdentifier,
            ));
        }
    }

    for blueprint in blueprints {
        for (name, relation) in blueprint.relations() {
            report.relations += 1;
            if !seen.contains_key(relation.target.as_str()) {
                violations.push(Violation::new(
                    &blueprint.identifier,
                    format!("relations.{}.target", name),
                    ViolationKind::DanglingTarget {
                        target: relation.target.clone(),
                    },
                ));
            }
        }

        for (name, property) in &blueprint.schema.properties {
            let field = format!("schema.properties.{}", name);
            check_enum(blueprint, &field, property, &mut violations);
            warn_unknown_colors(blueprint, &field, property, settings, &mut report);
        }

        let mut required_seen = HashSet::new();
        for property in blueprint.schema.required() {
            if !blueprint.schema.properties.contains_key(property) {
                violations.push(Violation::new(
                    &blueprint.identifier,
                    "schema.required",
                    ViolationKind::UnknownRequiredProperty {
                        property: property.clone(),
                    },
                ));
            }
            if !required_seen.insert(property.as_str()) {
                violations.push(Violation::new(
                    &blueprint.identifier,
                    "schema.required",
                    ViolationKind::DuplicateRequiredProperty {
                        property: property.clone(),
                    },
                ));
            }
        }
    }

    let error = SchemaIntegrityError { violations };
    if let Some(first) = error.first() {
        debug!(
            "Blueprint validation found {} violations, first: {}",
            error.violations.len(),
            first
        );
        return Err(error);
    }

    info!(
        "Validated {} blueprints with {} relations",
        report.blueprints, report.relations
    );
    Ok(report)
}

/// `enumColors` keys must be exactly the enum values.
fn check_enum(
    blueprint: &Blueprint,
    field: &str,
    property: &Property,
    violations: &mut Vec<Violation>,
) {
    let identifier = &blueprint.identifier;
    let colors = property.enum_colors.as_ref();

    let Some(values) = &property.enum_values else {
        if colors.is_some() {
            violations.push(Violation::new(
                identifier,
                format!("{}.enumColors", field),
                ViolationKind::EnumColorsWithoutEnum,
            ));
        }
        return;
    };

    let mut unique = HashSet::new();
    for value in values {
        if !unique.insert(value.as_str()) {
            violations.push(Violation::new(
                identifier,
                format!("{}.enum", field),
                ViolationKind::DuplicateEnumValue {
                    value: value.clone(),
                },
            ));
        }
    }

    // A missing enumColors map is treated as an empty one.
    let empty = Default::default();
    let colors = colors.unwrap_or(&empty);

    for value in values {
        if !colors.contains_key(value) && unique.remove(value.as_str()) {
            violations.push(Violation::new(
                identifier,
                format!("{}.enumColors", field),
                ViolationKind::EnumColorMissing {
                    value: value.clone(),
                },
            ));
        }
    }

    for key in colors.keys() {
        if !values.contains(key) {
            violations.push(Violation::new(
                identifier,
                format!("{}.enumColors", field),
                ViolationKind::EnumColorExtra { value: key.clone() },
            ));
        }
    }
}

fn warn_unknown_colors(
    blueprint: &Blueprint,
    field: &str,
    property: &Property,
    settings: &BlueprintSettings,
    report: &mut ValidationReport,
) {
    let Some(colors) = &property.enum_colors else {
        return;
    };

    for (value, color) in colors {
        let known = ENUM_COLOR_PALETTE.contains(&color.as_str())
            || settings.extra_enum_colors.iter().any(|c| c == color);
        if !known {
            report.add_warning(format!(
                "blueprint `{}` at {}.enumColors: color `{}` for `{}` is not in the catalog palette",
                blueprint.identifier, field, color, value
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn blueprints(doc: serde_json::Value) -> Vec<Blueprint> {
        load(&doc.to_string()).unwrap()
    }

    fn sample() -> serde_json::Value {
        json!([
            {
                "identifier": "argocdCluster",
                "schema": {"properties": {"server": {"type": "string", "format": "url"}}, "required": []},
                "relations": {}
            },
            {
                "identifier": "argocdProject",
                "schema": {"properties": {}, "required": []},
                "relations": {
                    "cluster": {"target": "argocdCluster", "required": false, "many": true}
                }
            },
            {
                "identifier": "argocdApplication",
                "schema": {
                    "properties": {
                        "syncStatus": {
                            "type": "string",
                            "enum": ["Synced", "OutOfSync", "Unknown"],
                            "enumColors": {"Synced": "green", "OutOfSync": "red", "Unknown": "lightGray"}
                        }
                    },
                    "required": []
                },
                "relations": {
                    "project": {"target": "argocdProject", "required": false, "many": false}
                }
            }
        ])
    }

    #[test]
    fn test_valid_document() {
        let report = validate(&blueprints(sample())).unwrap();
        assert_eq!(report.blueprints, 3);
        assert_eq!(report.relations, 2);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_removing_referenced_blueprint_fails() {
        let mut doc = sample();
        doc.as_array_mut().unwrap().remove(0);

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(
            err.first(),
            Some(&Violation {
                blueprint: "argocdProject".to_string(),
                field: "relations.cluster.target".to_string(),
                kind: ViolationKind::DanglingTarget {
                    target: "argocdCluster".to_string()
                },
            })
        );
    }

    #[test]
    fn test_duplicate_identifier_fails() {
        let mut doc = sample();
        let copy = doc[0].clone();
        doc.as_array_mut().unwrap().push(copy);

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.first().unwrap().blueprint, "argocdCluster");
        assert_eq!(err.first().unwrap().kind, ViolationKind::DuplicateIdentifier);
    }

    #[test]
    fn test_enum_colors_missing_value_fails() {
        let mut doc = sample();
        doc[2]["schema"]["properties"]["syncStatus"]["enumColors"] =
            json!({"Synced": "green", "OutOfSync": "red"});

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(
            err.first().unwrap().kind,
            ViolationKind::EnumColorMissing {
                value: "Unknown".to_string()
            }
        );
        assert_eq!(err.first().unwrap().field, "schema.properties.syncStatus.enumColors");
        assert!(err.to_string().contains("argocdApplication"));
    }

    #[test]
    fn test_enum_colors_extra_value_fails() {
        let mut doc = sample();
        doc[2]["schema"]["properties"]["syncStatus"]["enumColors"]["Pruned"] = json!("blue");

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(
            err.first().unwrap().kind,
            ViolationKind::EnumColorExtra {
                value: "Pruned".to_string()
            }
        );
    }

    #[test]
    fn test_enum_without_colors_reports_every_value() {
        let mut doc = sample();
        doc[2]["schema"]["properties"]["syncStatus"]
            .as_object_mut()
            .unwrap()
            .remove("enumColors");

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(err.violations.len(), 3);
    }

    #[test]
    fn test_colors_without_enum_fails() {
        let mut doc = sample();
        doc[0]["schema"]["properties"]["server"]["enumColors"] = json!({"a": "red"});

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(err.first().unwrap().kind, ViolationKind::EnumColorsWithoutEnum);
    }

    #[test]
    fn test_duplicate_enum_value_fails() {
        let mut doc = sample();
        doc[2]["schema"]["properties"]["syncStatus"]["enum"] =
            json!(["Synced", "OutOfSync", "Unknown", "Synced"]);

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(
            err.first().unwrap().kind,
            ViolationKind::DuplicateEnumValue {
                value: "Synced".to_string()
            }
        );
        assert_eq!(err.violations.len(), 1);
    }

    #[test]
    fn test_unknown_required_property_fails() {
        let mut doc = sample();
        doc[0]["schema"]["required"] = json!(["server", "version"]);

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(
            err.first().unwrap().kind,
            ViolationKind::UnknownRequiredProperty {
                property: "version".to_string()
            }
        );
        assert_eq!(err.first().unwrap().field, "schema.required");
    }

    #[test]
    fn test_all_violations_collected() {
        let mut doc = sample();
        doc.as_array_mut().unwrap().remove(0);
        doc[1]["schema"]["required"] = json!(["missing"]);

        let err = validate(&blueprints(doc)).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert_eq!(
            err.violations
                .iter()
                .filter(|v| v.blueprint == "argocdApplication")
                .count(),
            1
        );
        assert!(err.to_string().contains("(and 1 more)"));
    }

    #[test]
    fn test_empty_integrity_error_has_no_first() {
        let err = SchemaIntegrityError { violations: vec![] };
        assert_eq!(err.first(), None);
        assert_eq!(err.to_string(), "Schema integrity error: no violations");
    }

    #[test]
    fn test_unknown_color_is_warning() {
        let mut doc = sample();
        doc[2]["schema"]["properties"]["syncStatus"]["enumColors"]["Unknown"] = json!("magenta");

        let report = validate(&blueprints(doc.clone())).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("magenta"));

        let settings = BlueprintSettings {
            extra_enum_colors: vec!["magenta".to_string()],
        };
        let report = validate_with(&blueprints(doc), &settings).unwrap();
        assert!(report.warnings.is_empty());
    }
}
