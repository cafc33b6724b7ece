//! Checking catalog entities against their blueprint.

use crate::model::{Blueprint, ItemsDefinition, Property, PropertyFormat, PropertyType};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;
use thiserror::Error;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// An instance of a blueprint, as ingested into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Blueprint identifier, when the entity names it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    /// Relation name to related identifier(s).
    #[serde(default)]
    pub relations: IndexMap<String, Value>,
}

/// What is wrong with an entity field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityViolationKind {
    #[error("property is not declared by the blueprint")]
    UnknownProperty,

    #[error("relation is not declared by the blueprint")]
    UnknownRelation,

    #[error("required property is missing")]
    MissingRequiredProperty,

    #[error("required relation has no related entity")]
    MissingRequiredRelation,

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: PropertyType,
        found: &'static str,
    },

    #[error("`{value}` is not a valid {format}")]
    InvalidFormat {
        format: PropertyFormat,
        value: String,
    },

    #[error("`{value}` is not one of the enum values")]
    NotInEnum { value: String },

    #[error("expected {}", relation_shape(.many))]
    InvalidRelationValue { many: bool },

    #[error("entity names blueprint `{found}`")]
    BlueprintMismatch { found: String },
}

/// One problem with one field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityViolation {
    /// `properties.<name>`, `relations.<name>` or `blueprint`.
    pub field: String,
    pub kind: EntityViolationKind,
}

impl fmt::Display for EntityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

/// The entity does not conform to its blueprint.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Entity `{entity}` does not match blueprint `{blueprint}`: {}", join(.violations))]
pub struct EntityError {
    pub entity: String,
    pub blueprint: String,
    pub violations: Vec<EntityViolation>,
}

fn relation_shape(many: &bool) -> &'static str {
    if *many {
        "an array of identifiers"
    } else {
        "a single identifier or null"
    }
}

fn join(violations: &[EntityViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check an entity's properties and relations against a blueprint.
pub fn validate_entity(blueprint: &Blueprint, entity: &Entity) -> Result<(), EntityError> {
    let mut violations = Vec::new();
    let mut push = |field: String, kind: EntityViolationKind| {
        violations.push(EntityViolation { field, kind });
    };

    if let Some(named) = &entity.blueprint {
        if named != &blueprint.identifier {
            push(
                "blueprint".to_string(),
                EntityViolationKind::BlueprintMismatch {
                    found: named.clone(),
                },
            );
        }
    }

    for (name, value) in &entity.properties {
        let field = format!("properties.{}", name);
        match blueprint.property(name) {
            None => push(field, EntityViolationKind::UnknownProperty),
            Some(_) if value.is_null() => {}
            Some(property) => {
                if let Err(kind) = check_property(property, value) {
                    push(field, kind);
                }
            }
        }
    }

    for name in blueprint.schema.required() {
        let present = entity
            .properties
            .get(name)
            .map(|v| !v.is_null())
            .unwrap_or(false);
        if !present {
            push(
                format!("properties.{}", name),
                EntityViolationKind::MissingRequiredProperty,
            );
        }
    }

    for (name, value) in &entity.relations {
        let field = format!("relations.{}", name);
        let Some(relation) = blueprint.relation(name) else {
            push(field, EntityViolationKind::UnknownRelation);
            continue;
        };

        let well_formed = match value {
            Value::Null => true,
            Value::String(_) => !relation.many,
            Value::Array(items) => relation.many && items.iter().all(Value::is_string),
            _ => false,
        };
        if !well_formed {
            push(
                field,
                EntityViolationKind::InvalidRelationValue {
                    many: relation.many,
                },
            );
        }
    }

    for (name, relation) in blueprint.relations() {
        if !relation.required {
            continue;
        }
        let related = match entity.relations.get(name) {
            Some(Value::String(_)) => true,
            Some(Value::Array(items)) => !items.is_empty(),
            _ => false,
        };
        if !related {
            push(
                format!("relations.{}", name),
                EntityViolationKind::MissingRequiredRelation,
            );
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(EntityError {
            entity: entity.identifier.clone(),
            blueprint: blueprint.identifier.clone(),
            violations,
        })
    }
}

fn check_property(property: &Property, value: &Value) -> Result<(), EntityViolationKind> {
    check_value(property.property_type, property.format, value)?;

    if let (Some(values), Some(actual)) = (&property.enum_values, value.as_str()) {
        if !values.iter().any(|v| v == actual) {
            return Err(EntityViolationKind::NotInEnum {
                value: actual.to_string(),
            });
        }
    }

    if let (Some(items), Some(elements)) = (&property.items, value.as_array()) {
        check_items(items, elements)?;
    }

    Ok(())
}

fn check_items(items: &ItemsDefinition, elements: &[Value]) -> Result<(), EntityViolationKind> {
    for element in elements {
        check_value(items.item_type, items.format, element)?;
    }
    Ok(())
}

fn check_value(
    expected: PropertyType,
    format: Option<PropertyFormat>,
    value: &Value,
) -> Result<(), EntityViolationKind> {
    let matches = match expected {
        PropertyType::String => value.is_string(),
        PropertyType::Number => value.is_number(),
        PropertyType::Boolean => value.is_boolean(),
        PropertyType::Object => value.is_object(),
        PropertyType::Array => value.is_array(),
    };
    if !matches {
        return Err(EntityViolationKind::TypeMismatch {
            expected,
            found: json_type_name(value),
        });
    }

    match (format, value.as_str()) {
        (Some(format), Some(text)) if !format_matches(format, text) => {
            Err(EntityViolationKind::InvalidFormat {
                format,
                value: text.to_string(),
            })
        }
        _ => Ok(()),
    }
}

fn format_matches(format: PropertyFormat, text: &str) -> bool {
    match format {
        PropertyFormat::DateTime | PropertyFormat::Timer => {
            chrono::DateTime::parse_from_rfc3339(text).is_ok()
        }
        PropertyFormat::Url => URL_PATTERN.is_match(text),
        PropertyFormat::Email | PropertyFormat::User => EMAIL_PATTERN.is_match(text),
        PropertyFormat::Ipv4 => text.parse::<Ipv4Addr>().is_ok(),
        PropertyFormat::Ipv6 => text.parse::<Ipv6Addr>().is_ok(),
        // Free-form content
        PropertyFormat::Markdown
        | PropertyFormat::Yaml
        | PropertyFormat::Team
        | PropertyFormat::Proto => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argocd::{argocd_blueprints, ARGOCD_APPLICATION, ARGOCD_PROJECT};
    use serde_json::json;

    fn application() -> Blueprint {
        argocd_blueprints()
            .unwrap()
            .into_iter()
            .find(|b| b.identifier == ARGOCD_APPLICATION)
            .unwrap()
    }

    fn entity(raw: Value) -> Entity {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_valid_application() {
        let app = entity(json!({
            "identifier": "guestbook",
            "title": "guestbook",
            "blueprint": "argocdApplication",
            "properties": {
                "gitRepo": "https://github.com/argoproj/argocd-example-apps",
                "gitPath": "guestbook",
                "syncStatus": "Synced",
                "healthStatus": "Healthy",
                "createdAt": "2024-03-03T10:15:00Z",
                "labels": {"team": "platform"},
                "syncedImages": ["gcr.io/heptio-images/ks-guestbook-demo:0.2"],
                "revision": null
            },
            "relations": {"project": "default"}
        }));
        assert!(validate_entity(&application(), &app).is_ok());
    }

    #[test]
    fn test_value_outside_enum() {
        let app = entity(json!({
            "identifier": "guestbook",
            "properties": {"syncStatus": "Pruned"}
        }));
        let err = validate_entity(&application(), &app).unwrap_err();
        assert_eq!(err.violations[0].field, "properties.syncStatus");
        assert_eq!(
            err.violations[0].kind,
            EntityViolationKind::NotInEnum {
                value: "Pruned".to_string()
            }
        );
    }

    #[test]
    fn test_format_and_type_checks() {
        let app = entity(json!({
            "identifier": "guestbook",
            "properties": {
                "gitRepo": "not a url",
                "createdAt": "yesterday",
                "labels": "team=platform",
                "syncedImages": [1, 2]
            }
        }));
        let err = validate_entity(&application(), &app).unwrap_err();
        let fields: Vec<_> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "properties.createdAt",
                "properties.gitRepo",
                "properties.labels",
                "properties.syncedImages"
            ]
        );
        assert_eq!(
            err.violations[2].kind,
            EntityViolationKind::TypeMismatch {
                expected: PropertyType::Object,
                found: "string"
            }
        );
    }

    #[test]
    fn test_unknown_fields_and_relation_shape() {
        let app = entity(json!({
            "identifier": "guestbook",
            "blueprint": "argocdProject",
            "properties": {"color": "blue"},
            "relations": {"project": ["default"], "owner": "team-a"}
        }));
        let err = validate_entity(&application(), &app).unwrap_err();
        let kinds: Vec<_> = err.violations.iter().map(|v| v.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                EntityViolationKind::BlueprintMismatch {
                    found: ARGOCD_PROJECT.to_string()
                },
                EntityViolationKind::UnknownProperty,
                EntityViolationKind::UnknownRelation,
                EntityViolationKind::InvalidRelationValue { many: false },
            ]
        );
        assert!(err.to_string().contains("guestbook"));
    }

    #[test]
    fn test_required_fields() {
        let mut blueprint = application();
        blueprint.schema.required = Some(vec!["syncStatus".to_string()]);
        if let Some(relations) = blueprint.relations.as_mut() {
            relations.get_mut("project").unwrap().required = true;
        }

        let app = entity(json!({"identifier": "guestbook", "relations": {"project": null}}));
        let err = validate_entity(&blueprint, &app).unwrap_err();
        let kinds: Vec<_> = err.violations.iter().map(|v| v.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                EntityViolationKind::MissingRequiredProperty,
                EntityViolationKind::MissingRequiredRelation,
            ]
        );
    }

    #[test]
    fn test_ip_formats() {
        assert!(format_matches(PropertyFormat::Ipv4, "10.0.0.1"));
        assert!(!format_matches(PropertyFormat::Ipv4, "10.0.0.256"));
        assert!(format_matches(PropertyFormat::Ipv6, "::1"));
        assert!(format_matches(PropertyFormat::Email, "dev@example.com"));
        assert!(!format_matches(PropertyFormat::Email, "dev@"));
    }
}
