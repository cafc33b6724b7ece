//! Blueprint document loading.

use crate::model::{Blueprint, PropertyFormat, PropertyType};
use crate::schema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Load error type.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed blueprint document at {location}: {message}")]
    MalformedSchema { location: String, message: String },

    #[error(transparent)]
    Read(#[from] argocd_catalog_common::Error),
}

impl LoadError {
    fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::MalformedSchema {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Serialization of a blueprint document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension; anything but `.yaml`/`.yml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

/// Load a JSON blueprint document.
pub fn load(document: &str) -> Result<Vec<Blueprint>, LoadError> {
    load_with_format(document, DocumentFormat::Json)
}

/// Load a blueprint document file, picking the format from its extension.
pub fn load_file(path: &Path) -> Result<Vec<Blueprint>, LoadError> {
    let content = argocd_catalog_common::error::read_to_string(path)?;
    debug!("Loading blueprint document {:?}", path);
    load_with_format(&content, DocumentFormat::from_path(path))
}

/// Parse a blueprint document into the typed model.
///
/// The raw document is first checked against the structural schema so
/// errors carry a JSON pointer; typed deserialization then catches repeated
/// keys, and shape checks catch property entries whose fields contradict
/// their type. Nothing is returned unless every step succeeds.
pub fn load_with_format(
    document: &str,
    format: DocumentFormat,
) -> Result<Vec<Blueprint>, LoadError> {
    let raw: Value = parse(document, format)?;

    let structural =
        schema::check_document(&raw).map_err(|e| LoadError::malformed("schema", e))?;
    if let Some(first) = structural.first() {
        let message = if structural.len() > 1 {
            format!("{} (and {} more)", first.message, structural.len() - 1)
        } else {
            first.message.clone()
        };
        return Err(LoadError::malformed(first.location.clone(), message));
    }

    let blueprints: Vec<Blueprint> = parse(document, format)?;

    check_shapes(&blueprints)?;

    debug!("Loaded {} blueprints", blueprints.len());
    Ok(blueprints)
}

fn parse<T: DeserializeOwned>(document: &str, format: DocumentFormat) -> Result<T, LoadError> {
    let parsed = match format {
        DocumentFormat::Json => serde_json::from_str(document).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(document).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| LoadError::malformed("document", message))
}

/// Check that each property's optional fields fit its type.
fn check_shapes(blueprints: &[Blueprint]) -> Result<(), LoadError> {
    for (index, blueprint) in blueprints.iter().enumerate() {
        for (name, property) in &blueprint.schema.properties {
            let location = format!("/{}/schema/properties/{}", index, name);

            match (property.property_type, &property.items) {
                (PropertyType::Array, None) => {
                    return Err(LoadError::malformed(location, "array property without `items`"));
                }
                (PropertyType::Array, Some(items)) => {
                    check_format(&location, items.item_type, items.format)?;
                }
                (other, Some(_)) => {
                    return Err(LoadError::malformed(
                        location,
                        format!("`items` is only allowed on array properties, found {}", other),
                    ));
                }
                (_, None) => {}
            }

            if property.property_type != PropertyType::Array {
                check_format(&location, property.property_type, property.format)?;
            } else if let Some(format) = property.format {
                return Err(LoadError::malformed(
                    location,
                    format!("format `{}` belongs on `items`, not on the array", format),
                ));
            }

            if property.is_enum() && property.property_type != PropertyType::String {
                return Err(LoadError::malformed(
                    location,
                    format!("`enum` requires a string property, found {}", property.property_type),
                ));
            }
        }
    }
    Ok(())
}

fn check_format(
    location: &str,
    property_type: PropertyType,
    format: Option<PropertyFormat>,
) -> Result<(), LoadError> {
    match format {
        Some(format) if property_type != PropertyType::String => Err(LoadError::malformed(
            location,
            format!("format `{}` requires a string, found {}", format, property_type),
        )),
        _ => Ok(()),
    }
}

/// Serialize blueprints back to the document's pretty JSON form.
pub fn to_json(blueprints: &[Blueprint]) -> Result<String, LoadError> {
    serde_json::to_string_pretty(blueprints)
        .map_err(|e| LoadError::malformed("document", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = r#"[
      {
        "identifier": "argocdCluster",
        "title": "ArgoCD Cluster",
        "icon": "Argo",
        "schema": {
          "properties": {
            "server": {"title": "Server", "type": "string", "format": "url"},
            "applicationsCount": {"type": "number"}
          },
          "required": []
        },
        "mirrorProperties": {},
        "relations": {}
      },
      {
        "identifier": "argocdProject",
        "schema": {"properties": {}, "required": []},
        "relations": {
          "cluster": {"title": "Cluster", "target": "argocdCluster", "required": false, "many": true}
        }
      }
    ]"#;

    fn assert_malformed(result: Result<Vec<Blueprint>, LoadError>, needle: &str) {
        match result {
            Err(LoadError::MalformedSchema { location, message }) => {
                assert!(
                    location.contains(needle) || message.contains(needle),
                    "{} / {}",
                    location,
                    message
                );
            }
            other => panic!("expected MalformedSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_load_sample() {
        let blueprints = load(SAMPLE).unwrap();
        assert_eq!(blueprints.len(), 2);
        let names: Vec<_> = blueprints[0].schema.properties.keys().cloned().collect();
        assert_eq!(names, vec!["server", "applicationsCount"]);
        assert!(blueprints[1].relation("cluster").unwrap().many);
    }

    #[test]
    fn test_round_trip_is_structural_identity() {
        let blueprints = load(SAMPLE).unwrap();
        let rendered = to_json(&blueprints).unwrap();

        let original: Value = serde_json::from_str(SAMPLE).unwrap();
        let reparsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(original, reparsed);
        assert_eq!(load(&rendered).unwrap(), blueprints);
    }

    #[test]
    fn test_missing_schema_is_malformed() {
        assert_malformed(load(r#"[{"identifier": "argocdCluster"}]"#), "schema");
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert_malformed(load("[{"), "document");
    }

    #[test]
    fn test_unknown_property_type_is_malformed() {
        let doc = r#"[{"identifier": "a", "schema": {"properties": {"x": {"type": "datetime"}}}}]"#;
        assert_malformed(load(doc), "/0/schema/properties/x/type");
    }

    #[test]
    fn test_duplicate_relation_name_is_malformed() {
        let doc = r#"[{"identifier": "a", "schema": {"properties": {}}, "relations": {
            "r": {"target": "a", "required": false, "many": false},
            "r": {"target": "a", "required": false, "many": true}
        }}]"#;
        assert_malformed(load(doc), "duplicate key `r`");
    }

    #[test]
    fn test_array_without_items_is_malformed() {
        let doc = r#"[{"identifier": "a", "schema": {"properties": {"tags": {"type": "array"}}}}]"#;
        assert_malformed(load(doc), "without `items`");
    }

    #[test]
    fn test_items_on_string_is_malformed() {
        let doc = r#"[{"identifier": "a", "schema": {"properties": {
            "tag": {"type": "string", "items": {"type": "string"}}
        }}}]"#;
        assert_malformed(load(doc), "only allowed on array");
    }

    #[test]
    fn test_format_on_number_is_malformed() {
        let doc = r#"[{"identifier": "a", "schema": {"properties": {
            "count": {"type": "number", "format": "date-time"}
        }}}]"#;
        assert_malformed(load(doc), "requires a string");
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "- identifier: argocdCluster\n  schema:\n    properties:\n      server:\n        type: string\n        format: url\n    required: []\n"
        )
        .unwrap();

        let blueprints = load_file(file.path()).unwrap();
        assert_eq!(blueprints[0].identifier, "argocdCluster");
        assert_eq!(
            blueprints[0].property("server").unwrap().format,
            Some(PropertyFormat::Url)
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("b.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("b.YAML")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("blueprints.json")), DocumentFormat::Json);
    }

    #[test]
    fn test_missing_file() {
        let result = load_file(Path::new("/nonexistent/blueprints.json"));
        assert!(matches!(result, Err(LoadError::Read(_))));
    }
}
