//! JSON schema for the blueprint document's structure.

use jsonschema::JSONSchema;
use serde_json::Value;

/// JSON Schema for a blueprint document (top-level array of blueprints).
pub const DOCUMENT_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Catalog Blueprint Document",
  "type": "array",
  "items": { "$ref": "#/definitions/blueprint" },
  "definitions": {
    "propertyType": {
      "enum": ["string", "number", "boolean", "object", "array"]
    },
    "propertyFormat": {
      "enum": ["date-time", "url", "email", "ipv4", "ipv6", "markdown", "yaml", "user", "team", "timer", "proto"]
    },
    "blueprint": {
      "type": "object",
      "required": ["identifier", "schema"],
      "properties": {
        "identifier": {
          "type": "string",
          "pattern": "^[A-Za-z0-9@_=\\-]+$"
        },
        "title": { "type": "string" },
        "description": { "type": "string" },
        "icon": { "type": "string" },
        "schema": {
          "type": "object",
          "required": ["properties"],
          "properties": {
            "properties": {
              "type": "object",
              "additionalProperties": { "$ref": "#/definitions/property" }
            },
            "required": {
              "type": "array",
              "items": { "type": "string" }
            }
          }
        },
        "relations": {
          "type": "object",
          "additionalProperties": { "$ref": "#/definitions/relation" }
        }
      }
    },
    "property": {
      "type": "object",
      "required": ["type"],
      "properties": {
        "type": { "$ref": "#/definitions/propertyType" },
        "format": { "$ref": "#/definitions/propertyFormat" },
        "title": { "type": "string" },
        "description": { "type": "string" },
        "icon": { "type": "string" },
        "enum": {
          "type": "array",
          "items": { "type": "string" }
        },
        "enumColors": {
          "type": "object",
          "additionalProperties": { "type": "string" }
        },
        "items": {
          "type": "object",
          "required": ["type"],
          "properties": {
            "type": { "$ref": "#/definitions/propertyType" },
            "format": { "$ref": "#/definitions/propertyFormat" }
          }
        }
      }
    },
    "relation": {
      "type": "object",
      "required": ["target", "required", "many"],
      "properties": {
        "title": { "type": "string" },
        "description": { "type": "string" },
        "target": { "type": "string", "minLength": 1 },
        "required": { "type": "boolean" },
        "many": { "type": "boolean" }
      }
    }
  }
}"##;

/// Get the document schema as a parsed JSON value.
pub fn document_schema() -> Value {
    serde_json::from_str(DOCUMENT_SCHEMA).expect("Invalid blueprint document schema")
}

/// A structural problem found by the document schema.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralError {
    /// JSON pointer into the document.
    pub location: String,
    pub message: String,
}

/// Check a raw document against [`DOCUMENT_SCHEMA`].
///
/// Returns every structural error; an empty list means the document has the
/// expected shape.
pub fn check_document(document: &Value) -> Result<Vec<StructuralError>, String> {
    let schema_value = document_schema();
    let compiled = JSONSchema::compile(&schema_value).map_err(|e| e.to_string())?;

    let mut errors = Vec::new();
    if let Err(validation_errors) = compiled.validate(document) {
        for error in validation_errors {
            let location = error.instance_path.to_string();
            errors.push(StructuralError {
                location: if location.is_empty() {
                    "/".to_string()
                } else {
                    location
                },
                message: error.to_string(),
            });
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_parses() {
        let schema = document_schema();
        assert_eq!(schema["type"], "array");
    }

    #[test]
    fn test_definition_refs_resolve() {
        let schema = document_schema();
        assert_eq!(schema["items"]["$ref"], "#/definitions/blueprint");
        assert!(schema["definitions"]["relation"].is_object());

        // A bad property type is only caught by following the property $ref
        let doc = json!([{
            "identifier": "argocdCluster",
            "schema": {"properties": {"server": {"type": "uri"}}}
        }]);
        let errors = check_document(&doc).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location, "/0/schema/properties/server/type");
    }

    #[test]
    fn test_minimal_document_is_well_formed() {
        let doc = json!([
            {"identifier": "argocdCluster", "schema": {"properties": {}, "required": []}}
        ]);
        assert!(check_document(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_missing_identifier_reported() {
        let doc = json!([{ "schema": {"properties": {}} }]);
        let errors = check_document(&doc).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location, "/0");
        assert!(errors[0].message.contains("identifier"));
    }

    #[test]
    fn test_relation_shape_reported() {
        let doc = json!([{
            "identifier": "argocdProject",
            "schema": {"properties": {}},
            "relations": {"cluster": {"target": "argocdCluster", "many": "yes"}}
        }]);
        let errors = check_document(&doc).unwrap();
        let locations: Vec<_> = errors.iter().map(|e| e.location.as_str()).collect();
        assert!(locations.contains(&"/0/relations/cluster"));
        assert!(locations.contains(&"/0/relations/cluster/many"));
    }

    #[test]
    fn test_top_level_must_be_array() {
        let doc = json!({"identifier": "argocdCluster"});
        let errors = check_document(&doc).unwrap();
        assert_eq!(errors[0].location, "/");
    }
}
