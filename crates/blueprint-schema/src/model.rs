//! Blueprint document types.
//!
//! These mirror the catalog backend's registration payload field for field.
//! Keys the tooling does not interpret (`mirrorProperties`, `default`, ...)
//! are carried in `extra` so a document survives load and re-serialization
//! unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A named entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Stable API name, unique across the document.
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub schema: BlueprintSchema,
    /// Relation name to relation definition.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "unique_keys::deserialize_opt"
    )]
    pub relations: Option<IndexMap<String, Relation>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Blueprint {
    /// Iterate relations in declaration order.
    pub fn relations(&self) -> impl Iterator<Item = (&String, &Relation)> {
        self.relations.iter().flat_map(|r| r.iter())
    }

    /// Look up a relation by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.as_ref().and_then(|r| r.get(name))
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.schema.properties.get(name)
    }

    /// Identifiers this blueprint points at, in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.relations().map(|(_, relation)| relation.target.as_str())
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.identifier)
    }
}

/// The `schema` block of a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintSchema {
    /// Insertion order is display order.
    #[serde(deserialize_with = "unique_keys::deserialize")]
    pub properties: IndexMap<String, Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl BlueprintSchema {
    /// Names of properties every instance must carry.
    pub fn required(&self) -> &[String] {
        self.required.as_deref().unwrap_or_default()
    }
}

/// Kind of value a property holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Object => "object",
            PropertyType::Array => "array",
        };
        f.write_str(name)
    }
}

/// Refinement of a string property's representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyFormat {
    DateTime,
    Url,
    Email,
    Ipv4,
    Ipv6,
    Markdown,
    Yaml,
    User,
    Team,
    Timer,
    Proto,
}

impl fmt::Display for PropertyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyFormat::DateTime => "date-time",
            PropertyFormat::Url => "url",
            PropertyFormat::Email => "email",
            PropertyFormat::Ipv4 => "ipv4",
            PropertyFormat::Ipv6 => "ipv6",
            PropertyFormat::Markdown => "markdown",
            PropertyFormat::Yaml => "yaml",
            PropertyFormat::User => "user",
            PropertyFormat::Team => "team",
            PropertyFormat::Timer => "timer",
            PropertyFormat::Proto => "proto",
        };
        f.write_str(name)
    }
}

/// One attribute of a blueprint instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<PropertyFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Closed set of allowed values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Display color per enum value.
    #[serde(
        rename = "enumColors",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "unique_keys::deserialize_opt"
    )]
    pub enum_colors: Option<IndexMap<String, String>>,
    /// Element type, arrays only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ItemsDefinition>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Property {
    pub fn is_enum(&self) -> bool {
        self.enum_values.is_some()
    }
}

/// Element type of an array property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsDefinition {
    #[serde(rename = "type")]
    pub item_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<PropertyFormat>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A directed edge to another blueprint, by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Identifier of the related blueprint.
    pub target: String,
    /// Every instance needs at least one related entity.
    pub required: bool,
    /// One-to-many when true.
    pub many: bool,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Map deserialization that rejects repeated keys.
///
/// JSON objects with a repeated key otherwise collapse silently to the last
/// value, hiding a duplicated property or relation name.
mod unique_keys {
    use indexmap::IndexMap;
    use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
    use std::fmt;
    use std::marker::PhantomData;

    struct UniqueKeysVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeysVisitor<V> {
        type Value = IndexMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map with unique keys")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                if map.contains_key(&key) {
                    return Err(de::Error::custom(format!("duplicate key `{}`", key)));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        deserializer.deserialize_map(UniqueKeysVisitor(PhantomData))
    }

    pub fn deserialize_opt<'de, D, V>(
        deserializer: D,
    ) -> Result<Option<IndexMap<String, V>>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        deserialize(deserializer).map(Some)
    }
}
