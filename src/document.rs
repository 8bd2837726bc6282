//! Raw serde model of an OpenAPI / JSON-Schema document.
//!
//! Only the keywords conversion cares about are modeled; everything else in
//! the document is ignored during deserialization.

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub components: Option<Components>,
    /// Swagger 2 / JSON Schema registry.
    #[serde(default)]
    pub definitions: Option<IndexMap<String, RawSchema>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: Option<IndexMap<String, RawSchema>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<RawType>,
    pub format: Option<String>,
    pub items: Option<Box<RawSchema>>,
    #[serde(default)]
    pub properties: IndexMap<String, RawSchema>,
    pub additional_properties: Option<RawAdditional>,
    #[serde(default)]
    pub any_of: Vec<RawSchema>,
    #[serde(default)]
    pub all_of: Vec<RawSchema>,
    #[serde(default)]
    pub one_of: Vec<RawSchema>,
}

/// `type: string` or, in OpenAPI 3.1, `type: [string, "null"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawType {
    One(String),
    Many(Vec<String>),
}

impl RawType {
    /// The single declared kind, if there is exactly one.
    pub fn single(&self) -> Option<&str> {
        match self {
            RawType::One(kind) => Some(kind),
            RawType::Many(kinds) if kinds.len() == 1 => Some(&kinds[0]),
            RawType::Many(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAdditional {
    Flag(bool),
    Schema(Box<RawSchema>),
}

impl Document {
    /// The top-level schema registry: `components.schemas`, else `definitions`.
    pub fn into_schemas(self) -> Option<IndexMap<String, RawSchema>> {
        self.components
            .and_then(|components| components.schemas)
            .or(self.definitions)
    }
}
