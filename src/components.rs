use crate::any_value::AnyValue;
use crate::document::{Header, LinkObject, Parameter, Response};
use crate::schema_generator::Schema;
use crate::security::SecurityScheme;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reusable named fragments referenced from the rest of the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, ExampleObject>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Header>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, SecurityScheme>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, LinkObject>,
}

/// Named example payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: AnyValue,
}

impl ExampleObject {
    pub fn new(value: AnyValue) -> Self {
        Self {
            summary: None,
            description: None,
            value,
        }
    }
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.examples.is_empty()
            && self.parameters.is_empty()
            && self.responses.is_empty()
            && self.headers.is_empty()
            && self.security_schemes.is_empty()
            && self.links.is_empty()
    }

    /// Merges `other` into `self`; entries of `other` win on name collision.
    pub fn merge(&mut self, other: Components) {
        self.schemas.extend(other.schemas);
        self.examples.extend(other.examples);
        self.parameters.extend(other.parameters);
        self.responses.extend(other.responses);
        self.headers.extend(other.headers);
        self.security_schemes.extend(other.security_schemes);
        self.links.extend(other.links);
    }
}
