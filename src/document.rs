use crate::any_value::AnyValue;
use crate::components::{Components, ExampleObject};
use crate::route::HttpMethod;
use crate::schema_generator::{ReferenceOr, Schema};
use crate::version::Version;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Security requirement: scheme name -> required scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths
    pub paths: IndexMap<String, PathItem>,
    /// Components (schemas, examples, security schemes, links, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// API title
    pub title: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// API version
    pub version: Version,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            version: Version::new(1, 0, 0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            external_docs: None,
        }
    }
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
        }
    }

    /// Sets the operation for `method`, replacing any previous one
    pub fn set(&mut self, method: HttpMethod, operation: Operation) {
        *self.slot(method) = Some(operation);
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    pub fn operation_mut(&mut self, method: HttpMethod) -> Option<&mut Operation> {
        self.slot(method).as_mut()
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Operation summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    /// Operation ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameters (path, query, header, cookie)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ReferenceOr<Parameter>>,
    /// Request body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<ReferenceOr<RequestBody>>,
    /// Responses by status code, range (`4XX`) or `default`
    pub responses: IndexMap<String, ReferenceOr<Response>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Specification extensions (`x-...`)
    #[serde(flatten)]
    pub extensions: IndexMap<String, AnyValue>,
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Path => "path",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is required
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Parameter schema
    pub schema: ReferenceOr<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<AnyValue>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Content types and their schemas
    pub content: IndexMap<String, MediaType>,
    /// Whether the request body is required
    pub required: bool,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ReferenceOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<AnyValue>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, ReferenceOr<ExampleObject>>,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, ReferenceOr<Header>>,
    /// Response content
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, ReferenceOr<LinkObject>>,
}

impl Response {
    /// A response carrying only a description
    pub fn description_only(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            headers: IndexMap::new(),
            content: IndexMap::new(),
            links: IndexMap::new(),
        }
    }
}

/// OpenAPI Header object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    pub schema: ReferenceOr<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<AnyValue>,
}

/// OpenAPI Link object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Target parameter name -> runtime expression
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_path_item_set_overwrites() {
        let mut item = PathItem::default();
        item.set(
            HttpMethod::Get,
            Operation {
                summary: Some("first".to_string()),
                ..Default::default()
            },
        );
        item.set(
            HttpMethod::Get,
            Operation {
                summary: Some("second".to_string()),
                ..Default::default()
            },
        );

        let get = item.operation(HttpMethod::Get).unwrap();
        assert_eq!(get.summary.as_deref(), Some("second"));
        assert!(item.operation(HttpMethod::Post).is_none());
    }

    #[test]
    fn test_operation_extensions_are_flattened() {
        let mut operation = Operation {
            operation_id: Some("getPets".to_string()),
            ..Default::default()
        };
        operation
            .extensions
            .insert("x-internal".to_string(), AnyValue::Bool(true));

        let json = serde_json::to_value(&operation).unwrap();
        assert_eq!(
            json,
            json!({"operationId": "getPets", "responses": {}, "x-internal": true})
        );
    }

    #[test]
    fn test_parameter_serialization() {
        let parameter = Parameter {
            name: "petId".to_string(),
            location: ParameterLocation::Path,
            description: None,
            required: true,
            deprecated: None,
            schema: ReferenceOr::Item(Schema::string()),
            example: Some(AnyValue::from("42")),
        };

        assert_eq!(
            serde_json::to_value(&parameter).unwrap(),
            json!({
                "name": "petId",
                "in": "path",
                "required": true,
                "schema": {"type": "string"},
                "example": "42"
            })
        );
    }

    #[test]
    fn test_description_only_response() {
        let response = Response::description_only("Not Found");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"description": "Not Found"})
        );
    }

    #[test]
    fn test_path_item_serializes_methods_in_order() {
        let mut item = PathItem::default();
        item.set(HttpMethod::Post, Operation::default());
        item.set(HttpMethod::Get, Operation::default());

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.find("\"get\"").unwrap() < json.find("\"post\"").unwrap());
    }
}
