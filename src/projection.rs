//! Projection of example values, type descriptors and raw schemas into OpenAPI
//! parameters, headers, request bodies and responses.

use crate::any_value::{encode, AnyValue};
use crate::document::{Header, MediaType, Parameter, ParameterLocation, RequestBody, Response};
use crate::error::Result;
use crate::schema_generator::{ReferenceOr, Schema, SchemaGenerator};
use crate::type_descriptor::{ApiType, CompositeKind, TypeDescriptor, TypeKind, WithExample};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use std::fmt;

/// Media types
pub mod content_type {
    pub const JSON: &str = "application/json";
    pub const PLAIN_TEXT: &str = "text/plain";
    pub const HTML: &str = "text/html";
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const FORM: &str = "application/x-www-form-urlencoded";
    /// Used when the branches of a composite disagree
    pub const ANY: &str = "*/*";
}

/// Anything a route can be documented with
#[derive(Debug, Clone)]
pub enum OpenApiValue {
    /// A concrete example of a typed value; yields schema and example
    Example {
        descriptor: TypeDescriptor,
        value: Result<AnyValue>,
    },
    /// A type without an example; yields schema only
    Type(TypeDescriptor),
    /// A hand-written schema
    Schema(Schema),
    /// `allOf` / `anyOf` / `oneOf` / `not` over other values
    Composite {
        kind: CompositeKind,
        members: Vec<OpenApiValue>,
    },
}

impl OpenApiValue {
    /// The canonical example of `T`
    pub fn example<T: WithExample>() -> Self {
        Self::value(&T::example())
    }

    /// A specific value of `T`
    pub fn value<T: ApiType + Serialize>(value: &T) -> Self {
        OpenApiValue::Example {
            descriptor: T::descriptor(),
            value: encode(value),
        }
    }

    pub fn of_type<T: ApiType>() -> Self {
        OpenApiValue::Type(T::descriptor())
    }

    pub fn schema(schema: Schema) -> Self {
        OpenApiValue::Schema(schema)
    }

    pub fn one_of(members: Vec<OpenApiValue>) -> Self {
        OpenApiValue::Composite {
            kind: CompositeKind::OneOf,
            members,
        }
    }

    pub fn any_of(members: Vec<OpenApiValue>) -> Self {
        OpenApiValue::Composite {
            kind: CompositeKind::AnyOf,
            members,
        }
    }

    pub fn all_of(members: Vec<OpenApiValue>) -> Self {
        OpenApiValue::Composite {
            kind: CompositeKind::AllOf,
            members,
        }
    }

    /// Schema of the value, registering named components in `generator`
    pub fn to_schema(&self, generator: &mut SchemaGenerator) -> Result<ReferenceOr<Schema>> {
        match self {
            OpenApiValue::Example { descriptor, value } => {
                value.as_ref().map_err(Clone::clone)?;
                generator.generate_schema(descriptor)
            }
            OpenApiValue::Type(descriptor) => generator.generate_schema(descriptor),
            OpenApiValue::Schema(schema) => Ok(ReferenceOr::Item(schema.clone())),
            OpenApiValue::Composite { kind, members } => {
                let members = members
                    .iter()
                    .map(|member| member.to_schema(generator))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ReferenceOr::Item(Schema::composite(*kind, members)))
            }
        }
    }

    /// Media type object with schema and, for examples, a reference to the example component
    pub fn media_type(&self, generator: &mut SchemaGenerator) -> Result<MediaType> {
        match self {
            OpenApiValue::Example { descriptor, value } => {
                let value = value.clone()?;
                let (schema, example) = generator.generate_example(descriptor, value)?;
                let mut media = MediaType {
                    schema: Some(schema),
                    ..Default::default()
                };
                match example {
                    ReferenceOr::Item(example) => media.example = Some(example.value),
                    reference => {
                        let name = reference.component_name().unwrap_or(&descriptor.name).to_string();
                        media.examples.insert(name, reference);
                    }
                }
                Ok(media)
            }
            OpenApiValue::Composite { kind, members } => {
                let mut schemas = Vec::with_capacity(members.len());
                let mut examples = IndexMap::new();
                for member in members {
                    let media = member.media_type(generator)?;
                    schemas.extend(media.schema);
                    examples.extend(media.examples);
                }
                Ok(MediaType {
                    schema: Some(ReferenceOr::Item(Schema::composite(*kind, schemas))),
                    example: None,
                    examples,
                })
            }
            _ => Ok(MediaType {
                schema: Some(self.to_schema(generator)?),
                ..Default::default()
            }),
        }
    }

    /// Content type used when none is declared
    ///
    /// Composites use the content type shared by all branches, or `*/*` when they differ.
    pub fn content_type(&self) -> &'static str {
        match self {
            OpenApiValue::Example { descriptor, .. } | OpenApiValue::Type(descriptor) => {
                descriptor.default_content_type()
            }
            OpenApiValue::Schema(_) => content_type::JSON,
            OpenApiValue::Composite { members, .. } => {
                let mut types = members.iter().map(OpenApiValue::content_type);
                match types.next() {
                    Some(first) if types.all(|other| other == first) => first,
                    Some(_) => content_type::ANY,
                    None => content_type::JSON,
                }
            }
        }
    }

    /// Projects top-level properties into parameters at `location`
    ///
    /// A property that cannot be described is skipped with a warning; its siblings are kept.
    pub fn parameters(&self, location: ParameterLocation, generator: &mut SchemaGenerator) -> Vec<Parameter> {
        self.properties(generator)
            .into_values()
            .map(|property| Parameter {
                required: location == ParameterLocation::Path || property.required,
                name: property.name,
                location,
                description: property.description,
                deprecated: None,
                schema: property.schema,
                example: property.example,
            })
            .collect()
    }

    /// Projects top-level properties into response headers
    pub fn headers(&self, generator: &mut SchemaGenerator) -> IndexMap<String, ReferenceOr<Header>> {
        self.properties(generator)
            .into_values()
            .map(|property| {
                let header = Header {
                    description: property.description,
                    required: property.required,
                    deprecated: None,
                    schema: property.schema,
                    example: property.example,
                };
                (property.name, ReferenceOr::Item(header))
            })
            .collect()
    }

    fn properties(&self, generator: &mut SchemaGenerator) -> IndexMap<String, Property> {
        match self {
            OpenApiValue::Example { descriptor, value } => match value {
                Ok(value) => descriptor_properties(descriptor, Some(value), generator),
                Err(err) => {
                    warn!("Cannot encode example of {}: {}", descriptor.name, err);
                    descriptor_properties(descriptor, None, generator)
                }
            },
            OpenApiValue::Type(descriptor) => descriptor_properties(descriptor, None, generator),
            OpenApiValue::Schema(schema) => schema_properties(schema),
            // later members win on name collision
            OpenApiValue::Composite { members, .. } => {
                let mut properties = IndexMap::new();
                for member in members {
                    properties.extend(member.properties(generator));
                }
                properties
            }
        }
    }
}

/// A top-level property, ready to become a parameter or header
struct Property {
    name: String,
    required: bool,
    description: Option<String>,
    schema: ReferenceOr<Schema>,
    example: Option<AnyValue>,
}

fn descriptor_properties(
    descriptor: &TypeDescriptor,
    value: Option<&AnyValue>,
    generator: &mut SchemaGenerator,
) -> IndexMap<String, Property> {
    let def = match &descriptor.kind {
        TypeKind::Struct(def) => def,
        TypeKind::Optional(wrapped) => return descriptor_properties(wrapped, value, generator),
        _ => {
            debug!("{} has no top-level properties", descriptor.name);
            return IndexMap::new();
        }
    };

    let mut properties = IndexMap::new();
    for field in &def.fields {
        let field_type = (field.descriptor)();
        let schema = match generator.generate_schema(&field_type) {
            Ok(schema) => schema,
            Err(err) => {
                warn!("Skipping {}.{}: {}", descriptor.name, field.name, err);
                continue;
            }
        };
        let example = value
            .and_then(|value| value.value_at(&[field.name.as_str()]))
            .filter(|value| !value.is_null())
            .cloned();
        properties.insert(
            field.name.clone(),
            Property {
                name: field.name.clone(),
                required: !field_type.is_optional(),
                description: field.description.clone(),
                schema,
                example,
            },
        );
    }
    properties
}

fn schema_properties(schema: &Schema) -> IndexMap<String, Property> {
    schema
        .properties
        .iter()
        .map(|(name, property)| {
            let item = property.as_item();
            (
                name.clone(),
                Property {
                    name: name.clone(),
                    required: schema.is_required(name),
                    description: item.and_then(|item| item.description.clone()),
                    schema: property.clone(),
                    example: item.and_then(|item| item.example.clone()),
                },
            )
        })
        .collect()
}

/// Key of a response: a status code, a status range (`4XX`) or `default`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResponseStatus {
    Code(u16),
    /// Leading digit of the range, e.g. `4` for `4XX`
    Range(u8),
    Default,
}

impl ResponseStatus {
    /// Canonical reason phrase used when no description is declared
    pub fn reason(&self) -> &'static str {
        match self {
            ResponseStatus::Code(code) => http::StatusCode::from_u16(*code)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("Unknown status"),
            ResponseStatus::Range(1) => "Informational",
            ResponseStatus::Range(2) => "Success",
            ResponseStatus::Range(3) => "Redirection",
            ResponseStatus::Range(4) => "Client Error",
            ResponseStatus::Range(5) => "Server Error",
            ResponseStatus::Range(_) => "Unknown status",
            ResponseStatus::Default => "Unexpected error",
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            ResponseStatus::Code(code) => (200..300).contains(code),
            ResponseStatus::Range(range) => *range == 2,
            ResponseStatus::Default => false,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Code(code) => write!(f, "{}", code),
            ResponseStatus::Range(range) => write!(f, "{}XX", range),
            ResponseStatus::Default => f.write_str("default"),
        }
    }
}

impl From<u16> for ResponseStatus {
    fn from(code: u16) -> Self {
        ResponseStatus::Code(code)
    }
}

impl From<http::StatusCode> for ResponseStatus {
    fn from(status: http::StatusCode) -> Self {
        ResponseStatus::Code(status.as_u16())
    }
}

/// Content types to use for `value`: the declared ones, or the inferred one
fn content_types_for(value: &OpenApiValue, declared: &[String]) -> Vec<String> {
    if declared.is_empty() {
        vec![value.content_type().to_string()]
    } else {
        declared.to_vec()
    }
}

/// Builds a response with `value` as body under every content type
pub fn response(
    value: &OpenApiValue,
    description: &str,
    content_types: &[String],
    headers: &[OpenApiValue],
    generator: &mut SchemaGenerator,
) -> Result<Response> {
    let media = value.media_type(generator)?;
    let mut response = Response::description_only(description);
    for content_type in content_types_for(value, content_types) {
        response.content.insert(content_type, media.clone());
    }
    for source in headers {
        response.headers.extend(source.headers(generator));
    }
    Ok(response)
}

/// Builds a request body with `value` under every content type
pub fn request_body(
    value: &OpenApiValue,
    description: Option<&str>,
    content_types: &[String],
    required: bool,
    generator: &mut SchemaGenerator,
) -> Result<RequestBody> {
    let media = value.media_type(generator)?;
    let content = content_types_for(value, content_types)
        .into_iter()
        .map(|content_type| (content_type, media.clone()))
        .collect();
    Ok(RequestBody {
        description: description.map(str::to_string),
        content,
        required,
    })
}

/// Builds error responses
///
/// Entries without a declared description get the status reason phrase. Descriptions
/// without a body produce description-only responses. A body that cannot be described
/// degrades to a description-only response.
pub fn error_responses(
    errors: &IndexMap<ResponseStatus, OpenApiValue>,
    descriptions: &IndexMap<ResponseStatus, String>,
    content_types: &[String],
    headers: &[OpenApiValue],
    generator: &mut SchemaGenerator,
) -> IndexMap<String, ReferenceOr<Response>> {
    let mut responses = IndexMap::new();
    for (status, value) in errors {
        let description = descriptions
            .get(status)
            .map(String::as_str)
            .unwrap_or_else(|| status.reason());
        let response = response(value, description, content_types, headers, generator)
            .unwrap_or_else(|err| {
                warn!("Cannot describe {} response body: {}", status, err);
                Response::description_only(description)
            });
        responses.insert(status.to_string(), ReferenceOr::Item(response));
    }
    for (status, description) in descriptions {
        if !errors.contains_key(status) && !status.is_success() {
            responses.insert(
                status.to_string(),
                ReferenceOr::Item(Response::description_only(description.clone())),
            );
        }
    }
    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::type_descriptor::{Binary, Html};
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use uuid::Uuid;

    #[derive(Serialize)]
    struct Query {
        search: String,
        limit: Option<u32>,
        #[serde(rename = "petId")]
        pet_id: Uuid,
    }

    impl ApiType for Query {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<Query>("Query")
                .described_field::<String>("search", "Free text")
                .field::<Option<u32>>("limit")
                .field::<Uuid>("petId")
        }
    }

    impl WithExample for Query {
        fn example() -> Self {
            Query {
                search: "doggie".to_string(),
                limit: None,
                pet_id: Uuid::nil(),
            }
        }
    }

    #[derive(Serialize)]
    struct Paging {
        limit: u32,
    }

    impl ApiType for Paging {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<Paging>("Paging").field::<u32>("limit")
        }
    }

    impl WithExample for Paging {
        fn example() -> Self {
            Paging { limit: 20 }
        }
    }

    struct Opaque;

    impl ApiType for Opaque {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::unrepresentable("Opaque", "custom encoding")
        }
    }

    struct WithOpaque;

    impl ApiType for WithOpaque {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<WithOpaque>("WithOpaque")
                .field::<String>("name")
                .field::<Opaque>("blob")
                .field::<i64>("size")
        }
    }

    #[test]
    fn test_query_parameters_from_example() {
        let mut generator = SchemaGenerator::new();
        let parameters = OpenApiValue::example::<Query>().parameters(ParameterLocation::Query, &mut generator);

        assert_eq!(
            parameters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["search", "limit", "petId"]
        );
        assert!(parameters[0].required);
        assert_eq!(parameters[0].description.as_deref(), Some("Free text"));
        assert_eq!(parameters[0].example, Some(AnyValue::from("doggie")));
        // optional regardless of the example value
        assert!(!parameters[1].required);
        assert_eq!(parameters[1].example, None);
        assert_eq!(parameters[2].location, ParameterLocation::Query);
    }

    #[test]
    fn test_path_parameters_always_required() {
        let mut generator = SchemaGenerator::new();
        let parameters = OpenApiValue::of_type::<Query>().parameters(ParameterLocation::Path, &mut generator);

        assert!(parameters.iter().all(|parameter| parameter.required));
        assert!(parameters.iter().all(|parameter| parameter.example.is_none()));
    }

    #[test]
    fn test_failing_field_does_not_drop_siblings() {
        let mut generator = SchemaGenerator::new();
        let parameters =
            OpenApiValue::of_type::<WithOpaque>().parameters(ParameterLocation::Header, &mut generator);

        assert_eq!(
            parameters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["name", "size"]
        );
    }

    #[test]
    fn test_all_of_parameters_later_wins() {
        let mut generator = SchemaGenerator::new();
        let value = OpenApiValue::all_of(vec![
            OpenApiValue::example::<Query>(),
            OpenApiValue::example::<Paging>(),
        ]);
        let parameters = value.parameters(ParameterLocation::Query, &mut generator);

        assert_eq!(
            parameters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["search", "limit", "petId"]
        );
        assert!(parameters[1].required);
        assert_eq!(parameters[1].example, Some(AnyValue::Int(20)));
    }

    #[test]
    fn test_parameters_from_raw_schema() {
        let mut properties = IndexMap::new();
        properties.insert("page".to_string(), ReferenceOr::Item(Schema::typed("integer", None)));
        properties.insert(
            "sort".to_string(),
            ReferenceOr::Item(Schema::string().description("Sort order")),
        );
        let schema = Schema::object(properties, vec!["page".to_string()]);

        let mut generator = SchemaGenerator::new();
        let parameters = OpenApiValue::schema(schema).parameters(ParameterLocation::Query, &mut generator);

        assert!(parameters[0].required);
        assert!(!parameters[1].required);
        assert_eq!(parameters[1].description.as_deref(), Some("Sort order"));
    }

    #[test]
    fn test_headers_projection() {
        let mut generator = SchemaGenerator::new();
        let headers = OpenApiValue::example::<Paging>().headers(&mut generator);

        let ReferenceOr::Item(limit) = &headers["limit"] else {
            panic!("expected inline header");
        };
        assert!(limit.required);
        assert_eq!(limit.example, Some(AnyValue::Int(20)));
    }

    #[test]
    fn test_content_type_inference() {
        assert_eq!(OpenApiValue::example::<String>().content_type(), "text/plain");
        assert_eq!(OpenApiValue::of_type::<Binary>().content_type(), "application/octet-stream");
        assert_eq!(OpenApiValue::example::<Html>().content_type(), "text/html");
        assert_eq!(OpenApiValue::example::<Query>().content_type(), "application/json");
        assert_eq!(
            OpenApiValue::one_of(vec![OpenApiValue::example::<String>(), OpenApiValue::of_type::<String>()])
                .content_type(),
            "text/plain"
        );
        assert_eq!(
            OpenApiValue::one_of(vec![OpenApiValue::example::<String>(), OpenApiValue::example::<Query>()])
                .content_type(),
            "*/*"
        );
    }

    #[test]
    fn test_media_type_references_example() {
        let mut generator = SchemaGenerator::new();
        let media = OpenApiValue::example::<Paging>().media_type(&mut generator).unwrap();

        assert_eq!(media.schema, Some(ReferenceOr::schema_ref("Paging")));
        assert_eq!(
            media.examples["Paging"].reference(),
            Some("#/components/examples/Paging")
        );
        assert_eq!(
            generator.components().examples["Paging"].value,
            AnyValue::object([("limit", AnyValue::Int(20))])
        );
    }

    #[test]
    fn test_media_type_inlines_unnamed_example() {
        let mut generator = SchemaGenerator::new();
        let media = OpenApiValue::example::<Vec<u32>>().media_type(&mut generator).unwrap();

        assert_eq!(media.example, Some(AnyValue::Array(vec![AnyValue::Int(1)])));
        assert!(media.examples.is_empty());
    }

    #[test]
    fn test_encoding_failure_propagates_from_media_type() {
        let value = OpenApiValue::Example {
            descriptor: String::descriptor(),
            value: Err(Error::EncodingError("boom".to_string())),
        };
        let mut generator = SchemaGenerator::new();
        assert_eq!(
            value.media_type(&mut generator).unwrap_err(),
            Error::EncodingError("boom".to_string())
        );
    }

    #[test]
    fn test_response_status_reasons() {
        assert_eq!(ResponseStatus::Code(404).reason(), "Not Found");
        assert_eq!(ResponseStatus::Code(500).reason(), "Internal Server Error");
        assert_eq!(ResponseStatus::Range(4).to_string(), "4XX");
        assert_eq!(ResponseStatus::Default.to_string(), "default");
        assert_eq!(ResponseStatus::from(http::StatusCode::CONFLICT), ResponseStatus::Code(409));
    }

    #[test]
    fn test_error_responses() {
        let mut errors = IndexMap::new();
        errors.insert(ResponseStatus::Code(404), OpenApiValue::example::<String>());
        errors.insert(ResponseStatus::Code(400), OpenApiValue::example::<Paging>());
        let mut descriptions = IndexMap::new();
        descriptions.insert(ResponseStatus::Code(400), "Invalid paging".to_string());
        descriptions.insert(ResponseStatus::Code(401), "Not logged in".to_string());

        let mut generator = SchemaGenerator::new();
        let responses = error_responses(&errors, &descriptions, &[], &[], &mut generator);

        assert_eq!(responses.keys().collect::<Vec<_>>(), vec!["404", "400", "401"]);

        let not_found = responses["404"].as_item().unwrap();
        assert_eq!(not_found.description, "Not Found");
        assert!(not_found.content.contains_key("text/plain"));

        let bad_request = responses["400"].as_item().unwrap();
        assert_eq!(bad_request.description, "Invalid paging");
        assert!(bad_request.content.contains_key("application/json"));

        assert_eq!(
            responses["401"],
            ReferenceOr::Item(Response::description_only("Not logged in"))
        );
    }

    #[test]
    fn test_request_body_with_declared_content_types() {
        let mut generator = SchemaGenerator::new();
        let body = request_body(
            &OpenApiValue::example::<Paging>(),
            Some("Paging options"),
            &[content_type::JSON.to_string(), content_type::FORM.to_string()],
            true,
            &mut generator,
        )
        .unwrap();

        assert_eq!(
            body.content.keys().collect::<Vec<_>>(),
            vec!["application/json", "application/x-www-form-urlencoded"]
        );
        assert!(body.required);
        assert_eq!(body.description.as_deref(), Some("Paging options"));
    }
}
