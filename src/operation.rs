use crate::any_value::AnyValue;
use crate::components::Components;
use crate::document::{ExternalDocs, Operation, Parameter, ParameterLocation, Response, Server};
use crate::links::{Link, LinkDeclaration, LinkKey};
use crate::projection::{self, OpenApiValue, ResponseStatus};
use crate::route::Route;
use crate::schema_generator::{ReferenceOr, Schema, SchemaGenerator};
use crate::security::AuthScheme;
use indexmap::IndexMap;
use log::{debug, warn};

const SUCCESS_DESCRIPTION: &str = "Success";

/// Documentation accumulated for one route
///
/// Every setter touches one aspect only, so a route can be documented in several calls
/// (for example group defaults first, then the route itself). Tags and auth schemes union,
/// error responses merge per status code with the last write winning, and extensions
/// merge per key with the first write winning.
#[derive(Debug, Clone, Default)]
pub struct OperationDraft {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub external_docs: Option<ExternalDocs>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub query: Vec<OpenApiValue>,
    pub headers: Vec<OpenApiValue>,
    pub path: Vec<OpenApiValue>,
    pub cookies: Vec<OpenApiValue>,
    pub body: Option<OpenApiValue>,
    pub body_content_types: Vec<String>,
    pub body_description: Option<String>,
    pub body_required: Option<bool>,
    pub response: Option<OpenApiValue>,
    pub response_status: Option<ResponseStatus>,
    pub response_content_types: Vec<String>,
    pub response_headers: Vec<OpenApiValue>,
    pub response_description: Option<String>,
    pub errors: IndexMap<ResponseStatus, OpenApiValue>,
    pub error_descriptions: IndexMap<ResponseStatus, String>,
    pub error_content_types: Vec<String>,
    pub error_headers: Vec<OpenApiValue>,
    pub auth: Vec<AuthScheme>,
    pub servers: Vec<Server>,
    pub extensions: IndexMap<String, AnyValue>,
    pub links: Vec<LinkDeclaration>,
    /// Specification this route belongs to; `None` is the default one
    pub spec: Option<String>,
    /// Extra components contributed by this route
    pub components: Components,
    pub excluded: bool,
}

impl OperationDraft {
    pub fn summary(&mut self, summary: impl Into<String>) -> &mut Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn operation_id(&mut self, operation_id: impl Into<String>) -> &mut Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn external_docs(&mut self, url: impl Into<String>, description: Option<&str>) -> &mut Self {
        self.external_docs = Some(ExternalDocs {
            url: url.into(),
            description: description.map(str::to_string),
        });
        self
    }

    /// Adds tags not present yet, keeping the existing order
    pub fn tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    pub fn deprecated(&mut self, deprecated: bool) -> &mut Self {
        self.deprecated = deprecated;
        self
    }

    /// Adds a source of query parameters; later sources win on name collision
    pub fn query(&mut self, value: OpenApiValue) -> &mut Self {
        self.query.push(value);
        self
    }

    /// Adds a source of header parameters
    pub fn headers(&mut self, value: OpenApiValue) -> &mut Self {
        self.headers.push(value);
        self
    }

    /// Adds a source of path parameters, overriding the generated ones by name
    pub fn path(&mut self, value: OpenApiValue) -> &mut Self {
        self.path.push(value);
        self
    }

    /// Adds a source of cookie parameters
    pub fn cookies(&mut self, value: OpenApiValue) -> &mut Self {
        self.cookies.push(value);
        self
    }

    pub fn body(&mut self, value: OpenApiValue) -> &mut Self {
        self.body = Some(value);
        self
    }

    pub fn body_content_types<I, S>(&mut self, content_types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body_content_types = content_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn body_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.body_description = Some(description.into());
        self
    }

    pub fn body_required(&mut self, required: bool) -> &mut Self {
        self.body_required = Some(required);
        self
    }

    /// Sets the primary (success) response body
    pub fn response(&mut self, value: OpenApiValue) -> &mut Self {
        self.response = Some(value);
        self
    }

    pub fn response_status(&mut self, status: impl Into<ResponseStatus>) -> &mut Self {
        self.response_status = Some(status.into());
        self
    }

    pub fn response_content_types<I, S>(&mut self, content_types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.response_content_types = content_types.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a source of response headers
    pub fn response_headers(&mut self, value: OpenApiValue) -> &mut Self {
        self.response_headers.push(value);
        self
    }

    pub fn response_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.response_description = Some(description.into());
        self
    }

    /// Sets the error response for `status`, replacing a previous one
    pub fn error(&mut self, status: impl Into<ResponseStatus>, value: OpenApiValue) -> &mut Self {
        self.errors.insert(status.into(), value);
        self
    }

    /// Sets the description of the response for `status`
    ///
    /// Without an error body this produces a description-only response.
    pub fn error_description(&mut self, status: impl Into<ResponseStatus>, description: impl Into<String>) -> &mut Self {
        self.error_descriptions.insert(status.into(), description.into());
        self
    }

    pub fn error_content_types<I, S>(&mut self, content_types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_content_types = content_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn error_headers(&mut self, value: OpenApiValue) -> &mut Self {
        self.error_headers.push(value);
        self
    }

    /// Requires `auth`; a scheme already present under the same name gains the new scopes
    pub fn auth(&mut self, auth: AuthScheme) -> &mut Self {
        let name = auth.name();
        match self.auth.iter_mut().find(|existing| existing.name() == name) {
            Some(existing) => existing.merge_scopes(&auth),
            None => self.auth.push(auth),
        }
        self
    }

    pub fn server(&mut self, server: Server) -> &mut Self {
        self.servers.push(server);
        self
    }

    /// Adds a specification extension; an existing key keeps its value
    pub fn extension(&mut self, key: impl Into<String>, value: impl Into<AnyValue>) -> &mut Self {
        self.extensions.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    /// Declares one side of a link identified by `K`
    pub fn link<K: LinkKey>(&mut self, link: Link) -> &mut Self {
        self.links.push(LinkDeclaration::new::<K>(link));
        self
    }

    pub fn spec(&mut self, spec: impl Into<String>) -> &mut Self {
        self.spec = Some(spec.into());
        self
    }

    /// Contributes extra components; they win over generated ones of the same name
    pub fn components(&mut self, components: Components) -> &mut Self {
        self.components.merge(components);
        self
    }

    /// Removes the route from every generated document
    pub fn exclude(&mut self) -> &mut Self {
        self.excluded = true;
        self
    }

    /// Tags of the operation: the declared ones, or the first constant path segment
    pub fn effective_tags(&self, route: &Route) -> Vec<String> {
        if self.tags.is_empty() {
            route.default_tag().map(str::to_string).into_iter().collect()
        } else {
            self.tags.clone()
        }
    }
}

/// Builds the operation for `route`, registering schemas and examples in `generator`
///
/// Failures are local: a body that cannot be described is left out, a response that
/// cannot be described keeps only its description.
pub fn build_operation(route: &Route, generator: &mut SchemaGenerator) -> Operation {
    let docs = &route.docs;
    debug!("Building operation for {} {}", route.method, route.path_string());

    let mut parameters = path_parameters(route, generator);
    for (location, sources) in [
        (ParameterLocation::Query, &docs.query),
        (ParameterLocation::Header, &docs.headers),
        (ParameterLocation::Cookie, &docs.cookies),
    ] {
        if !sources.is_empty() {
            parameters.extend(OpenApiValue::all_of(sources.clone()).parameters(location, generator));
        }
    }

    let request_body = docs.body.as_ref().and_then(|body| {
        projection::request_body(
            body,
            docs.body_description.as_deref(),
            &docs.body_content_types,
            docs.body_required.unwrap_or(true),
            generator,
        )
        .map_err(|err| warn!("Skipping request body of {} {}: {}", route.method, route.path_string(), err))
        .ok()
    });

    Operation {
        tags: docs.effective_tags(route),
        summary: docs.summary.clone(),
        description: docs.description.clone(),
        external_docs: docs.external_docs.clone(),
        operation_id: Some(route.operation_id()),
        parameters: parameters.into_iter().map(ReferenceOr::Item).collect(),
        request_body: request_body.map(ReferenceOr::Item),
        responses: responses(route, generator),
        deprecated: docs.deprecated.then_some(true),
        security: docs.auth.iter().map(AuthScheme::requirement).collect(),
        servers: docs.servers.clone(),
        extensions: docs.extensions.clone(),
    }
}

/// Path parameters in path order; declared ones replace generated ones and are always required
///
/// Declared properties without a matching template segment are dropped.
fn path_parameters(route: &Route, generator: &mut SchemaGenerator) -> Vec<Parameter> {
    let mut declared: IndexMap<String, Parameter> = if route.docs.path.is_empty() {
        IndexMap::new()
    } else {
        OpenApiValue::all_of(route.docs.path.clone())
            .parameters(ParameterLocation::Path, generator)
            .into_iter()
            .map(|parameter| (parameter.name.clone(), parameter))
            .collect()
    };

    let mut parameters: Vec<Parameter> = route
        .path_parameters()
        .into_iter()
        .map(|name| {
            declared.shift_remove(name).unwrap_or_else(|| Parameter {
                name: name.to_string(),
                location: ParameterLocation::Path,
                description: None,
                required: true,
                deprecated: None,
                schema: ReferenceOr::Item(Schema::string()),
                example: None,
            })
        })
        .collect();
    for name in declared.keys() {
        warn!(
            "Dropping path parameter {} of {} {}: not in the path template",
            name,
            route.method,
            route.path_string()
        );
    }
    for parameter in &mut parameters {
        parameter.required = true;
    }
    parameters
}

fn responses(route: &Route, generator: &mut SchemaGenerator) -> IndexMap<String, ReferenceOr<Response>> {
    let docs = &route.docs;
    let status = docs.response_status.unwrap_or(ResponseStatus::Code(200));
    let description = docs
        .response_description
        .clone()
        .or_else(|| docs.error_descriptions.get(&status).cloned())
        .unwrap_or_else(|| SUCCESS_DESCRIPTION.to_string());

    let success = match &docs.response {
        Some(value) => projection::response(
            value,
            &description,
            &docs.response_content_types,
            &docs.response_headers,
            generator,
        )
        .unwrap_or_else(|err| {
            warn!("Cannot describe response of {} {}: {}", route.method, route.path_string(), err);
            Response::description_only(description.clone())
        }),
        None => {
            let mut response = Response::description_only(description.clone());
            for source in &docs.response_headers {
                response.headers.extend(source.headers(generator));
            }
            response
        }
    };

    let mut responses = IndexMap::new();
    responses.insert(status.to_string(), ReferenceOr::Item(success));
    let errors = projection::error_responses(
        &docs.errors,
        &docs.error_descriptions,
        &docs.error_content_types,
        &docs.error_headers,
        generator,
    );
    for (key, response) in errors {
        if key != status.to_string() {
            responses.insert(key, response);
        }
    }
    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::LinkLocation;
    use crate::route::{HttpMethod, RouteTable};
    use crate::security::SecurityScheme;
    use crate::type_descriptor::{ApiType, TypeDescriptor, WithExample};
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Serialize)]
    struct PetPath {
        #[serde(rename = "petId")]
        pet_id: Option<u64>,
    }

    impl ApiType for PetPath {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<PetPath>("PetPath").described_field::<Option<u64>>("petId", "ID of pet")
        }
    }

    impl WithExample for PetPath {
        fn example() -> Self {
            PetPath { pet_id: Some(10) }
        }
    }

    #[derive(Serialize)]
    struct PetLookup {
        #[serde(rename = "petId")]
        pet_id: u64,
        extra: String,
    }

    impl ApiType for PetLookup {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<PetLookup>("PetLookup")
                .field::<u64>("petId")
                .field::<String>("extra")
        }
    }

    impl WithExample for PetLookup {
        fn example() -> Self {
            PetLookup {
                pet_id: 10,
                extra: "unused".to_string(),
            }
        }
    }

    struct Unrepresentable;

    impl ApiType for Unrepresentable {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::unrepresentable("Unrepresentable", "custom encoding")
        }
    }

    struct PetId;
    impl LinkKey for PetId {}

    fn route(configure: impl FnOnce(&mut OperationDraft)) -> Route {
        let mut routes = RouteTable::new();
        routes.add(HttpMethod::Get, "/pets/:petId/photos/:photoId", configure).clone()
    }

    #[test]
    fn test_tags_union_in_order() {
        let mut draft = OperationDraft::default();
        draft.tags(["A"]).tags(["B", "A"]);
        assert_eq!(draft.tags, vec!["A", "B"]);
    }

    #[test]
    fn test_error_response_last_write_wins() {
        let mut draft = OperationDraft::default();
        draft
            .error(404, OpenApiValue::example::<String>())
            .error(500, OpenApiValue::example::<String>())
            .error(404, OpenApiValue::example::<u32>());

        assert_eq!(draft.errors.len(), 2);
        assert_eq!(draft.errors.keys().next(), Some(&ResponseStatus::Code(404)));
        assert!(matches!(
            &draft.errors[&ResponseStatus::Code(404)],
            OpenApiValue::Example { descriptor, .. } if descriptor.name == "UInt32"
        ));
    }

    #[test]
    fn test_extensions_existing_key_wins() {
        let mut draft = OperationDraft::default();
        draft.extension("x-first", "a").extension("x-first", "b").extension("x-second", true);

        assert_eq!(draft.extensions["x-first"], AnyValue::from("a"));
        assert_eq!(draft.extensions["x-second"], AnyValue::Bool(true));
    }

    #[test]
    fn test_auth_merges_scopes_by_name() {
        let mut draft = OperationDraft::default();
        draft
            .auth(AuthScheme::new(SecurityScheme::bearer(None)).scopes(["read"]))
            .auth(AuthScheme::new(SecurityScheme::bearer(None)).scopes(["write"]))
            .auth(AuthScheme::new(SecurityScheme::basic()));

        assert_eq!(draft.auth.len(), 2);
        assert_eq!(draft.auth[0].scopes, vec!["read", "write"]);
    }

    #[test]
    fn test_generated_path_parameters_are_required_strings() {
        let route = route(|_| {});
        let mut generator = SchemaGenerator::new();
        let operation = build_operation(&route, &mut generator);

        let names: Vec<&str> = operation
            .parameters
            .iter()
            .filter_map(|p| p.as_item())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["petId", "photoId"]);
        for parameter in operation.parameters.iter().filter_map(|p| p.as_item()) {
            assert!(parameter.required);
            assert_eq!(parameter.location, ParameterLocation::Path);
            assert_eq!(parameter.schema, ReferenceOr::Item(Schema::string()));
        }
    }

    #[test]
    fn test_declared_path_parameter_overrides_generated_and_is_required() {
        let route = route(|op| {
            op.path(OpenApiValue::example::<PetPath>());
        });
        let mut generator = SchemaGenerator::new();
        let operation = build_operation(&route, &mut generator);

        let pet_id = operation.parameters[0].as_item().unwrap();
        assert_eq!(pet_id.name, "petId");
        assert!(pet_id.required);
        assert_eq!(pet_id.description.as_deref(), Some("ID of pet"));
        assert_eq!(pet_id.example, Some(AnyValue::Int(10)));
        assert_eq!(operation.parameters.len(), 2);
    }

    #[test]
    fn test_path_parameter_outside_template_is_dropped() {
        let mut routes = RouteTable::new();
        let route = routes
            .add(HttpMethod::Get, "/pets/:petId", |op| {
                op.path(OpenApiValue::example::<PetLookup>());
            })
            .clone();
        let mut generator = SchemaGenerator::new();
        let operation = build_operation(&route, &mut generator);

        let names: Vec<_> = operation
            .parameters
            .iter()
            .filter_map(|p| p.as_item())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["petId"]);
    }

    #[test]
    fn test_default_success_response_and_tag() {
        let route = route(|_| {});
        let mut generator = SchemaGenerator::new();
        let operation = build_operation(&route, &mut generator);

        assert_eq!(operation.tags, vec!["pets"]);
        assert_eq!(operation.operation_id.as_deref(), Some("getPetsByPetIdPhotosByPhotoId"));
        assert_eq!(
            operation.responses,
            IndexMap::from([(
                "200".to_string(),
                ReferenceOr::Item(Response::description_only("Success"))
            )])
        );
    }

    #[test]
    fn test_responses_with_errors() {
        let route = route(|op| {
            op.response(OpenApiValue::example::<String>())
                .response_status(201)
                .error(404, OpenApiValue::example::<String>())
                .error_description(400, "Invalid ID supplied");
        });
        let mut generator = SchemaGenerator::new();
        let operation = build_operation(&route, &mut generator);

        assert_eq!(operation.responses.keys().collect::<Vec<_>>(), vec!["201", "404", "400"]);
        let created = operation.responses["201"].as_item().unwrap();
        assert_eq!(created.description, "Success");
        assert!(created.content.contains_key("text/plain"));
        assert_eq!(operation.responses["404"].as_item().unwrap().description, "Not Found");
    }

    #[test]
    fn test_failing_body_falls_back_to_no_body() {
        let route = route(|op| {
            op.body(OpenApiValue::of_type::<Unrepresentable>())
                .response(OpenApiValue::of_type::<Unrepresentable>())
                .response_description("Pet photo");
        });
        let mut generator = SchemaGenerator::new();
        let operation = build_operation(&route, &mut generator);

        assert!(operation.request_body.is_none());
        assert_eq!(
            operation.responses["200"],
            ReferenceOr::Item(Response::description_only("Pet photo"))
        );
    }

    #[test]
    fn test_security_requirements_and_extensions() {
        let route = route(|op| {
            op.auth(AuthScheme::named("petstore_auth", SecurityScheme::basic()).scopes(["read:pets"]))
                .extension("x-internal", true)
                .deprecated(true)
                .link::<PetId>(Link::new("petId", LinkLocation::Request(crate::links::RequestLocation::Path)));
        });
        let mut generator = SchemaGenerator::new();
        let operation = build_operation(&route, &mut generator);

        assert_eq!(
            operation.security,
            vec![IndexMap::from([("petstore_auth".to_string(), vec!["read:pets".to_string()])])]
        );
        assert_eq!(operation.extensions["x-internal"], AnyValue::Bool(true));
        assert_eq!(operation.deprecated, Some(true));
        assert_eq!(route.docs.links.len(), 1);
    }
}
