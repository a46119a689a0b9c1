use crate::components::Components;
use crate::document::{ExternalDocs, Info, OpenApiDocument, PathItem, Response, Server, Tag};
use crate::links::{generate_links, KeyPathCache, LinkEndpoint};
use crate::operation::build_operation;
use crate::projection::{self, OpenApiValue, ResponseStatus};
use crate::route::{Route, RouteTable};
use crate::schema_generator::{ReferenceOr, SchemaGenerator};
use crate::security::AuthScheme;
use crate::version::Version;
use indexmap::IndexMap;
use log::{debug, info, warn};

/// OpenAPI version written to generated documents unless overridden
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";

/// OpenAPI document builder
///
/// Holds the document-level configuration and turns a [`RouteTable`] into one document
/// per specification identifier. Every build starts from fresh component tables; only the
/// key-path cache of detected links is shared between builds.
pub struct OpenApiBuilder {
    /// `openapi` field of the document
    openapi: String,
    /// OpenAPI info section
    info: Info,
    servers: Vec<Server>,
    /// Document tags, listed before the ones collected from routes
    tags: Vec<Tag>,
    external_docs: Option<ExternalDocs>,
    /// Security required by every operation unless overridden
    security: Vec<AuthScheme>,
    /// Responses documented on every operation lacking that status code
    common_errors: IndexMap<ResponseStatus, OpenApiValue>,
    key_paths: KeyPathCache,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            openapi: DEFAULT_OPENAPI_VERSION.to_string(),
            info: Info::default(),
            servers: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            security: Vec::new(),
            common_errors: IndexMap::new(),
            key_paths: KeyPathCache::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: impl Into<String>, version: Version, description: Option<&str>) -> Self {
        self.info = Info {
            title: title.into(),
            version,
            description: description.map(str::to_string),
            ..self.info
        };
        self
    }

    pub fn info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    pub fn openapi_version(mut self, version: impl Into<String>) -> Self {
        self.openapi = version.into();
        self
    }

    pub fn server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn external_docs(mut self, url: impl Into<String>, description: Option<&str>) -> Self {
        self.external_docs = Some(ExternalDocs {
            url: url.into(),
            description: description.map(str::to_string),
        });
        self
    }

    pub fn security(mut self, auth: AuthScheme) -> Self {
        self.security.push(auth);
        self
    }

    /// Documents `value` as the `status` response of every operation that does not declare one
    pub fn common_error(mut self, status: impl Into<ResponseStatus>, value: OpenApiValue) -> Self {
        self.common_errors.insert(status.into(), value);
        self
    }

    pub fn key_path_cache(&self) -> &KeyPathCache {
        &self.key_paths
    }

    /// Distinct specification identifiers used by non-excluded routes, default one first
    pub fn specifications(&self, routes: &RouteTable) -> Vec<Option<String>> {
        let mut specs: Vec<Option<String>> = Vec::new();
        for route in routes.routes().iter().filter(|route| !route.docs.excluded) {
            if !specs.contains(&route.docs.spec) {
                specs.push(route.docs.spec.clone());
            }
        }
        // `None` sorts before every `Some`
        specs.sort();
        specs
    }

    /// Build the document of the default specification
    pub fn build(&self, routes: &RouteTable) -> OpenApiDocument {
        self.build_spec(routes, None)
    }

    /// Build the document for the routes of one specification
    pub fn build_spec(&self, routes: &RouteTable, spec: Option<&str>) -> OpenApiDocument {
        info!("Building OpenAPI document for specification {}", spec.unwrap_or("<default>"));

        let mut selected: Vec<&Route> = routes
            .routes()
            .iter()
            .filter(|route| !route.docs.excluded && route.docs.spec.as_deref() == spec)
            .collect();
        selected.sort_by_cached_key(|route| (route.path_string(), route.method));
        debug!("{} routes selected", selected.len());

        let mut generator = SchemaGenerator::new();
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        let mut route_components = Components::default();
        let mut route_tags: Vec<String> = Vec::new();
        let mut link_endpoints = IndexMap::new();

        for route in &selected {
            let path = route.path_string();
            let operation = build_operation(route, &mut generator);

            for tag in &operation.tags {
                if !route_tags.contains(tag) {
                    route_tags.push(tag.clone());
                }
            }
            for auth in &route.docs.auth {
                route_components
                    .security_schemes
                    .insert(auth.name(), auth.scheme.clone());
            }
            route_components.merge(route.docs.components.clone());
            let key = (path.clone(), route.method);
            if route.docs.links.is_empty() {
                link_endpoints.shift_remove(&key);
            } else {
                let endpoint = LinkEndpoint {
                    path: path.clone(),
                    method: route.method,
                    operation_id: route.operation_id(),
                };
                link_endpoints.insert(key, (endpoint, route.docs.links.clone()));
            }

            paths.entry(path).or_default().set(route.method, operation);
        }

        let common_errors = self.common_error_responses(&mut generator);
        inject_common_errors(&mut paths, &common_errors);

        let mut components = generator.into_components();
        components.merge(route_components);
        for (status, response) in common_errors {
            components.responses.insert(common_error_name(&status), response);
        }
        for auth in &self.security {
            components.security_schemes.insert(auth.name(), auth.scheme.clone());
        }

        let link_endpoints: Vec<_> = link_endpoints.into_values().collect();
        for link in generate_links(&link_endpoints, &self.key_paths) {
            let Some(operation) = paths
                .get_mut(&link.source.path)
                .and_then(|item| item.operation_mut(link.source.method))
            else {
                continue;
            };
            let response = success_response(&mut operation.responses);
            match response {
                Some(response) => {
                    response
                        .links
                        .insert(link.name.clone(), ReferenceOr::component("links", &link.name));
                    components.links.insert(link.name, link.object);
                }
                None => warn!("Cannot attach link {} to a referenced response", link.name),
            }
        }

        let mut tags = self.tags.clone();
        for name in route_tags {
            if !tags.iter().any(|tag| tag.name == name) {
                tags.push(Tag::new(name));
            }
        }

        OpenApiDocument {
            openapi: self.openapi.clone(),
            info: self.info.clone(),
            servers: self.servers.clone(),
            paths,
            components: if components.is_empty() { None } else { Some(components) },
            security: self.security.iter().map(AuthScheme::requirement).collect(),
            tags,
            external_docs: self.external_docs.clone(),
        }
    }

    fn common_error_responses(&self, generator: &mut SchemaGenerator) -> IndexMap<ResponseStatus, Response> {
        self.common_errors
            .iter()
            .map(|(status, value)| {
                let response = projection::response(value, status.reason(), &[], &[], generator)
                    .unwrap_or_else(|err| {
                        warn!("Cannot describe common {} response: {}", status, err);
                        Response::description_only(status.reason())
                    });
                (*status, response)
            })
            .collect()
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Component name of a common error response, e.g. `Error404`
fn common_error_name(status: &ResponseStatus) -> String {
    format!("Error{}", status)
}

fn inject_common_errors(paths: &mut IndexMap<String, PathItem>, errors: &IndexMap<ResponseStatus, Response>) {
    for item in paths.values_mut() {
        for operation in [
            &mut item.get,
            &mut item.put,
            &mut item.post,
            &mut item.delete,
            &mut item.options,
            &mut item.head,
            &mut item.patch,
            &mut item.trace,
        ]
        .into_iter()
        .flatten()
        {
            for status in errors.keys() {
                let key = status.to_string();
                if !operation.responses.contains_key(&key) {
                    operation
                        .responses
                        .insert(key, ReferenceOr::component("responses", &common_error_name(status)));
                }
            }
        }
    }
}

/// The first inline 2xx response, created as `200` when there is none
fn success_response(responses: &mut IndexMap<String, ReferenceOr<Response>>) -> Option<&mut Response> {
    let key = responses
        .keys()
        .find(|key| key.starts_with('2'))
        .cloned()
        .unwrap_or_else(|| "200".to_string());
    match responses
        .entry(key)
        .or_insert_with(|| ReferenceOr::Item(Response::description_only("Success")))
    {
        ReferenceOr::Item(response) => Some(response),
        ReferenceOr::Reference { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::{Link, LinkKey};
    use crate::security::SecurityScheme;
    use crate::type_descriptor::{ApiType, TypeDescriptor, WithExample};
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Serialize)]
    struct ErrorBody {
        reason: String,
    }

    impl ApiType for ErrorBody {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<ErrorBody>("ErrorBody").field::<String>("reason")
        }
    }

    impl WithExample for ErrorBody {
        fn example() -> Self {
            ErrorBody {
                reason: "Something went wrong".to_string(),
            }
        }
    }

    struct ItemId;
    impl LinkKey for ItemId {}

    #[test]
    fn test_new_builder() {
        let document = OpenApiBuilder::new().build(&RouteTable::new());

        assert_eq!(document.openapi, "3.0.3");
        assert_eq!(document.info.title, "Generated API");
        assert_eq!(document.info.version, Version::new(1, 0, 0));
        assert!(document.paths.is_empty());
        assert!(document.components.is_none());
        assert!(document.tags.is_empty());
    }

    #[test]
    fn test_with_info() {
        let document = OpenApiBuilder::new()
            .with_info("My API", Version::new(2, 0, 0), Some("Custom description"))
            .build(&RouteTable::new());

        assert_eq!(document.info.title, "My API");
        assert_eq!(document.info.version.to_string(), "2.0.0");
        assert_eq!(document.info.description.as_deref(), Some("Custom description"));
    }

    #[test]
    fn test_routes_grouped_by_path_and_sorted() {
        let mut routes = RouteTable::new();
        routes.post("/users", |_| {});
        routes.get("/items/:id", |_| {});
        routes.get("/users", |_| {});

        let document = OpenApiBuilder::new().build(&routes);

        assert_eq!(document.paths.keys().collect::<Vec<_>>(), vec!["/items/{id}", "/users"]);
        let users = &document.paths["/users"];
        assert!(users.get.is_some());
        assert!(users.post.is_some());
        assert_eq!(
            document.tags.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>(),
            vec!["items", "users"]
        );
    }

    #[test]
    fn test_duplicate_path_and_method_last_wins() {
        let mut routes = RouteTable::new();
        routes.get("/users", |op| {
            op.summary("first");
        });
        routes.get("/users", |op| {
            op.summary("second");
        });

        let document = OpenApiBuilder::new().build(&routes);
        let get = document.paths["/users"].get.as_ref().unwrap();
        assert_eq!(get.summary.as_deref(), Some("second"));
    }

    #[test]
    fn test_excluded_routes_are_left_out() {
        let mut routes = RouteTable::new();
        routes.get("/users", |_| {});
        routes.get("/internal", |op| {
            op.summary("hidden").exclude();
        });

        let document = OpenApiBuilder::new().build(&routes);
        assert_eq!(document.paths.keys().collect::<Vec<_>>(), vec!["/users"]);
    }

    #[test]
    fn test_specifications_are_independent() {
        let mut routes = RouteTable::new();
        routes.get("/users", |op| {
            op.response(OpenApiValue::example::<ErrorBody>());
        });
        routes.get("/admin/stats", |op| {
            op.spec("admin");
        });
        routes.get("/beta", |op| {
            op.spec("beta");
        });
        routes.get("/hidden", |op| {
            op.spec("hidden").exclude();
        });

        let builder = OpenApiBuilder::new();
        assert_eq!(
            builder.specifications(&routes),
            vec![None, Some("admin".to_string()), Some("beta".to_string())]
        );

        let admin = builder.build_spec(&routes, Some("admin"));
        assert_eq!(admin.paths.keys().collect::<Vec<_>>(), vec!["/admin/stats"]);
        assert!(admin.components.is_none());

        let default = builder.build(&routes);
        assert_eq!(default.paths.keys().collect::<Vec<_>>(), vec!["/users"]);
        assert!(default.components.unwrap().schemas.contains_key("ErrorBody"));
    }

    #[test]
    fn test_security_schemes_collected() {
        let mut routes = RouteTable::new();
        routes.get("/users", |op| {
            op.auth(AuthScheme::new(SecurityScheme::bearer(Some("JWT"))));
        });
        routes.get("/items", |op| {
            op.auth(AuthScheme::new(SecurityScheme::bearer(Some("JWT"))).scopes(["admin"]));
        });

        let document = OpenApiBuilder::new()
            .security(AuthScheme::named("api_key", SecurityScheme::basic()))
            .build(&routes);

        let components = document.components.unwrap();
        assert_eq!(
            components.security_schemes.keys().collect::<Vec<_>>(),
            vec!["http_bearer_JWT", "api_key"]
        );
        assert_eq!(
            document.security,
            vec![IndexMap::from([("api_key".to_string(), Vec::<String>::new())])]
        );
    }

    #[test]
    fn test_common_errors_are_referenced() {
        let mut routes = RouteTable::new();
        routes.get("/users", |_| {});
        routes.get("/items", |op| {
            op.error(404, OpenApiValue::example::<String>());
        });

        let document = OpenApiBuilder::new()
            .common_error(404, OpenApiValue::example::<ErrorBody>())
            .common_error(500, OpenApiValue::example::<ErrorBody>())
            .build(&routes);

        let users = document.paths["/users"].get.as_ref().unwrap();
        assert_eq!(users.responses["404"].reference(), Some("#/components/responses/Error404"));
        assert_eq!(users.responses["500"].reference(), Some("#/components/responses/Error500"));

        let items = document.paths["/items"].get.as_ref().unwrap();
        assert_eq!(items.responses["404"].as_item().unwrap().description, "Not Found");
        assert_eq!(items.responses["500"].reference(), Some("#/components/responses/Error500"));

        let components = document.components.unwrap();
        assert_eq!(components.responses["Error404"].description, "Not Found");
        assert_eq!(components.responses["Error500"].description, "Internal Server Error");
    }

    #[test]
    fn test_links_attached_to_source_response() {
        let mut routes = RouteTable::new();
        routes.post("/items", |op| {
            op.response(OpenApiValue::example::<ErrorBody>())
                .response_status(201)
                .link::<ItemId>(Link::response_body("id"));
        });
        routes.get("/items/:id", |op| {
            op.link::<ItemId>(Link::path("id"));
        });
        routes.delete("/items/:id", |op| {
            op.link::<ItemId>(Link::path("id"));
        });

        let document = OpenApiBuilder::new().build(&routes);

        let post = document.paths["/items"].post.as_ref().unwrap();
        let created = post.responses["201"].as_item().unwrap();
        assert_eq!(
            created.links.keys().collect::<Vec<_>>(),
            vec![
                "ResponseBodyIdGetItemsByIdRequestPathId",
                "ResponseBodyIdDeleteItemsByIdRequestPathId",
            ]
        );
        let components = document.components.unwrap();
        let link = &components.links["ResponseBodyIdGetItemsByIdRequestPathId"];
        assert_eq!(link.operation_id.as_deref(), Some("getItemsById"));
        assert_eq!(link.parameters["id"], "$response.body#/id");
    }

    #[test]
    fn test_replaced_route_drops_its_links() {
        let mut routes = RouteTable::new();
        routes.post("/items", |op| {
            op.response(OpenApiValue::example::<ErrorBody>())
                .link::<ItemId>(Link::response_body("id"));
        });
        routes.post("/items", |op| {
            op.summary("replacement");
        });
        routes.get("/items/:id", |op| {
            op.link::<ItemId>(Link::path("id"));
        });

        let document = OpenApiBuilder::new().build(&routes);

        let post = document.paths["/items"].post.as_ref().unwrap();
        assert_eq!(post.summary.as_deref(), Some("replacement"));
        assert!(post
            .responses
            .values()
            .filter_map(|response| response.as_item())
            .all(|response| response.links.is_empty()));
        assert!(document
            .components
            .map_or(true, |components| components.links.is_empty()));
    }

    #[test]
    fn test_explicit_tags_come_first() {
        let mut routes = RouteTable::new();
        routes.get("/users", |op| {
            op.tags(["accounts"]);
        });
        routes.get("/pets", |_| {});

        let document = OpenApiBuilder::new()
            .tag(Tag {
                description: Some("Everything about your pets".to_string()),
                ..Tag::new("pets")
            })
            .build(&routes);

        assert_eq!(
            document.tags.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>(),
            vec!["pets", "accounts"]
        );
        assert!(document.tags[0].description.is_some());
    }
}
