//! Route table consumed by the document assembler.
//!
//! The hosting web framework is treated as a black box that produces [`Route`] records:
//! an HTTP method, a parsed path template and an [`OperationDraft`] that collects the
//! documentation written for the route.
//!
//! # Example
//!
//! ```
//! use openapi_from_routes::route::{HttpMethod, RouteTable};
//!
//! let mut routes = RouteTable::new();
//! routes.add(HttpMethod::Get, "/pets/:petId", |op| {
//!     op.summary("Find pet by ID");
//! });
//!
//! let route = &routes.routes()[0];
//! assert_eq!(route.path_string(), "/pets/{petId}");
//! assert_eq!(route.default_operation_id(), "getPetsByPetId");
//! ```

use crate::operation::OperationDraft;
use std::fmt;
use std::str::FromStr;

/// HTTP methods a route can be registered for.
///
/// Variants are declared in the order operations are listed in a path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP PUT method
    Put,
    /// HTTP POST method
    Post,
    /// HTTP DELETE method
    Delete,
    /// HTTP OPTIONS method
    Options,
    /// HTTP HEAD method
    Head,
    /// HTTP PATCH method
    Patch,
    /// HTTP TRACE method
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "PUT" => Ok(HttpMethod::Put),
            "POST" => Ok(HttpMethod::Post),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            "HEAD" => Ok(HttpMethod::Head),
            "PATCH" => Ok(HttpMethod::Patch),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

/// One segment of a path template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    /// Literal segment (`pets`)
    Constant(String),
    /// Named parameter (`:petId` or `{petId}`)
    Parameter(String),
    /// Single-segment wildcard (`*`)
    Anything,
    /// Multi-segment wildcard (`**`)
    CatchAll,
}

impl PathComponent {
    pub fn parse(segment: &str) -> Self {
        if segment == "*" {
            PathComponent::Anything
        } else if segment == "**" {
            PathComponent::CatchAll
        } else if let Some(name) = segment.strip_prefix(':') {
            PathComponent::Parameter(name.to_string())
        } else if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            PathComponent::Parameter(name.to_string())
        } else {
            PathComponent::Constant(segment.to_string())
        }
    }

    /// Fragment this segment contributes to a default operation id
    fn operation_id_part(&self) -> String {
        match self {
            PathComponent::Constant(constant) => up_first(constant),
            PathComponent::Parameter(name) => format!("By{}", up_first(name)),
            PathComponent::Anything => "_".to_string(),
            PathComponent::CatchAll => "__".to_string(),
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Constant(constant) => f.write_str(constant),
            PathComponent::Parameter(name) => write!(f, "{{{}}}", name),
            PathComponent::Anything => f.write_str("*"),
            PathComponent::CatchAll => f.write_str("**"),
        }
    }
}

/// Parses a path template such as `/pets/:petId` into its segments
pub fn parse_path(path: &str) -> Vec<PathComponent> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(PathComponent::parse)
        .collect()
}

/// Renders segments as an OpenAPI path (`/pets/{petId}`)
pub fn render_path(components: &[PathComponent]) -> String {
    let rendered: Vec<String> = components.iter().map(ToString::to_string).collect();
    format!("/{}", rendered.join("/"))
}

/// Upper-cases the first character
pub fn up_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A registered route and the documentation attached to it
#[derive(Debug, Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub path: Vec<PathComponent>,
    pub docs: OperationDraft,
}

impl Route {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: parse_path(path),
            docs: OperationDraft::default(),
        }
    }

    pub fn path_string(&self) -> String {
        render_path(&self.path)
    }

    /// Names of the path's parameter segments, in order
    pub fn path_parameters(&self) -> Vec<&str> {
        self.path
            .iter()
            .filter_map(|component| match component {
                PathComponent::Parameter(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Lowercased method followed by each path segment with its first letter upper-cased
    pub fn default_operation_id(&self) -> String {
        let mut id = self.method.as_str().to_lowercase();
        for component in &self.path {
            id.push_str(&component.operation_id_part());
        }
        id
    }

    /// Explicit operation id, or the default one
    pub fn operation_id(&self) -> String {
        self.docs
            .operation_id
            .clone()
            .unwrap_or_else(|| self.default_operation_id())
    }

    /// First constant path segment, used as tag when none is declared
    pub fn default_tag(&self) -> Option<&str> {
        self.path.iter().find_map(|component| match component {
            PathComponent::Constant(constant) => Some(constant.as_str()),
            _ => None,
        })
    }
}

/// Ordered collection of routes, as produced by the hosting application
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route and lets `configure` document it
    pub fn add(
        &mut self,
        method: HttpMethod,
        path: &str,
        configure: impl FnOnce(&mut OperationDraft),
    ) -> &mut Route {
        let mut route = Route::new(method, path);
        configure(&mut route.docs);
        self.push(route)
    }

    pub fn get(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Get, path, configure)
    }

    pub fn post(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Post, path, configure)
    }

    pub fn put(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Put, path, configure)
    }

    pub fn delete(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Delete, path, configure)
    }

    pub fn patch(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Patch, path, configure)
    }

    fn push(&mut self, route: Route) -> &mut Route {
        let index = self.routes.len();
        self.routes.push(route);
        &mut self.routes[index]
    }

    /// Opens a group of routes sharing a path prefix and documentation defaults
    pub fn grouped(
        &mut self,
        prefix: &str,
        configure: impl FnOnce(&mut OperationDraft),
    ) -> RouteGroup<'_> {
        let mut defaults = OperationDraft::default();
        configure(&mut defaults);
        RouteGroup {
            table: self,
            prefix: parse_path(prefix),
            defaults,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Routes added through a group get the group's prefix and defaults first
pub struct RouteGroup<'a> {
    table: &'a mut RouteTable,
    prefix: Vec<PathComponent>,
    defaults: OperationDraft,
}

impl RouteGroup<'_> {
    pub fn add(
        &mut self,
        method: HttpMethod,
        path: &str,
        configure: impl FnOnce(&mut OperationDraft),
    ) -> &mut Route {
        let mut components = self.prefix.clone();
        components.extend(parse_path(path));
        let mut route = Route {
            method,
            path: components,
            docs: self.defaults.clone(),
        };
        configure(&mut route.docs);
        self.table.push(route)
    }

    pub fn get(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Get, path, configure)
    }

    pub fn post(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Post, path, configure)
    }

    pub fn put(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Put, path, configure)
    }

    pub fn delete(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Delete, path, configure)
    }

    pub fn patch(&mut self, path: &str, configure: impl FnOnce(&mut OperationDraft)) -> &mut Route {
        self.add(HttpMethod::Patch, path, configure)
    }

    /// Opens a nested group inheriting this group's prefix and defaults
    pub fn grouped(
        &mut self,
        prefix: &str,
        configure: impl FnOnce(&mut OperationDraft),
    ) -> RouteGroup<'_> {
        let mut defaults = self.defaults.clone();
        configure(&mut defaults);
        let mut components = self.prefix.clone();
        components.extend(parse_path(prefix));
        RouteGroup {
            table: &mut *self.table,
            prefix: components,
            defaults,
        }
    }
}
