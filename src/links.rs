//! Links between operations.
//!
//! A link says that a field returned by one operation can feed a parameter of another.
//! Both sides are declared independently on their routes and tied together by a
//! [`LinkKey`] marker type:
//!
//! ```
//! use openapi_from_routes::links::{Link, LinkKey};
//!
//! struct PetId;
//! impl LinkKey for PetId {}
//!
//! // on `POST /pets`
//! let source = Link::response_body("id");
//! // on `GET /pets/:petId`
//! let target = Link::path("petId");
//! assert!(source.is_source());
//! assert!(!target.is_source());
//! ```
//!
//! When the encoded name of a field is not known up front, [`Link::detect`] finds it by
//! mutating the field on the type's example and diffing the two encodings.

use crate::any_value::encode;
use crate::document::{LinkObject, Server};
use crate::error::{Error, Result};
use crate::route::{up_first, HttpMethod};
use crate::type_descriptor::WithExample;
use indexmap::IndexMap;
use log::{debug, warn};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Marker type identifying one relationship between operations
pub trait LinkKey: 'static {
    fn description() -> Option<String> {
        None
    }

    fn server() -> Option<Server> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestLocation {
    Query,
    Header,
    Path,
    Cookie,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseLocation {
    Header,
    Cookie,
    Body,
}

/// Where the linked value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkLocation {
    Request(RequestLocation),
    Response(ResponseLocation),
}

impl RequestLocation {
    fn as_str(&self) -> &'static str {
        match self {
            RequestLocation::Query => "query",
            RequestLocation::Header => "header",
            RequestLocation::Path => "path",
            RequestLocation::Cookie => "cookie",
            RequestLocation::Body => "body",
        }
    }
}

impl ResponseLocation {
    fn as_str(&self) -> &'static str {
        match self {
            ResponseLocation::Header => "header",
            ResponseLocation::Cookie => "cookie",
            ResponseLocation::Body => "body",
        }
    }
}

impl LinkLocation {
    pub fn is_response(&self) -> bool {
        matches!(self, LinkLocation::Response(_))
    }
}

impl fmt::Display for LinkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkLocation::Request(location) => write!(f, "request.{}", location.as_str()),
            LinkLocation::Response(location) => write!(f, "response.{}", location.as_str()),
        }
    }
}

/// Mutation producing a different value of the same shape
///
/// Used to locate a field inside an encoded example.
pub trait Detectable: Sized + 'static {
    fn another(&self) -> Self;
}

impl Detectable for bool {
    fn another(&self) -> Self {
        !self
    }
}

impl Detectable for String {
    fn another(&self) -> Self {
        if self.is_empty() {
            " ".to_string()
        } else {
            String::new()
        }
    }
}

macro_rules! detectable_integer {
    ($($ty:ty),*) => {
        $(
            impl Detectable for $ty {
                fn another(&self) -> Self {
                    self.wrapping_add(1)
                }
            }
        )*
    };
}

detectable_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Detectable for f32 {
    fn another(&self) -> Self {
        self + 1.0
    }
}

impl Detectable for f64 {
    fn another(&self) -> Self {
        self + 1.0
    }
}

impl Detectable for uuid::Uuid {
    fn another(&self) -> Self {
        uuid::Uuid::new_v4()
    }
}

impl<T: WithExample + 'static> Detectable for Option<T> {
    fn another(&self) -> Self {
        match self {
            Some(_) => None,
            None => Some(T::example()),
        }
    }
}

impl<T: WithExample + 'static> Detectable for Vec<T> {
    fn another(&self) -> Self {
        if self.is_empty() {
            vec![T::example()]
        } else {
            Vec::new()
        }
    }
}

/// Finds the dotted key path of the field `accessor` points at in `T`'s encoded example
pub fn detect_key_path<T: WithExample, F: Detectable>(accessor: fn(&mut T) -> &mut F) -> Result<String> {
    let mut example = T::example();
    let before = encode(&example)?;
    let field = accessor(&mut example);
    *field = field.another();
    let after = encode(&example)?;

    let key = before.first_different_key(&after);
    if key.is_empty() {
        return Err(Error::LinkKeyPathError {
            type_name: std::any::type_name::<T>().to_string(),
            message: "changing the field did not change the encoded example".to_string(),
        });
    }
    debug!("Detected key path {} on {}", key, std::any::type_name::<T>());
    Ok(key)
}

/// Identity of a detected field: root type, field type and accessor
type DetectorKey = (TypeId, TypeId, usize);

#[derive(Clone)]
struct Detector {
    key: DetectorKey,
    detect: Arc<dyn Fn() -> Result<String> + Send + Sync>,
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector").field("key", &self.key).finish()
    }
}

#[derive(Debug, Clone)]
enum LinkField {
    Path(String),
    Detected(Detector),
}

/// One side of a link: a field and where it lives
#[derive(Debug, Clone)]
pub struct Link {
    field: LinkField,
    pub location: LinkLocation,
}

impl Link {
    /// A link on the field at the dotted key path `field`
    pub fn new(field: impl Into<String>, location: LinkLocation) -> Self {
        Self {
            field: LinkField::Path(field.into()),
            location,
        }
    }

    pub fn response_body(field: impl Into<String>) -> Self {
        Self::new(field, LinkLocation::Response(ResponseLocation::Body))
    }

    pub fn response_header(field: impl Into<String>) -> Self {
        Self::new(field, LinkLocation::Response(ResponseLocation::Header))
    }

    pub fn path(field: impl Into<String>) -> Self {
        Self::new(field, LinkLocation::Request(RequestLocation::Path))
    }

    pub fn query(field: impl Into<String>) -> Self {
        Self::new(field, LinkLocation::Request(RequestLocation::Query))
    }

    pub fn request_body(field: impl Into<String>) -> Self {
        Self::new(field, LinkLocation::Request(RequestLocation::Body))
    }

    /// A link on the field `accessor` points at, located by mutate-and-diff on `T::example()`
    pub fn detect<T: WithExample + 'static, F: Detectable>(
        accessor: fn(&mut T) -> &mut F,
        location: LinkLocation,
    ) -> Self {
        let key = (TypeId::of::<T>(), TypeId::of::<F>(), accessor as usize);
        let detect = Arc::new(move || detect_key_path(accessor));
        Self {
            field: LinkField::Detected(Detector { key, detect }),
            location,
        }
    }

    /// Whether this side supplies the value (response-located)
    pub fn is_source(&self) -> bool {
        self.location.is_response()
    }

    /// Resolves the field path, consulting `cache` for detected fields
    pub fn resolve(&self, cache: &KeyPathCache) -> Result<ResolvedLink> {
        let name = match &self.field {
            LinkField::Path(path) => path.clone(),
            LinkField::Detected(detector) => cache.key_path(detector)?,
        };
        Ok(ResolvedLink {
            name,
            location: self.location,
        })
    }
}

/// A link side with a known key path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub name: String,
    pub location: LinkLocation,
}

impl ResolvedLink {
    /// `response.body` + `user.id` becomes `ResponseBodyUserId`
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.location, self.name)
            .split('.')
            .map(up_first)
            .collect()
    }

    /// Runtime expression, e.g. `$response.body#/user/id`
    pub fn expression(&self) -> String {
        format!("${}#/{}", self.location, self.name.replace('.', "/"))
    }
}

/// Memoized key paths of detected fields, shared by every build of one builder
#[derive(Debug, Default)]
pub struct KeyPathCache {
    paths: Mutex<HashMap<DetectorKey, Result<String>>>,
}

impl KeyPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_path(&self, detector: &Detector) -> Result<String> {
        let mut paths = self.paths.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        paths
            .entry(detector.key)
            .or_insert_with(|| (detector.detect)())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.paths.lock().map(|paths| paths.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A link declared on a route under a link key
#[derive(Debug, Clone)]
pub struct LinkDeclaration {
    pub key: TypeId,
    pub key_name: &'static str,
    pub description: Option<String>,
    pub server: Option<Server>,
    pub link: Link,
}

impl LinkDeclaration {
    pub fn new<K: LinkKey>(link: Link) -> Self {
        Self {
            key: TypeId::of::<K>(),
            key_name: std::any::type_name::<K>(),
            description: K::description(),
            server: K::server(),
            link,
        }
    }
}

/// The operation a set of link declarations belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEndpoint {
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: String,
}

/// A link object to register as a component and attach to the source operation's response
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLink {
    pub name: String,
    pub source: LinkEndpoint,
    pub object: LinkObject,
}

struct Side<'a> {
    endpoint: &'a LinkEndpoint,
    declaration: &'a LinkDeclaration,
    resolved: ResolvedLink,
}

/// Pairs every source declaration with every target declaration sharing its link key
///
/// Declarations with no counterpart, or whose field cannot be resolved, are dropped
/// with a warning.
pub fn generate_links(
    endpoints: &[(LinkEndpoint, Vec<LinkDeclaration>)],
    cache: &KeyPathCache,
) -> Vec<GeneratedLink> {
    let mut sources = Vec::new();
    let mut targets = Vec::new();
    for (endpoint, declarations) in endpoints {
        for declaration in declarations {
            let resolved = match declaration.link.resolve(cache) {
                Ok(resolved) => resolved,
                Err(err) => {
                    warn!(
                        "Dropping link {} on {} {}: {}",
                        declaration.key_name, endpoint.method, endpoint.path, err
                    );
                    continue;
                }
            };
            let side = Side {
                endpoint,
                declaration,
                resolved,
            };
            if declaration.link.is_source() {
                sources.push(side);
            } else {
                targets.push(side);
            }
        }
    }

    let mut links = Vec::new();
    for source in &sources {
        let mut matched = false;
        for target in targets.iter().filter(|target| target.declaration.key == source.declaration.key) {
            matched = true;
            let name = format!(
                "{}{}{}",
                source.resolved.identifier(),
                up_first(&target.endpoint.operation_id),
                target.resolved.identifier()
            );
            debug!("Linking {} {} -> {}", source.endpoint.method, source.endpoint.path, name);
            links.push(GeneratedLink {
                name,
                source: source.endpoint.clone(),
                object: LinkObject {
                    operation_id: Some(target.endpoint.operation_id.clone()),
                    parameters: IndexMap::from([(target.resolved.name.clone(), source.resolved.expression())]),
                    request_body: None,
                    description: source.declaration.description.clone(),
                    server: source.declaration.server.clone(),
                },
            });
        }
        if !matched {
            warn!(
                "Link {} on {} {} has no target declaration",
                source.declaration.key_name, source.endpoint.method, source.endpoint.path
            );
        }
    }
    for target in &targets {
        if !sources.iter().any(|source| source.declaration.key == target.declaration.key) {
            warn!(
                "Link {} on {} {} has no source declaration",
                target.declaration.key_name, target.endpoint.method, target.endpoint.path
            );
        }
    }
    links
}
