//! OpenAPI from routes - OpenAPI 3.0 documents from a documented route table.
//!
//! Routes are registered together with typed documentation: example values for query,
//! header, path, cookie, body and response shapes, security schemes, error responses and
//! link declarations. The builder turns the table into a complete OpenAPI document with
//! de-duplicated schema components and inferred links between operations.
//!
//! # Architecture
//!
//! 1. [`any_value`] - Dynamic encoding of example values
//! 2. [`type_descriptor`] - Describes Rust types to the schema generator
//! 3. [`schema_generator`] - Converts type descriptors to named schema components
//! 4. [`projection`] - Projects values onto parameters, headers, bodies and responses
//! 5. [`links`] - Pairs link declarations across operations
//! 6. [`route`] / [`operation`] - Route table and per-route documentation
//! 7. [`openapi_builder`] - Constructs the complete OpenAPI document
//! 8. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```
//! use openapi_from_routes::{
//!     openapi_builder::OpenApiBuilder,
//!     projection::OpenApiValue,
//!     route::RouteTable,
//!     serializer::serialize_yaml,
//!     type_descriptor::{ApiType, TypeDescriptor, WithExample},
//!     version::Version,
//! };
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Pet {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl ApiType for Pet {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::object::<Pet>("Pet")
//!             .field::<u64>("id")
//!             .field::<String>("name")
//!     }
//! }
//!
//! impl WithExample for Pet {
//!     fn example() -> Self {
//!         Pet { id: 1, name: "Rex".to_string() }
//!     }
//! }
//!
//! let mut routes = RouteTable::new();
//! routes.get("/pets/:petId", |op| {
//!     op.summary("Find pet by ID")
//!         .response(OpenApiValue::example::<Pet>());
//! });
//!
//! let document = OpenApiBuilder::new()
//!     .with_info("Pets", Version::new(1, 0, 0), None)
//!     .build(&routes);
//! assert!(document.paths.contains_key("/pets/{petId}"));
//!
//! let yaml = serialize_yaml(&document).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! The [`cli`] module serves the bundled [`petstore`] route table.

pub mod any_value;
pub mod cli;
pub mod components;
pub mod document;
pub mod error;
pub mod links;
pub mod openapi_builder;
pub mod operation;
pub mod petstore;
pub mod projection;
pub mod route;
pub mod schema_generator;
pub mod security;
pub mod serializer;
pub mod type_descriptor;
pub mod version;
