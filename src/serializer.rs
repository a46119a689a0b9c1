//! Serialization of generated documents to YAML or JSON.
//!
//! Map members keep their insertion order, so serializing the same document twice yields
//! byte-identical output.

use crate::document::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Example
///
/// ```
/// use openapi_from_routes::openapi_builder::OpenApiBuilder;
/// use openapi_from_routes::route::RouteTable;
/// use openapi_from_routes::serializer::serialize_yaml;
///
/// let doc = OpenApiBuilder::new().build(&RouteTable::new());
/// let yaml = serialize_yaml(&doc).unwrap();
/// assert!(yaml.contains("openapi:"));
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to pretty-printed JSON.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Writes string content to a file, creating parent directories and overwriting existing content.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
