//! OpenAPI document model and loader
//!
//! The analyzers never parse anything themselves; they consume a
//! [`SpecDocument`] built here from a JSON or YAML file.

mod model;
mod ordered_map;

pub use model::{
    Components, HttpMethod, Info, MediaType, Operation, OperationRef, Parameter, PathItem,
    RequestBody, Response, Schema, SchemaType, SecurityRequirement, Server, SpecDocument,
};
pub use ordered_map::OrderedMap;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a specification document
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Failed to read specification file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0} is not an OpenAPI document (missing 'openapi' or 'swagger' field)")]
    NotOpenApi(String),
}

/// Serialization format of a specification file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

impl SpecDocument {
    /// Parse a document held in memory
    pub fn parse(contents: &str, format: DocumentFormat) -> Result<Self, SpecError> {
        let doc = match format {
            DocumentFormat::Json => serde_json::from_str(contents)?,
            DocumentFormat::Yaml => serde_yaml::from_str(contents)?,
        };
        Ok(doc)
    }

    /// Load a document from disk, choosing the format by extension.
    ///
    /// Unknown extensions are parsed as YAML, which also accepts JSON.
    pub fn from_file(path: &Path) -> Result<Self, SpecError> {
        let format = DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Yaml);
        Self::read(path, format)
    }

    /// Load a document from disk in a known format
    pub fn read(path: &Path, format: DocumentFormat) -> Result<Self, SpecError> {
        let contents = std::fs::read_to_string(path)?;
        debug!("Loading {:?} document: {}", format, path.display());
        Self::parse(&contents, format)
    }

    /// Load a document found by directory discovery. Files that are not
    /// OpenAPI documents (CI configs, package manifests...) are rejected.
    pub fn load_discovered(path: &Path, format: DocumentFormat) -> Result<Self, SpecError> {
        let doc = Self::read(path, format)?;
        if !doc.is_openapi() {
            return Err(SpecError::NotOpenApi(path.display().to_string()));
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("api.json")), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path(Path::new("api.YML")), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("api.yaml")), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("README.md")), None);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "openapi": "3.1.0",
            "paths": {
                "/health": { "get": { "responses": { "200": { "description": "ok" } } } }
            }
        }"#;
        let doc = SpecDocument::parse(json, DocumentFormat::Json).unwrap();
        assert!(doc.is_openapi());
        assert_eq!(doc.operation_count(), 1);
    }

    #[test]
    fn test_load_discovered_rejects_non_openapi() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ci.yml");
        std::fs::write(&path, "jobs:\n  build: {}\n").unwrap();

        assert!(SpecDocument::from_file(&path).is_ok());
        assert!(matches!(
            SpecDocument::load_discovered(&path, DocumentFormat::Yaml),
            Err(SpecError::NotOpenApi(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = SpecDocument::parse("{ not json", DocumentFormat::Json).unwrap_err();
        assert!(matches!(err, SpecError::Json(_)));
    }
}
