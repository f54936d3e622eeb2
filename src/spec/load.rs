use super::build::build_schema_table;
use super::types::SchemaTable;
use crate::error::{GenerateError, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Load the API description at `path` and build its schema table
///
/// YAML is assumed for `.yaml`/`.yml` files, JSON otherwise.
///
/// # Errors
///
/// - [`GenerateError::NotFound`] when the path does not resolve
/// - [`GenerateError::MalformedDescription`] when the text does not parse or is
///   structurally invalid
pub fn load_schema_table(path: &Path) -> Result<SchemaTable> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GenerateError::NotFound {
            path: path.to_path_buf(),
        },
        _ => GenerateError::from_io(path, e),
    })?;
    let is_yaml = path
        .extension()
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);
    let table = parse_schema_table(&content, is_yaml)?;
    info!(path = %path.display(), schemas = table.len(), "loaded API description");
    Ok(table)
}

/// Parse description text and build its schema table
///
/// # Errors
///
/// Returns [`GenerateError::MalformedDescription`] when the text does not parse
/// or is structurally invalid.
pub fn parse_schema_table(content: &str, is_yaml: bool) -> Result<SchemaTable> {
    let value: Value = if is_yaml {
        serde_yaml::from_str(content)
            .map_err(|e| GenerateError::malformed("<document>", e.to_string()))?
    } else {
        serde_json::from_str(content)
            .map_err(|e| GenerateError::malformed("<document>", e.to_string()))?
    };
    build_schema_table(&value)
}
