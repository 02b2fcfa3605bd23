use crate::error::{AipoError, Result};
use crate::yaml;
use serde_json::Value;
use std::path::Path;

/// Load a JSON-or-YAML-subset document into a generic value tree.
///
/// JSON is tried first (every program descriptor is JSON-compatible by
/// contract); anything that fails the JSON parse falls back to the
/// restricted YAML subset used by legacy artifacts.
pub fn read_structured(path: &Path) -> Result<Value> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AipoError::MissingFile(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(_) => yaml::parse_document(&text, path),
    }
}

/// Read a document and require a top-level object.
pub fn read_object(path: &Path) -> Result<Value> {
    let value = read_structured(path)?;
    if !value.is_object() {
        return Err(AipoError::InvalidDocument {
            path: path.to_path_buf(),
            message: "top-level value must be an object".to_string(),
        });
    }
    Ok(value)
}
