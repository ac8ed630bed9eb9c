use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::ApiDocument;
use crate::error::ConfigError;

/// Where the API document comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiSource {
    /// File path, resolved against `basedir` when relative
    Path(PathBuf),
    /// An already parsed document
    Document(Value),
}

impl ApiSource {
    /// The raw document, reading the file when needed.
    pub fn resolve(&self, basedir: &Path) -> Result<Value, ConfigError> {
        match self {
            ApiSource::Document(value) => Ok(value.clone()),
            ApiSource::Path(path) => {
                let full = if path.is_absolute() {
                    path.clone()
                } else {
                    basedir.join(path)
                };
                load_document(&full)
            }
        }
    }
}

impl From<Value> for ApiSource {
    fn from(value: Value) -> Self {
        ApiSource::Document(value)
    }
}

impl From<PathBuf> for ApiSource {
    fn from(path: PathBuf) -> Self {
        ApiSource::Path(path)
    }
}

impl From<&str> for ApiSource {
    fn from(path: &str) -> Self {
        ApiSource::Path(PathBuf::from(path))
    }
}

/// Read a document from disk: YAML for `.yaml`/`.yml`, JSON otherwise.
pub fn load_document(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    debug!(path = %path.display(), yaml = is_yaml, "Loading api document");
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))
    }
}

/// Check the document's shape and deserialize it.
///
/// The document must be an object declaring `swagger: "2.0"` with a `paths`
/// object.
pub fn parse_document(raw: &Value) -> Result<ApiDocument, ConfigError> {
    let obj = raw.as_object().ok_or(ConfigError::ApiNotAnObject)?;
    match obj.get("swagger") {
        Some(Value::String(v)) if v == "2.0" => {}
        Some(other) => {
            let version = other.as_str().map_or_else(|| other.to_string(), str::to_string);
            return Err(ConfigError::UnsupportedVersion(version));
        }
        None => return Err(ConfigError::UnsupportedVersion(String::new())),
    }
    if !obj.get("paths").is_some_and(Value::is_object) {
        return Err(ConfigError::InvalidOption {
            option: "api",
            message: "document has no `paths` object".to_string(),
        });
    }
    Ok(serde_json::from_value(raw.clone())?)
}
