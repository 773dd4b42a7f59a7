//! Config format detection and decoding into a generic document.
//!
//! Both TOML and YAML decode into a `serde_json::Value` so the config model
//! has a single deserialization path. TOML datetimes have no JSON
//! counterpart and are rendered as RFC 3339 strings.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::errors::{LayoutError, LayoutResult};

/// Supported config serializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Guess the format from the file extension.
    pub fn from_path(path: &Path) -> LayoutResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(LayoutError::ConfigFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => f.write_str("toml"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

/// Decode config text into a generic key/value document.
pub fn decode_document(text: &str, format: ConfigFormat) -> LayoutResult<Value> {
    let decode_err = |message: String| LayoutError::Decode {
        format: format.to_string(),
        message,
    };

    match format {
        ConfigFormat::Toml => {
            let table = text
                .parse::<toml::Table>()
                .map_err(|e| decode_err(e.to_string()))?;
            Ok(toml_to_json(toml::Value::Table(table)))
        }
        ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| decode_err(e.to_string())),
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}
