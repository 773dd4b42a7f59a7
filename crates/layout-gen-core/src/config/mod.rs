//! Declarative layout config model.
//!
//! The config is decoded into a generic document first (see [`format`]) and
//! then validated field by field, so every schema error names the offending
//! path (`keys.alice`, `steps[2]`, `inspect[0].run`). String contents are not
//! interpreted here: commands and rules stay as written, key types are only
//! checked when keys are resolved.

pub mod format;

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::{LayoutError, LayoutResult};
use crate::keys::KeyAlias;

pub use format::{decode_document, ConfigFormat};

/// Reference to the private key that signs the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyRef {
    /// Filesystem path or `file://` URI.
    pub path: String,

    /// Key family (`rsa`, `ecdsa`, `ed25519`). Detected from the file when absent.
    #[serde(default)]
    pub key_type: Option<String>,

    /// Signature scheme. Defaults per key family.
    #[serde(default)]
    pub scheme: Option<String>,
}

impl PrivateKeyRef {
    /// Reference a key by locator alone.
    pub fn from_locator(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key_type: None,
            scheme: None,
        }
    }
}

/// Reference to a public key authorized for one or more steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRef {
    /// Filesystem path or `file://` URI.
    pub path: String,

    /// Key family (`rsa`, `ecdsa`, `ed25519`).
    #[serde(default)]
    pub key_type: Option<String>,

    /// Signature scheme. Defaults per key family.
    #[serde(default)]
    pub scheme: Option<String>,
}

fn default_threshold() -> i64 {
    1
}

/// A required supply-chain step, as written in the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,

    /// Range is checked by the assembler, not here.
    #[serde(default = "default_threshold")]
    pub threshold: i64,

    #[serde(default)]
    pub expected_materials: Vec<String>,

    #[serde(default)]
    pub expected_products: Vec<String>,

    /// Key aliases, resolved against [`Config::keys`].
    pub pubkeys: Vec<KeyAlias>,

    /// Empty means no command constraint.
    #[serde(default)]
    pub expected_command: String,
}

/// A post-hoc inspection, as written in the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionConfig {
    pub name: String,

    #[serde(default)]
    pub expected_materials: Vec<String>,

    #[serde(default)]
    pub expected_products: Vec<String>,

    pub run: String,
}

/// Validated layout config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub signer: Option<PrivateKeyRef>,
    pub expires: Option<String>,
    pub readme: Option<String>,
    pub keys: BTreeMap<KeyAlias, PublicKeyRef>,
    pub steps: Vec<StepConfig>,
    pub inspect: Vec<InspectionConfig>,
}

impl Config {
    /// Read, decode, and validate a config file.
    pub fn from_file(path: &Path) -> LayoutResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| LayoutError::Decode {
            format: format.to_string(),
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::parse(&text, format)
    }

    /// Decode and validate config text.
    pub fn parse(text: &str, format: ConfigFormat) -> LayoutResult<Self> {
        Self::from_document(decode_document(text, format)?)
    }

    /// Validate a generic document into a typed config.
    pub fn from_document(document: Value) -> LayoutResult<Self> {
        let mut doc = match document {
            Value::Object(map) => map,
            other => {
                return Err(LayoutError::schema(
                    "config",
                    format!("expected a mapping, found {}", type_name(&other)),
                ))
            }
        };

        let signer = match take(&mut doc, "signer").or_else(|| take(&mut doc, "signing_key")) {
            Some(value) => Some(parse_field::<PrivateKeyRef>(value, "signer")?),
            None => None,
        };

        let expires = match take(&mut doc, "expires") {
            None => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                return Err(LayoutError::schema(
                    "expires",
                    format!(
                        "expected a timestamp or duration string, found {}",
                        type_name(&other)
                    ),
                ))
            }
        };

        let readme = match take(&mut doc, "readme") {
            Some(value) => Some(parse_field::<String>(value, "readme")?),
            None => None,
        };

        let keys = parse_keys(require(&mut doc, "keys")?)?;
        let steps = parse_list(require(&mut doc, "steps")?, "steps", parse_step)?;
        let inspect = parse_list(require(&mut doc, "inspect")?, "inspect", parse_inspection)?;

        for field in doc.keys() {
            warn!(field = %field, "ignoring unknown config field");
        }

        Ok(Self {
            signer,
            expires,
            readme,
            keys,
            steps,
            inspect,
        })
    }
}

/// Remove a field, treating explicit null as absent.
fn take(doc: &mut Map<String, Value>, field: &str) -> Option<Value> {
    doc.remove(field).filter(|v| !v.is_null())
}

fn require(doc: &mut Map<String, Value>, field: &str) -> LayoutResult<Value> {
    take(doc, field).ok_or_else(|| LayoutError::schema(field, "missing required field"))
}

fn parse_field<T: DeserializeOwned>(value: Value, path: &str) -> LayoutResult<T> {
    serde_ignored::deserialize(value, |ignored| {
        warn!(field = %format!("{path}.{ignored}"), "ignoring unknown config field");
    })
    .map_err(|e| LayoutError::schema(path, e))
}

fn parse_keys(value: Value) -> LayoutResult<BTreeMap<KeyAlias, PublicKeyRef>> {
    let Value::Object(map) = value else {
        return Err(LayoutError::schema(
            "keys",
            format!("expected a mapping, found {}", type_name(&value)),
        ));
    };

    map.into_iter()
        .map(|(alias, key)| {
            let key = parse_field::<PublicKeyRef>(key, &format!("keys.{alias}"))?;
            Ok((KeyAlias::new(alias), key))
        })
        .collect()
}

fn parse_list<T>(
    value: Value,
    field: &str,
    parse_item: impl Fn(Value, &str) -> LayoutResult<T>,
) -> LayoutResult<Vec<T>> {
    let Value::Array(items) = value else {
        return Err(LayoutError::schema(
            field,
            format!("expected a sequence, found {}", type_name(&value)),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| parse_item(item, &format!("{field}[{i}]")))
        .collect()
}

fn parse_step(value: Value, path: &str) -> LayoutResult<StepConfig> {
    parse_field(value, path)
}

fn parse_inspection(value: Value, path: &str) -> LayoutResult<InspectionConfig> {
    let inspection: InspectionConfig = parse_field(value, path)?;
    if inspection.run.is_empty() {
        return Err(LayoutError::schema(
            format!("{path}.run"),
            format!("inspection '{}' has an empty run command", inspection.name),
        ));
    }
    Ok(inspection)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
