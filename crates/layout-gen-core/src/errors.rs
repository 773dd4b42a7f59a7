//! Error types for layout compilation and signing.

use crate::keys::KeyError;

/// Layout compiler errors.
///
/// Every variant carries enough context (field path, alias, step name) to be
/// actionable without inspecting internals.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Config file extension is not one of the supported formats.
    #[error("could not guess the config type of '{path}'")]
    ConfigFormat { path: String },

    /// Config bytes could not be decoded into a document.
    #[error("failed to decode {format} config: {message}")]
    Decode { format: String, message: String },

    /// Malformed or missing config field.
    #[error("invalid config at {field}: {message}")]
    Schema { field: String, message: String },

    /// Expiration expression is neither a duration nor a timestamp.
    #[error("could not parse layout expiration '{value}'")]
    ExpirationFormat { value: String },

    /// A public key alias could not be loaded.
    #[error("failed to resolve key '{alias}': {source}")]
    KeyResolution {
        alias: String,
        #[source]
        source: KeyError,
    },

    /// A step references an alias that is not declared under `keys`.
    #[error("step '{step}' references unknown key alias '{alias}'")]
    UnknownKeyAlias { step: String, alias: String },

    /// Two steps, or a step and an inspection, share a name.
    #[error("duplicate step or inspection name '{name}'")]
    DuplicateName { name: String },

    /// Step threshold below one.
    #[error("step '{step}' has invalid threshold {threshold}: must be at least 1")]
    InvalidThreshold { step: String, threshold: i64 },

    /// Neither the config nor the caller supplied a signing key.
    #[error("no signing key configured: set `signer` in the config or pass --signer")]
    MissingSigningKey,

    /// The signing key could not be loaded.
    #[error("failed to load signing key '{locator}': {source}")]
    SigningKey {
        locator: String,
        #[source]
        source: KeyError,
    },

    /// Signature creation failed.
    #[error("signing failed: {message}")]
    Signing { message: String },

    /// The signed layout could not be written.
    #[error("failed to write layout to '{destination}': {message}")]
    Sink {
        destination: String,
        message: String,
    },
}

impl LayoutError {
    pub(crate) fn schema(field: impl Into<String>, message: impl ToString) -> Self {
        Self::Schema {
            field: field.into(),
            message: message.to_string(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Input issues
            Self::ConfigFormat { .. } | Self::Decode { .. } | Self::Schema { .. } => 2,

            // Layout semantics
            Self::ExpirationFormat { .. }
            | Self::UnknownKeyAlias { .. }
            | Self::DuplicateName { .. }
            | Self::InvalidThreshold { .. } => 3,

            // Key material
            Self::KeyResolution { .. } | Self::MissingSigningKey | Self::SigningKey { .. } => 4,

            // Output
            Self::Signing { .. } | Self::Sink { .. } => 5,
        }
    }
}

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;
