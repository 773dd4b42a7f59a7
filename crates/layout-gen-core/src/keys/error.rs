use super::KeyType;

/// Key loading and signing errors.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("no key type given")]
    MissingKeyType,

    #[error("unsupported key type '{0}'")]
    UnsupportedKeyType(String),

    #[error("unknown signature scheme '{0}'")]
    UnknownScheme(String),

    #[error("scheme '{scheme}' is not valid for {key_type} keys")]
    UnsupportedScheme { scheme: String, key_type: KeyType },

    #[error("unsupported key locator '{0}': expected a path or file:// URI")]
    UnsupportedLocator(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {key_type} key from {path}: {reason}")]
    Parse {
        path: String,
        key_type: String,
        reason: String,
    },

    #[error("failed to encode key: {0}")]
    Encode(String),

    #[error("signature operation failed: {0}")]
    Sign(String),
}
