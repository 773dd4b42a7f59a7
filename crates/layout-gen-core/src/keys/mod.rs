//! Key identities, key families, and the key provider capability.
//!
//! Config files name keys by a local [`KeyAlias`]; the assembled layout only
//! knows [`KeyId`]s. The two are distinct types so one can never stand in for
//! the other.
//!
//! # Key identifiers
//!
//! ```text
//! keyid = hex(sha256(canonical({keyid_hash_algorithms, keytype, keyval: {public}, scheme})))
//! ```

mod error;
mod file;
mod private;
mod resolve;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::to_canonical_vec;

pub use error::KeyError;
pub use file::FileKeyProvider;
pub use private::PrivateKey;
pub use resolve::{resolve_keys, ResolvedKeys};

/// Hash algorithms advertised for key id computation.
pub const KEYID_HASH_ALGORITHMS: [&str; 2] = ["sha256", "sha512"];

/// Config-local key name. Meaningless outside the config that declares it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyAlias(String);

impl KeyAlias {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-derived key identifier (lowercase hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supported key families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Rsa,
    /// NIST P-256.
    Ecdsa,
    Ed25519,
}

impl KeyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Ecdsa => "ecdsa",
            Self::Ed25519 => "ed25519",
        }
    }

    pub fn default_scheme(self) -> Scheme {
        match self {
            Self::Rsa => Scheme::RsassaPssSha256,
            Self::Ecdsa => Scheme::EcdsaSha2Nistp256,
            Self::Ed25519 => Scheme::Ed25519,
        }
    }
}

impl FromStr for KeyType {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rsa" => Ok(Self::Rsa),
            "ecdsa" | "ecdsa-sha2-nistp256" => Ok(Self::Ecdsa),
            "ed25519" => Ok(Self::Ed25519),
            _ => Err(KeyError::UnsupportedKeyType(s.to_string())),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signature schemes. Each belongs to exactly one key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    #[serde(rename = "rsassa-pss-sha256")]
    RsassaPssSha256,
    #[serde(rename = "rsa-pkcs1v15-sha256")]
    RsaPkcs1v15Sha256,
    #[serde(rename = "ecdsa-sha2-nistp256")]
    EcdsaSha2Nistp256,
    #[serde(rename = "ed25519")]
    Ed25519,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RsassaPssSha256 => "rsassa-pss-sha256",
            Self::RsaPkcs1v15Sha256 => "rsa-pkcs1v15-sha256",
            Self::EcdsaSha2Nistp256 => "ecdsa-sha2-nistp256",
            Self::Ed25519 => "ed25519",
        }
    }

    pub fn key_type(self) -> KeyType {
        match self {
            Self::RsassaPssSha256 | Self::RsaPkcs1v15Sha256 => KeyType::Rsa,
            Self::EcdsaSha2Nistp256 => KeyType::Ecdsa,
            Self::Ed25519 => KeyType::Ed25519,
        }
    }

    /// Parse an optional scheme hint for a key family.
    pub fn for_key_type(hint: Option<&str>, key_type: KeyType) -> Result<Self, KeyError> {
        let Some(hint) = hint else {
            return Ok(key_type.default_scheme());
        };
        let scheme: Scheme = hint.parse()?;
        if scheme.key_type() != key_type {
            return Err(KeyError::UnsupportedScheme {
                scheme: hint.to_string(),
                key_type,
            });
        }
        Ok(scheme)
    }
}

impl FromStr for Scheme {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rsassa-pss-sha256" => Ok(Self::RsassaPssSha256),
            "rsa-pkcs1v15-sha256" => Ok(Self::RsaPkcs1v15Sha256),
            "ecdsa-sha2-nistp256" => Ok(Self::EcdsaSha2Nistp256),
            "ed25519" => Ok(Self::Ed25519),
            _ => Err(KeyError::UnknownScheme(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public key value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyVal {
    /// SPKI PEM for rsa/ecdsa, hex of the raw 32 bytes for ed25519.
    pub public: String,
}

/// Public key object as it appears in the layout `keys` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub keyid: KeyId,
    pub keyid_hash_algorithms: Vec<String>,
    pub keytype: KeyType,
    pub keyval: KeyVal,
    pub scheme: Scheme,
}

/// Exactly the fields hashed into a key id.
#[derive(Serialize)]
struct KeyIdInput<'a> {
    keyid_hash_algorithms: &'a [String],
    keytype: KeyType,
    keyval: &'a KeyVal,
    scheme: Scheme,
}

impl PublicKey {
    /// Build a public key object and derive its id.
    pub fn new(keytype: KeyType, scheme: Scheme, public: String) -> Result<Self, KeyError> {
        if scheme.key_type() != keytype {
            return Err(KeyError::UnsupportedScheme {
                scheme: scheme.to_string(),
                key_type: keytype,
            });
        }

        let keyid_hash_algorithms: Vec<String> =
            KEYID_HASH_ALGORITHMS.iter().map(|s| s.to_string()).collect();
        let keyval = KeyVal { public };

        let canonical = to_canonical_vec(&KeyIdInput {
            keyid_hash_algorithms: &keyid_hash_algorithms,
            keytype,
            keyval: &keyval,
            scheme,
        })
        .map_err(|e| KeyError::Encode(e.to_string()))?;
        let keyid = KeyId(hex::encode(Sha256::digest(&canonical)));

        Ok(Self {
            keyid,
            keyid_hash_algorithms,
            keytype,
            keyval,
            scheme,
        })
    }
}

/// Loads key material and derives identifiers.
///
/// Implementations own locator interpretation (paths, URIs, backends).
pub trait KeyProvider {
    /// Load a public key of the given family.
    fn load_public_key(
        &self,
        locator: &str,
        key_type: KeyType,
        scheme: Scheme,
    ) -> Result<PublicKey, KeyError>;

    /// Load a private key. The family is detected when `key_type` is `None`.
    fn load_private_key(
        &self,
        locator: &str,
        key_type: Option<KeyType>,
        scheme: Option<Scheme>,
    ) -> Result<PrivateKey, KeyError>;
}
