//! Filesystem-backed key provider.
//!
//! Public keys: SPKI PEM for every family, PKCS#1 PEM for RSA, and the
//! securesystemslib JSON shape for Ed25519 and ECDSA. Private keys: PKCS#8 PEM for
//! every family, PKCS#1 PEM for RSA, SEC1 PEM for ECDSA. Encrypted keys are
//! not supported.

use std::fs;
use std::path::PathBuf;

use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

use super::{KeyError, KeyProvider, KeyType, PrivateKey, PublicKey, Scheme};

/// Loads keys from local files. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileKeyProvider;

impl FileKeyProvider {
    pub fn new() -> Self {
        Self
    }
}

impl KeyProvider for FileKeyProvider {
    fn load_public_key(
        &self,
        locator: &str,
        key_type: KeyType,
        scheme: Scheme,
    ) -> Result<PublicKey, KeyError> {
        let path = locator_path(locator)?;
        let text = read_key(&path)?;
        let parse_err = |reason: String| KeyError::Parse {
            path: path.display().to_string(),
            key_type: key_type.to_string(),
            reason,
        };

        let public = match key_type {
            KeyType::Rsa => {
                let key = RsaPublicKey::from_public_key_pem(text.trim())
                    .or_else(|_| RsaPublicKey::from_pkcs1_pem(text.trim()))
                    .map_err(|e| parse_err(e.to_string()))?;
                key.to_public_key_pem(LineEnding::LF)
                    .map_err(|e| KeyError::Encode(e.to_string()))?
            }
            KeyType::Ecdsa => {
                let pem = json_keyval_public(&text)
                    .map_err(parse_err)?
                    .unwrap_or_else(|| text.trim().to_string());
                let key = p256::PublicKey::from_public_key_pem(pem.trim())
                    .map_err(|e| parse_err(e.to_string()))?;
                key.to_public_key_pem(LineEnding::LF)
                    .map_err(|e| KeyError::Encode(e.to_string()))?
            }
            KeyType::Ed25519 => ed25519_public_hex(&text).map_err(parse_err)?,
        };

        let key = PublicKey::new(key_type, scheme, public)?;
        debug!(path = %path.display(), keytype = %key_type, keyid = %key.keyid, "loaded public key");
        Ok(key)
    }

    fn load_private_key(
        &self,
        locator: &str,
        key_type: Option<KeyType>,
        scheme: Option<Scheme>,
    ) -> Result<PrivateKey, KeyError> {
        let path = locator_path(locator)?;
        let text = read_key(&path)?;
        let pem = text.trim();

        // An explicit scheme pins the family when no type was given.
        let key_type = key_type.or_else(|| scheme.map(Scheme::key_type));

        let key = match key_type {
            Some(KeyType::Rsa) => {
                let material = parse_rsa_private(pem)
                    .map_err(|reason| parse_failure(&path, KeyType::Rsa.as_str(), reason))?;
                PrivateKey::from_rsa(material, scheme)?
            }
            Some(KeyType::Ecdsa) => {
                let material = parse_ecdsa_private(pem)
                    .map_err(|reason| parse_failure(&path, KeyType::Ecdsa.as_str(), reason))?;
                PrivateKey::from_ecdsa(material, scheme)?
            }
            Some(KeyType::Ed25519) => {
                let material = ed25519_dalek::SigningKey::from_pkcs8_pem(pem).map_err(|e| {
                    parse_failure(&path, KeyType::Ed25519.as_str(), e.to_string())
                })?;
                PrivateKey::from_ed25519(material, scheme)?
            }
            None => detect_private(pem)
                .ok_or_else(|| {
                    parse_failure(
                        &path,
                        "private",
                        "not an rsa, ecdsa, or ed25519 private key".to_string(),
                    )
                })??,
        };

        debug!(path = %path.display(), keytype = %key.key_type(), keyid = %key.keyid(), "loaded private key");
        Ok(key)
    }
}

/// Map a locator to a filesystem path.
fn locator_path(locator: &str) -> Result<PathBuf, KeyError> {
    if let Some(rest) = locator.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if locator.contains("://") {
        return Err(KeyError::UnsupportedLocator(locator.to_string()));
    }
    Ok(PathBuf::from(locator))
}

fn read_key(path: &std::path::Path) -> Result<String, KeyError> {
    fs::read_to_string(path).map_err(|source| KeyError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_failure(path: &std::path::Path, key_type: &str, reason: String) -> KeyError {
    KeyError::Parse {
        path: path.display().to_string(),
        key_type: key_type.to_string(),
        reason,
    }
}

fn parse_rsa_private(pem: &str) -> Result<RsaPrivateKey, String> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| e.to_string())
}

fn parse_ecdsa_private(pem: &str) -> Result<p256::ecdsa::SigningKey, String> {
    if let Ok(key) = p256::ecdsa::SigningKey::from_pkcs8_pem(pem) {
        return Ok(key);
    }
    p256::SecretKey::from_sec1_pem(pem)
        .map(p256::ecdsa::SigningKey::from)
        .map_err(|e| e.to_string())
}

/// Try each family's decoder in a fixed order.
fn detect_private(pem: &str) -> Option<Result<PrivateKey, KeyError>> {
    if let Ok(key) = ed25519_dalek::SigningKey::from_pkcs8_pem(pem) {
        return Some(PrivateKey::from_ed25519(key, None));
    }
    if let Ok(key) = parse_ecdsa_private(pem) {
        return Some(PrivateKey::from_ecdsa(key, None));
    }
    if let Ok(key) = parse_rsa_private(pem) {
        return Some(PrivateKey::from_rsa(key, None));
    }
    None
}

/// `keyval.public` of a securesystemslib JSON key file, `None` for non-JSON text.
fn json_keyval_public(text: &str) -> Result<Option<String>, String> {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return Ok(None);
    }
    let doc: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
    doc.pointer("/keyval/public")
        .and_then(|v| v.as_str())
        .map(|public| Some(public.to_string()))
        .ok_or_else(|| "missing keyval.public".to_string())
}

/// Accepts SPKI PEM or `{"keytype": "ed25519", "keyval": {"public": "<hex>"}}`.
fn ed25519_public_hex(text: &str) -> Result<String, String> {
    let trimmed = text.trim();
    let bytes: [u8; 32] = if let Some(public) = json_keyval_public(trimmed)? {
        hex::decode(public)
            .map_err(|e| e.to_string())?
            .try_into()
            .map_err(|_| "public key must be 32 bytes".to_string())?
    } else {
        ed25519_dalek::VerifyingKey::from_public_key_pem(trimmed)
            .map_err(|e| e.to_string())?
            .to_bytes()
    };

    let key = ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(|e| e.to_string())?;
    Ok(hex::encode(key.as_bytes()))
}
