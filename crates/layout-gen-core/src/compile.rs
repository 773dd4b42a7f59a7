//! End-to-end layout generation.
//!
//! ```text
//! Config ─┬─ resolve_expiration ─┐
//!         ├─ resolve_keys ───────┼─ assemble ─ Signer ─ LayoutSink
//!         └─ (tokenize) ─────────┘
//! ```
//!
//! Every stage is fail-fast. The sink only sees fully signed layouts.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::{Config, PrivateKeyRef};
use crate::errors::{LayoutError, LayoutResult};
use crate::expires::resolve_expiration;
use crate::keys::{resolve_keys, KeyError, KeyProvider, KeyType, PrivateKey, Scheme};
use crate::layout::{assemble, Layout};
use crate::signing::{LayoutSink, SignedLayout, Signer, DEFAULT_OUTPUT};

/// Compile a config into an unsigned layout.
pub fn compile_layout<P: KeyProvider + ?Sized>(
    config: &Config,
    now: DateTime<Utc>,
    provider: &P,
) -> LayoutResult<Layout> {
    let expires = resolve_expiration(config.expires.as_deref(), now)?;
    let keys = resolve_keys(&config.keys, provider)?;
    assemble(config, expires, &keys)
}

/// Load the key that signs the layout.
pub fn load_signing_key<P: KeyProvider + ?Sized>(
    key_ref: &PrivateKeyRef,
    provider: &P,
) -> LayoutResult<PrivateKey> {
    let load = || -> Result<PrivateKey, KeyError> {
        let key_type = key_ref
            .key_type
            .as_deref()
            .map(str::parse::<KeyType>)
            .transpose()?;
        let scheme = match (key_ref.scheme.as_deref(), key_type) {
            (Some(hint), Some(key_type)) => Some(Scheme::for_key_type(Some(hint), key_type)?),
            (Some(hint), None) => Some(hint.parse::<Scheme>()?),
            (None, _) => None,
        };
        provider.load_private_key(&key_ref.path, key_type, scheme)
    };

    load().map_err(|source| LayoutError::SigningKey {
        locator: key_ref.path.clone(),
        source,
    })
}

/// Options for [`generate`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Replaces the config's `signer` when set.
    pub signer_override: Option<PrivateKeyRef>,
    /// Sink destination name.
    pub output: String,
    /// Clock used for relative expirations.
    pub now: DateTime<Utc>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            signer_override: None,
            output: DEFAULT_OUTPUT.to_string(),
            now: Utc::now(),
        }
    }
}

/// Compile, sign, and write a layout.
pub fn generate<P, S, K>(
    config: &Config,
    options: &GenerateOptions,
    provider: &P,
    signer: &S,
    sink: &K,
) -> LayoutResult<SignedLayout>
where
    P: KeyProvider + ?Sized,
    S: Signer + ?Sized,
    K: LayoutSink + ?Sized,
{
    let signer_ref = options
        .signer_override
        .as_ref()
        .or(config.signer.as_ref())
        .ok_or(LayoutError::MissingSigningKey)?;

    let layout = compile_layout(config, options.now, provider)?;
    let key = load_signing_key(signer_ref, provider)?;
    let signed = signer.sign(layout, &key)?;
    sink.write(&signed, &options.output)?;

    info!(output = %options.output, keyid = %key.keyid(), "layout generated");
    Ok(signed)
}
