//! Layout signing and output.
//!
//! # Signed document
//!
//! ```text
//! {"signatures": [{"keyid": <hex>, "sig": <hex>}], "signed": <layout>}
//! ```
//!
//! The signature covers the OLPC canonical JSON bytes of `signed`.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::canonical::to_canonical_vec;
use crate::errors::{LayoutError, LayoutResult};
use crate::keys::{KeyId, PrivateKey};
use crate::layout::Layout;

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "root.layout";

/// One signature over the canonical layout bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSignature {
    pub keyid: KeyId,
    /// Lowercase hex.
    pub sig: String,
}

/// A layout with its signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedLayout {
    pub signatures: Vec<LayoutSignature>,
    pub signed: Layout,
}

/// Canonical bytes of a layout, as signed.
pub fn canonical_bytes(layout: &Layout) -> LayoutResult<Vec<u8>> {
    to_canonical_vec(layout).map_err(|e| LayoutError::Signing {
        message: format!("canonicalization failed: {e}"),
    })
}

/// Produces signed layouts.
pub trait Signer {
    fn sign(&self, layout: Layout, key: &PrivateKey) -> LayoutResult<SignedLayout>;
}

/// Signs the canonical layout bytes with the key's own scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalSigner;

impl Signer for CanonicalSigner {
    fn sign(&self, layout: Layout, key: &PrivateKey) -> LayoutResult<SignedLayout> {
        let payload = canonical_bytes(&layout)?;
        let sig = key.sign(&payload).map_err(|e| LayoutError::Signing {
            message: e.to_string(),
        })?;

        info!(keyid = %key.keyid(), scheme = %key.scheme(), "signed layout");
        Ok(SignedLayout {
            signatures: vec![LayoutSignature {
                keyid: key.keyid().clone(),
                sig: hex::encode(sig),
            }],
            signed: layout,
        })
    }
}

/// Persists signed layouts.
pub trait LayoutSink {
    fn write(&self, layout: &SignedLayout, destination: &str) -> LayoutResult<()>;
}

/// Writes pretty-printed JSON files atomically (temp file + rename).
#[derive(Debug, Clone, Default)]
pub struct FileSink {
    base_dir: Option<PathBuf>,
}

impl FileSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative destinations against `dir` instead of the working directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn target(&self, destination: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(destination),
            None => PathBuf::from(destination),
        }
    }
}

impl LayoutSink for FileSink {
    fn write(&self, layout: &SignedLayout, destination: &str) -> LayoutResult<()> {
        let path = self.target(destination);
        let sink_err = |message: String| LayoutError::Sink {
            destination: path.display().to_string(),
            message,
        };

        let mut json = serde_json::to_string_pretty(layout).map_err(|e| sink_err(e.to_string()))?;
        json.push('\n');

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| sink_err(format!("failed to create temp file: {e}")))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| sink_err(format!("failed to write temp file: {e}")))?;

        // Temp files are created 0600; layouts are public documents.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(|e| sink_err(format!("failed to set permissions: {e}")))?;
        }

        tmp.persist(&path)
            .map_err(|e| sink_err(format!("failed to rename temp file: {}", e.error)))?;

        info!(path = %path.display(), "wrote signed layout");
        Ok(())
    }
}
