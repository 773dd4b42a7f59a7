//! Supply-chain layout compiler.
//!
//! Turns a declarative TOML/YAML policy (steps, inspections, authorized keys,
//! expiration) into a signed in-toto layout:
//!
//! - [`config`]: typed config model with defaults and field-level validation
//! - [`expires`]: relative and absolute expiration resolution
//! - [`tokens`]: space-split of commands and artifact rules
//! - [`canonical`]: canonical JSON bytes for key ids and signatures
//! - [`keys`]: key aliases, key ids, and the [`KeyProvider`] capability
//! - [`layout`]: the pure assembler
//! - [`signing`]: [`Signer`] and [`LayoutSink`] collaborators
//!
//! # Quick Start
//!
//! ```no_run
//! use layout_gen_core::{
//!     generate, CanonicalSigner, Config, FileKeyProvider, FileSink, GenerateOptions,
//! };
//!
//! # fn example() -> Result<(), layout_gen_core::LayoutError> {
//! let config = Config::from_file(std::path::Path::new("layout.toml"))?;
//! let signed = generate(
//!     &config,
//!     &GenerateOptions::default(),
//!     &FileKeyProvider::new(),
//!     &CanonicalSigner,
//!     &FileSink::new(),
//! )?;
//! println!("signed by {}", signed.signatures[0].keyid);
//! # Ok(())
//! # }
//! ```

pub mod canonical;
pub mod compile;
pub mod config;
pub mod errors;
pub mod expires;
pub mod keys;
pub mod layout;
pub mod signing;
pub mod tokens;

pub use compile::{compile_layout, generate, load_signing_key, GenerateOptions};
pub use config::{
    decode_document, Config, ConfigFormat, InspectionConfig, PrivateKeyRef, PublicKeyRef,
    StepConfig,
};
pub use errors::{LayoutError, LayoutResult};
pub use expires::resolve_expiration;
pub use keys::{
    resolve_keys, FileKeyProvider, KeyAlias, KeyError, KeyId, KeyProvider, KeyType, PrivateKey,
    PublicKey, ResolvedKeys, Scheme,
};
pub use layout::{assemble, Inspection, Layout, Step};
pub use signing::{
    canonical_bytes, CanonicalSigner, FileSink, LayoutSignature, LayoutSink, SignedLayout, Signer,
    DEFAULT_OUTPUT,
};
pub use tokens::tokenize;
