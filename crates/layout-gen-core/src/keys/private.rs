//! Private signing keys.

use std::fmt;

use pkcs8::{EncodePublicKey, LineEnding};
use rsa::pkcs1v15;
use rsa::pss::BlindedSigningKey;
use rsa::sha2::Sha256 as RsaSha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer as _};
use rsa::RsaPrivateKey;

use super::{KeyError, KeyId, KeyType, PublicKey, Scheme};

enum Material {
    Rsa(Box<RsaPrivateKey>),
    Ecdsa(p256::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

/// A private key bound to a signature scheme, with its public half.
pub struct PrivateKey {
    material: Material,
    public: PublicKey,
}

impl PrivateKey {
    pub fn from_rsa(key: RsaPrivateKey, scheme: Option<Scheme>) -> Result<Self, KeyError> {
        let public = key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encode(e.to_string()))?;
        Self::build(Material::Rsa(Box::new(key)), KeyType::Rsa, scheme, public)
    }

    pub fn from_ecdsa(key: p256::ecdsa::SigningKey, scheme: Option<Scheme>) -> Result<Self, KeyError> {
        let public = p256::PublicKey::from(key.verifying_key())
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encode(e.to_string()))?;
        Self::build(Material::Ecdsa(key), KeyType::Ecdsa, scheme, public)
    }

    pub fn from_ed25519(
        key: ed25519_dalek::SigningKey,
        scheme: Option<Scheme>,
    ) -> Result<Self, KeyError> {
        let public = hex::encode(key.verifying_key().as_bytes());
        Self::build(Material::Ed25519(key), KeyType::Ed25519, scheme, public)
    }

    fn build(
        material: Material,
        key_type: KeyType,
        scheme: Option<Scheme>,
        public: String,
    ) -> Result<Self, KeyError> {
        let scheme = scheme.unwrap_or_else(|| key_type.default_scheme());
        let public = PublicKey::new(key_type, scheme, public)?;
        Ok(Self { material, public })
    }

    pub fn key_type(&self) -> KeyType {
        self.public.keytype
    }

    pub fn scheme(&self) -> Scheme {
        self.public.scheme
    }

    pub fn keyid(&self) -> &KeyId {
        &self.public.keyid
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Sign `message` with this key's scheme.
    ///
    /// ECDSA signatures are DER encoded; RSA-PSS uses a digest-length salt.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let sign_err = |e: &dyn fmt::Display| KeyError::Sign(e.to_string());

        match (&self.material, self.public.scheme) {
            (Material::Rsa(key), Scheme::RsassaPssSha256) => {
                let signer = BlindedSigningKey::<RsaSha256>::new(key.as_ref().clone());
                let sig = signer
                    .try_sign_with_rng(&mut rand::thread_rng(), message)
                    .map_err(|e| sign_err(&e))?;
                Ok(sig.to_vec())
            }
            (Material::Rsa(key), Scheme::RsaPkcs1v15Sha256) => {
                let signer = pkcs1v15::SigningKey::<RsaSha256>::new(key.as_ref().clone());
                let sig = signer.try_sign(message).map_err(|e| sign_err(&e))?;
                Ok(sig.to_vec())
            }
            (Material::Ecdsa(key), Scheme::EcdsaSha2Nistp256) => {
                use p256::ecdsa::signature::Signer;
                let sig: p256::ecdsa::Signature =
                    key.try_sign(message).map_err(|e| sign_err(&e))?;
                Ok(sig.to_der().as_bytes().to_vec())
            }
            (Material::Ed25519(key), Scheme::Ed25519) => {
                use ed25519_dalek::Signer;
                let sig = key.try_sign(message).map_err(|e| sign_err(&e))?;
                Ok(sig.to_bytes().to_vec())
            }
            (_, scheme) => Err(KeyError::UnsupportedScheme {
                scheme: scheme.to_string(),
                key_type: self.key_type(),
            }),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("keytype", &self.public.keytype)
            .field("scheme", &self.public.scheme)
            .field("keyid", &self.public.keyid)
            .finish_non_exhaustive()
    }
}
