//! Alias → key id resolution.

use std::collections::BTreeMap;

use tracing::debug;

use super::{KeyAlias, KeyError, KeyId, KeyProvider, KeyType, PublicKey, Scheme};
use crate::config::PublicKeyRef;
use crate::errors::{LayoutError, LayoutResult};

/// Keys resolved from a config's `keys` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedKeys {
    table: BTreeMap<KeyId, PublicKey>,
    ids: BTreeMap<KeyAlias, KeyId>,
}

impl ResolvedKeys {
    /// Identifier-indexed key table for the layout.
    pub fn table(&self) -> &BTreeMap<KeyId, PublicKey> {
        &self.table
    }

    pub fn id_for(&self, alias: &KeyAlias) -> Option<&KeyId> {
        self.ids.get(alias)
    }

    /// Rewrite a step's key aliases to key ids, preserving order.
    pub fn rewrite(&self, step: &str, aliases: &[KeyAlias]) -> LayoutResult<Vec<KeyId>> {
        aliases
            .iter()
            .map(|alias| {
                self.id_for(alias)
                    .cloned()
                    .ok_or_else(|| LayoutError::UnknownKeyAlias {
                        step: step.to_string(),
                        alias: alias.to_string(),
                    })
            })
            .collect()
    }

    fn insert(&mut self, alias: KeyAlias, key: PublicKey) {
        self.ids.insert(alias, key.keyid.clone());
        self.table.insert(key.keyid.clone(), key);
    }
}

/// Resolve every alias through `provider`.
///
/// Aliases are visited in lexicographic order. Distinct aliases naming the
/// same key collapse into one table entry.
pub fn resolve_keys<P: KeyProvider + ?Sized>(
    keys: &BTreeMap<KeyAlias, PublicKeyRef>,
    provider: &P,
) -> LayoutResult<ResolvedKeys> {
    let mut resolved = ResolvedKeys::default();

    for (alias, key_ref) in keys {
        let key = load(key_ref, provider).map_err(|source| LayoutError::KeyResolution {
            alias: alias.to_string(),
            source,
        })?;

        debug!(alias = %alias, keyid = %key.keyid, "resolved key alias");
        resolved.insert(alias.clone(), key);
    }

    Ok(resolved)
}

fn load<P: KeyProvider + ?Sized>(key_ref: &PublicKeyRef, provider: &P) -> Result<PublicKey, KeyError> {
    let key_type: KeyType = key_ref
        .key_type
        .as_deref()
        .ok_or(KeyError::MissingKeyType)?
        .parse()?;
    let scheme = Scheme::for_key_type(key_ref.scheme.as_deref(), key_type)?;
    provider.load_public_key(&key_ref.path, key_type, scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PrivateKey;

    /// Serves a fixed public value per locator.
    struct StaticProvider;

    impl KeyProvider for StaticProvider {
        fn load_public_key(
            &self,
            locator: &str,
            key_type: KeyType,
            scheme: Scheme,
        ) -> Result<PublicKey, KeyError> {
            match locator {
                "missing.pub" => Err(KeyError::Io {
                    path: locator.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                }),
                _ => PublicKey::new(key_type, scheme, format!("public:{locator}")),
            }
        }

        fn load_private_key(
            &self,
            _locator: &str,
            _key_type: Option<KeyType>,
            _scheme: Option<Scheme>,
        ) -> Result<PrivateKey, KeyError> {
            unreachable!("resolver never loads private keys")
        }
    }

    fn key_ref(path: &str, key_type: Option<&str>) -> PublicKeyRef {
        PublicKeyRef {
            path: path.to_string(),
            key_type: key_type.map(str::to_string),
            scheme: None,
        }
    }

    fn rsa_ref(path: &str) -> PublicKeyRef {
        key_ref(path, Some("rsa"))
    }

    #[test]
    fn test_resolves_and_rewrites() {
        let keys = BTreeMap::from([
            (KeyAlias::new("alice"), rsa_ref("alice.pub")),
            (KeyAlias::new("bob"), rsa_ref("bob.pub")),
        ]);
        let resolved = resolve_keys(&keys, &StaticProvider).unwrap();
        assert_eq!(resolved.table().len(), 2);

        let alice = resolved.id_for(&KeyAlias::new("alice")).unwrap().clone();
        let bob = resolved.id_for(&KeyAlias::new("bob")).unwrap().clone();
        let ids = resolved
            .rewrite("build", &[KeyAlias::new("bob"), KeyAlias::new("alice")])
            .unwrap();
        assert_eq!(ids, vec![bob, alice]);
    }

    #[test]
    fn test_same_key_under_two_aliases_collapses() {
        let keys = BTreeMap::from([
            (KeyAlias::new("alice"), rsa_ref("shared.pub")),
            (KeyAlias::new("release"), rsa_ref("shared.pub")),
        ]);
        let resolved = resolve_keys(&keys, &StaticProvider).unwrap();
        assert_eq!(resolved.table().len(), 1);
        assert_eq!(
            resolved.id_for(&KeyAlias::new("alice")),
            resolved.id_for(&KeyAlias::new("release"))
        );
    }

    #[test]
    fn test_unknown_alias() {
        let keys = BTreeMap::from([(KeyAlias::new("alice"), rsa_ref("alice.pub"))]);
        let resolved = resolve_keys(&keys, &StaticProvider).unwrap();
        let err = resolved
            .rewrite("clone", &[KeyAlias::new("mallory")])
            .unwrap_err();
        match err {
            LayoutError::UnknownKeyAlias { step, alias } => {
                assert_eq!(step, "clone");
                assert_eq!(alias, "mallory");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolution_errors_name_alias() {
        let cases = [
            key_ref("alice.pub", None),
            key_ref("alice.pub", Some("dsa")),
            key_ref("missing.pub", Some("ed25519")),
            PublicKeyRef {
                scheme: Some("ed25519".to_string()),
                ..rsa_ref("alice.pub")
            },
        ];

        for case in cases {
            let keys = BTreeMap::from([(KeyAlias::new("alice"), case)]);
            match resolve_keys(&keys, &StaticProvider).unwrap_err() {
                LayoutError::KeyResolution { alias, .. } => assert_eq!(alias, "alice"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
