//! End-to-end layout generation against real key files.

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use tempfile::TempDir;

use layout_gen_core::{
    canonical_bytes, generate, CanonicalSigner, Config, ConfigFormat, FileKeyProvider, FileSink,
    GenerateOptions, KeyType, LayoutError, SignedLayout, DEFAULT_OUTPUT,
};

struct Fixture {
    dir: TempDir,
    owner: ed25519_dalek::VerifyingKey,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();

        let owner = ed25519_dalek::SigningKey::generate(&mut rand::thread_rng());
        std::fs::write(
            dir.path().join("owner.pem"),
            owner.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes(),
        )
        .unwrap();

        let alice = ed25519_dalek::SigningKey::generate(&mut rand::thread_rng());
        std::fs::write(
            dir.path().join("alice.pub"),
            alice
                .verifying_key()
                .to_public_key_pem(LineEnding::LF)
                .unwrap(),
        )
        .unwrap();

        let bob = p256::SecretKey::random(&mut rand::thread_rng());
        std::fs::write(
            dir.path().join("bob.pub"),
            bob.public_key().to_public_key_pem(LineEnding::LF).unwrap(),
        )
        .unwrap();

        Self {
            owner: owner.verifying_key(),
            dir,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn p(&self, name: &str) -> String {
        self.path(name).display().to_string()
    }

    fn toml_config(&self) -> String {
        format!(
            r#"
expires = "10d"
readme = "Build and package the release"

[signer]
path = "{owner}"
key_type = "ed25519"

[keys.alice]
path = "{alice}"
key_type = "ed25519"

[keys.bob]
path = "{bob}"
key_type = "ecdsa"

[[steps]]
name = "clone"
expected_products = ["CREATE src/*"]
pubkeys = ["alice"]
expected_command = "git clone https://example.com/project.git"

[[steps]]
name = "build"
threshold = 2
expected_materials = ["MATCH src/* WITH PRODUCTS FROM clone", "DISALLOW *"]
pubkeys = ["alice", "bob"]
expected_command = "make release"

[[inspect]]
name = "untar"
expected_materials = ["MATCH project.tar.gz WITH PRODUCTS FROM build"]
run = "tar xzf project.tar.gz"
"#,
            owner = self.p("owner.pem"),
            alice = self.p("alice.pub"),
            bob = self.p("bob.pub"),
        )
    }

    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            now: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ..GenerateOptions::default()
        }
    }

    fn run(&self, config: &Config) -> Result<SignedLayout, LayoutError> {
        generate(
            config,
            &self.options(),
            &FileKeyProvider::new(),
            &CanonicalSigner,
            &FileSink::in_dir(self.dir.path()),
        )
    }
}

fn read_output(path: &Path) -> SignedLayout {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_toml_layout_signed_and_written() {
    use ed25519_dalek::Verifier;

    let fx = Fixture::new();
    let config = Config::parse(&fx.toml_config(), ConfigFormat::Toml).unwrap();
    let signed = fx.run(&config).unwrap();

    let written = read_output(&fx.path(DEFAULT_OUTPUT));
    assert_eq!(written, signed);

    let layout = &signed.signed;
    assert_eq!(layout.expires.as_deref(), Some("2024-01-11T00:00:00Z"));
    assert_eq!(layout.readme.as_deref(), Some("Build and package the release"));
    assert_eq!(layout.keys.len(), 2);
    assert_eq!(layout.steps.len(), 2);

    let build = &layout.steps[1];
    assert_eq!(build.threshold, 2);
    assert_eq!(build.expected_command, vec!["make", "release"]);
    assert_eq!(build.pubkeys.len(), 2);
    for keyid in &build.pubkeys {
        assert!(layout.keys.contains_key(keyid), "dangling keyid {keyid}");
    }
    let types: Vec<KeyType> = build.pubkeys.iter().map(|id| layout.keys[id].keytype).collect();
    assert_eq!(types, vec![KeyType::Ed25519, KeyType::Ecdsa]);

    assert_eq!(layout.inspect[0].run, vec!["tar", "xzf", "project.tar.gz"]);

    let sig = hex::decode(&signed.signatures[0].sig).unwrap();
    let sig = ed25519_dalek::Signature::from_slice(&sig).unwrap();
    assert!(fx
        .owner
        .verify(&canonical_bytes(layout).unwrap(), &sig)
        .is_ok());
}

#[test]
fn test_yaml_layout_matches_toml_layout() {
    let fx = Fixture::new();
    let yaml = format!(
        r#"
expires: 10d
readme: Build and package the release
signer:
  path: {owner}
  key_type: ed25519
keys:
  alice:
    path: {alice}
    key_type: ed25519
  bob:
    path: {bob}
    key_type: ecdsa
steps:
  - name: clone
    expected_products: ["CREATE src/*"]
    pubkeys: [alice]
    expected_command: git clone https://example.com/project.git
  - name: build
    threshold: 2
    expected_materials: ["MATCH src/* WITH PRODUCTS FROM clone", "DISALLOW *"]
    pubkeys: [alice, bob]
    expected_command: make release
inspect:
  - name: untar
    expected_materials: ["MATCH project.tar.gz WITH PRODUCTS FROM build"]
    run: tar xzf project.tar.gz
"#,
        owner = fx.p("owner.pem"),
        alice = fx.p("alice.pub"),
        bob = fx.p("bob.pub"),
    );

    let from_yaml = fx
        .run(&Config::parse(&yaml, ConfigFormat::Yaml).unwrap())
        .unwrap();
    let from_toml = fx
        .run(&Config::parse(&fx.toml_config(), ConfigFormat::Toml).unwrap())
        .unwrap();

    assert_eq!(
        canonical_bytes(&from_yaml.signed).unwrap(),
        canonical_bytes(&from_toml.signed).unwrap()
    );
}

#[test]
fn test_config_from_file_detects_format() {
    let fx = Fixture::new();
    let path = fx.path("layout.toml");
    std::fs::write(&path, fx.toml_config()).unwrap();
    assert!(Config::from_file(&path).is_ok());

    let bad = fx.path("layout.ini");
    std::fs::write(&bad, fx.toml_config()).unwrap();
    assert!(matches!(
        Config::from_file(&bad),
        Err(LayoutError::ConfigFormat { .. })
    ));
}

#[test]
fn test_missing_key_file_writes_nothing() {
    let fx = Fixture::new();
    std::fs::remove_file(fx.path("bob.pub")).unwrap();
    let config = Config::parse(&fx.toml_config(), ConfigFormat::Toml).unwrap();

    match fx.run(&config).unwrap_err() {
        LayoutError::KeyResolution { alias, .. } => assert_eq!(alias, "bob"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!fx.path(DEFAULT_OUTPUT).exists());
}

#[test]
fn test_duplicate_names_write_nothing() {
    let fx = Fixture::new();
    let toml = fx.toml_config().replace("name = \"untar\"", "name = \"build\"");
    let config = Config::parse(&toml, ConfigFormat::Toml).unwrap();

    assert!(matches!(
        fx.run(&config),
        Err(LayoutError::DuplicateName { name }) if name == "build"
    ));
    assert!(!fx.path(DEFAULT_OUTPUT).exists());
}
