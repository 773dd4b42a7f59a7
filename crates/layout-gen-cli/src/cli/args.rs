use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "layout-gen",
    version,
    about = "Generate signed in-toto layouts from a TOML or YAML config"
)]
pub struct Cli {
    /// Config file outlining the layout (.toml, .yaml, .yml)
    pub config: PathBuf,

    /// Private key that signs the layout (overrides `signer` in the config)
    #[arg(long, short = 's', env = "LAYOUT_GEN_SIGNER")]
    pub signer: Option<String>,

    /// Key type of --signer (rsa, ecdsa, ed25519); detected when omitted
    #[arg(long, requires = "signer")]
    pub signer_key_type: Option<String>,

    /// Name of the signed layout file
    #[arg(
        long,
        short = 'o',
        env = "LAYOUT_GEN_OUTPUT",
        default_value = layout_gen_core::DEFAULT_OUTPUT
    )]
    pub output_layout: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["layout-gen", "layout.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("layout.toml"));
        assert_eq!(cli.output_layout, "root.layout");
        assert!(cli.signer_key_type.is_none());
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "layout-gen",
            "layout.yml",
            "-s",
            "owner.pem",
            "--signer-key-type",
            "rsa",
            "-o",
            "out.layout",
        ])
        .unwrap();
        assert_eq!(cli.signer.as_deref(), Some("owner.pem"));
        assert_eq!(cli.signer_key_type.as_deref(), Some("rsa"));
        assert_eq!(cli.output_layout, "out.layout");
    }

    #[test]
    fn test_config_required() {
        assert!(Cli::try_parse_from(["layout-gen"]).is_err());
    }
}
