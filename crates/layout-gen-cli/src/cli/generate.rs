//! `layout-gen <config>` - compile, sign, and write a layout.

use anyhow::{Context, Result};

use layout_gen_core::{
    generate, CanonicalSigner, Config, FileKeyProvider, FileSink, GenerateOptions, LayoutError,
    PrivateKeyRef,
};

use super::args::Cli;
use crate::exit_codes;

pub fn cmd_generate(args: Cli) -> i32 {
    match run_generate(args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            e.downcast_ref::<LayoutError>()
                .map(LayoutError::exit_code)
                .unwrap_or(exit_codes::INTERNAL_ERROR)
        }
    }
}

fn run_generate(args: Cli) -> Result<()> {
    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load config: {}", args.config.display()))?;

    let signer_override = args.signer.map(|locator| PrivateKeyRef {
        key_type: args.signer_key_type,
        ..PrivateKeyRef::from_locator(locator)
    });

    let options = GenerateOptions {
        signer_override,
        output: args.output_layout,
        ..GenerateOptions::default()
    };

    let signed = generate(
        &config,
        &options,
        &FileKeyProvider::new(),
        &CanonicalSigner,
        &FileSink::new(),
    )?;

    println!("Signed layout written: {}", options.output);
    println!("  steps:       {}", signed.signed.steps.len());
    println!("  inspections: {}", signed.signed.inspect.len());
    println!("  keys:        {}", signed.signed.keys.len());
    if let Some(expires) = &signed.signed.expires {
        println!("  expires:     {expires}");
    }
    for sig in &signed.signatures {
        println!("  signed by:   {}", sig.keyid);
    }

    Ok(())
}
