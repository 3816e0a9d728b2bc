use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use vernier_core::config::ViewerConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save the default ViewerConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = ViewerConfig::default();

    if let Some(ref path) = args.output {
        config
            .save(path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", config.to_toml_string()?);
    }

    Ok(())
}
