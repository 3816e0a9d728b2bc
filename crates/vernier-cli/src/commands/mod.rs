pub mod config;
pub mod measure;
pub mod run;
pub mod sources;

use std::path::Path;

use anyhow::{Context, Result};
use vernier_core::config::ViewerConfig;

/// Config from `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}
