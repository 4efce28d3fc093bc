pub mod config;
pub mod extract;
pub mod status;

use std::path::Path;

use crate::config::{Config, ConfigLoader};
use crate::types::Result;

/// Explicit `--config` file, or the full global → project → env chain
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
