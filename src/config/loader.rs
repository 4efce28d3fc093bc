//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/descry/config.toml)
//! 3. Project config (.descry/config.toml)
//! 4. Environment variables (DESCRY_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{DescryError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. DESCRY_ENSEMBLE__CONSENSUS_THRESHOLD -> ensemble.consensus_threshold
        figment = figment.merge(Env::prefixed("DESCRY_").split("__").lowercase(true));

        Self::extract(figment)
    }

    /// Load configuration from a specific file only (defaults underneath)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(DescryError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path)),
        )
    }

    /// Parse configuration from a TOML string (defaults underneath)
    pub fn load_from_str(toml: &str) -> Result<Config> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::string(toml)),
        )
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| DescryError::config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/descry/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("descry"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".descry")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render a configuration as json, yaml or toml text
    pub fn render(config: &Config, format: &str) -> Result<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(config)?),
            "yaml" => Ok(serde_yaml::to_string(config)?),
            _ => toml::to_string_pretty(config).map_err(|e| DescryError::config(e.to_string())),
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            DescryError::config("Cannot determine global config directory")
        })?;

        fs::create_dir_all(&global_dir)?;
        Self::write_default(&global_dir.join("config.toml"), force)?;

        Ok(global_dir)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();

        fs::create_dir_all(&project_dir)?;
        Self::write_default(&project_dir.join("config.toml"), force)?;

        Ok(project_dir)
    }

    fn write_default(path: &Path, force: bool) -> Result<()> {
        if !path.exists() || force {
            fs::write(path, Self::default_config_toml())?;
            info!("Created config: {}", path.display());
        } else {
            info!("Config exists: {}", path.display());
        }
        Ok(())
    }

    /// Default config content (TOML)
    fn default_config_toml() -> String {
        r#"# descry configuration
# Project settings in .descry/config.toml override the global file.

version = "1.0"

[runtime]
default_mode = "adaptive"
engine_timeout_secs = 30

[ensemble]
consensus_threshold = 0.6
cluster_overlap = 0.5
dedup_overlap = 0.8

[boundary]
min_length = 100
max_sentences_per_description = 5
min_sentences = 2

[quality.target_length_window]
min = 150
max = 500

[[engines]]
id = "lexicon"
kind = "lexicon"
weight = 1.0
capabilities = ["general"]

[[engines]]
id = "morphology"
kind = "morphology"
weight = 1.2
capabilities = ["morphology"]

[[engines]]
id = "syntax"
kind = "syntax"
weight = 0.8
capabilities = ["robust-syntax"]

[[engines]]
id = "entity"
kind = "entity"
weight = 1.5
enabled = false
capabilities = ["entity-focused"]
"#
        .to_string()
    }
}
