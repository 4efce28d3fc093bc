//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/descry/config.toml)
//! 3. Project config (.descry/config.toml)
//! 4. Environment variables (DESCRY_*)
//!
//! Reload is always explicit; nothing here watches files.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
