//! Extract Command
//!
//! Usage:
//!   descry extract <file> [--mode adaptive] [--format text|json|yaml] [--limit N]
//!
//! `-` reads the text from stdin. Ctrl-C cancels the run.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::load_config;
use crate::cli::Output;
use crate::config::ProcessingMode;
use crate::orchestrator::MultiEngineManager;
use crate::types::{DescryError, ProcessingResult, Result};

pub struct ExtractOptions<'a> {
    pub input: &'a Path,
    pub mode: Option<ProcessingMode>,
    pub format: &'a str,
    pub limit: Option<usize>,
    pub config_path: Option<&'a Path>,
}

pub async fn run(options: ExtractOptions<'_>) -> Result<()> {
    let config = load_config(options.config_path)?;
    let mode = options.mode.unwrap_or(config.runtime.default_mode);
    let text = read_input(options.input)?;
    debug!(input = %options.input.display(), chars = text.chars().count(), "Input loaded");

    let manager = MultiEngineManager::new(config)?;
    let result = manager
        .extract_until(&text, mode, async {
            // A failed signal handler install means the run simply cannot be interrupted
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await?;

    match options.format {
        "text" => Output::new().result(&result, options.limit),
        format => println!("{}", render(&result, format)?),
    }
    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    if !input.exists() {
        return Err(DescryError::config(format!(
            "Input file not found: {}",
            input.display()
        )));
    }
    Ok(std::fs::read_to_string(input)?)
}

/// Serialize a result as json or yaml
pub fn render(result: &ProcessingResult, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(result)?),
        "yaml" => Ok(serde_yaml::to_string(result)?),
        other => Err(DescryError::config(format!(
            "Unknown output format '{}'. Valid values: text, json, yaml",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_formats() {
        let result = ProcessingResult::empty(ProcessingMode::Single, "short");
        let json = render(&result, "json").unwrap();
        assert!(json.contains("\"mode\": \"single\""));
        assert!(render(&result, "yaml").unwrap().contains("mode: single"));
        assert!(render(&result, "xml").is_err());
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, DescryError::Config(_)));
    }

    #[test]
    fn test_reads_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapter.txt");
        std::fs::write(&path, "The hall lay silent.").unwrap();
        assert_eq!(read_input(&path).unwrap(), "The hall lay silent.");
    }
}
