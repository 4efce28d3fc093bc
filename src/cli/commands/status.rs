//! Status Command
//!
//! Load the configured engines and report their health.

use std::path::Path;

use console::style;

use super::load_config;
use crate::engine::{CircuitState, EngineStatus};
use crate::orchestrator::MultiEngineManager;
use crate::types::Result;

pub fn run(format: &str, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let default_mode = config.runtime.default_mode;
    let manager = MultiEngineManager::new(config)?;
    let engines = manager.engine_status();

    if format == "json" {
        let status = serde_json::json!({
            "default_mode": default_mode,
            "available": manager.registry().available_engines(),
            "engines": engines,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("descry status");
    println!("══════════════════════════════════════");
    println!("Default mode: {}", default_mode);
    println!(
        "Available:    {}/{} engines",
        manager.registry().available_engines().len(),
        manager.registry().configured_count()
    );
    println!();

    for engine in &engines {
        println!("{}", status_line(engine));
        if let Some(error) = &engine.load_error {
            println!("    {}", style(error).red());
        }
    }
    Ok(())
}

fn status_line(engine: &EngineStatus) -> String {
    let marker = if !engine.enabled {
        style("○").dim()
    } else if engine.healthy {
        style("●").green()
    } else {
        style("●").red()
    };
    let circuit = match engine.circuit_state {
        CircuitState::Closed => String::new(),
        state => format!(" circuit {}", state),
    };
    format!(
        "  {} {:<12} {:<11} weight {:.2}  quality {:.2}{}",
        marker, engine.id, engine.kind, engine.weight, engine.rolling_quality, circuit
    )
}
