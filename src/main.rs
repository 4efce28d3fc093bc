use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use descry::cli::commands::extract::ExtractOptions;
use descry::config::ProcessingMode;

#[derive(Parser)]
#[command(name = "descry")]
#[command(
    version,
    about = "Multi-engine extraction of descriptive passages from prose"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Config file (skips the global/project/env chain)")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract descriptions from a text file
    Extract {
        #[arg(help = "Input text file, or - for stdin")]
        file: PathBuf,
        #[arg(
            long,
            short,
            help = "Processing mode: single, parallel, sequential, ensemble, adaptive"
        )]
        mode: Option<ProcessingMode>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json, yaml"
        )]
        format: String,
        #[arg(short = 'n', long, help = "Show at most N descriptions (text format)")]
        limit: Option<usize>,
    },

    /// Show engine health
    Status {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mdescry encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Extract {
            file,
            mode,
            format,
            limit,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(descry::cli::commands::extract::run(ExtractOptions {
                input: &file,
                mode,
                format: &format,
                limit,
                config_path,
            }))?;
        }
        Commands::Status { format } => {
            descry::cli::commands::status::run(&format, config_path)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                descry::cli::commands::config::show(&format, config_path)?;
            }
            ConfigAction::Path => {
                descry::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    descry::cli::commands::config::init_global(force)?;
                } else {
                    descry::cli::commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
