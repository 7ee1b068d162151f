//! Roadmap CLI - Roll up and filter hierarchical work-item schedules.

use clap::Parser;
use roadmap::cli::{Cli, Commands, ConfigCommands};
use roadmap::commands::{self, Output};
use roadmap::config::{ConfigOverrides, ConfigPaths, OutputFormat, resolve_config};
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable controlling log verbosity (e.g. `debug`, `roadmap=trace`).
const LOG_ENV: &str = "ROADMAP_LOG";

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let human = cli.human_readable;

    if let Err(e) = run(cli) {
        report_error(&e, human);
        process::exit(1);
    }
}

/// Install the log subscriber. Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn report_error(e: &roadmap::Error, human: bool) {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
}

/// Resolve the project directory: --dir flag > ROADMAP_DIR env > cwd.
fn resolve_dir(explicit_path: Option<PathBuf>) -> Result<PathBuf, roadmap::Error> {
    match explicit_path {
        Some(path) => {
            if !path.is_dir() {
                return Err(roadmap::Error::InvalidInput(format!(
                    "Specified directory does not exist: {}",
                    path.display()
                )));
            }
            Ok(path)
        }
        None => Ok(env::current_dir().unwrap_or_else(|_| PathBuf::from("."))),
    }
}

fn run(cli: Cli) -> Result<(), roadmap::Error> {
    let dir = resolve_dir(cli.dir)?;
    let paths = ConfigPaths::for_dir(&dir);

    let mut overrides = ConfigOverrides::new();
    if let Some(snapshot) = cli.snapshot {
        overrides = overrides.with_snapshot(snapshot);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    if let Commands::Build(ref args) = cli.command {
        overrides = commands::build_overrides(args, overrides)?;
    }
    let config = resolve_config(&paths, &overrides)?;
    let human = *config.output_format() == OutputFormat::Human;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Build(args) => {
            let result = commands::build(&config, &args, today)?;
            output(&result, human);
        }
        Commands::Show { id } => {
            let result = commands::show(&config, id)?;
            output(&result, human);
        }
        Commands::Areas => {
            let result = commands::areas(&config)?;
            output(&result, human);
        }
        Commands::Levels => {
            let result = commands::levels(&config)?;
            output(&result, human);
        }
        Commands::Intervals => {
            let result = commands::intervals(&config);
            output(&result, human);
        }
        Commands::Presets => {
            let result = commands::presets(today);
            output(&result, human);
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let result = commands::config_show(&config, &paths);
                output(&result, human);
            }
            ConfigCommands::Set { key, value, system } => {
                let result = commands::config_set(&paths, &key, &value, system)?;
                output(&result, human);
            }
        },
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
