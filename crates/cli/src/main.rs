//! stanblocks CLI — the main entry point.
//!
//! Commands:
//! - `--model_name <prefix>` — Assemble both models (same as `generate`)
//! - `generate` — Assemble the baseline and sensitivity models
//! - `check`    — Show which fragment files are present
//! - `config`   — Inspect or initialize `stanblocks.toml`
//! - `completions` — Print a shell completion script

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use stanblocks_config::GeneratorConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "stanblocks",
    about = "stanblocks — assemble baseline and sensitivity Stan models from fragments",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory and base filename of the fragments and generated models
    #[arg(long = "model_name", visible_alias = "model-name", value_name = "PREFIX")]
    model_name: Option<String>,

    /// Path to a stanblocks.toml (defaults to ./stanblocks.toml if present)
    #[arg(short, long, global = true, env = "STANBLOCKS_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble `<prefix>.stan` and `<prefix>_sensitivity.stan`
    Generate {
        /// Directory and base filename of the fragments and generated models
        #[arg(long = "model_name", visible_alias = "model-name", value_name = "PREFIX")]
        model_name: String,

        /// Read fragments and render both models without writing them
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the fragment files for a model and whether they exist
    Check {
        /// Directory and base filename of the fragments
        #[arg(long = "model_name", visible_alias = "model-name", value_name = "PREFIX")]
        model_name: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Load and validate the configuration
    Validate,
    /// Print the path of the config file that would be used
    Path,
    /// Write a default stanblocks.toml to the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    // stdout carries command output (and JSON); logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// A top-level `--model_name` only makes sense without a subcommand.
fn check_args(cli: &Cli) -> Result<(), clap::Error> {
    if cli.command.is_some() && cli.model_name.is_some() {
        return Err(Cli::command().error(
            ErrorKind::ArgumentConflict,
            "--model_name before a subcommand is not allowed; pass it to the subcommand instead",
        ));
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Generate {
            model_name,
            dry_run,
            json,
        }) => {
            let config = GeneratorConfig::load(config_path)?;
            commands::generate::run(&model_name, &config, dry_run, json)?
        }
        Some(Commands::Check { model_name }) => {
            let config = GeneratorConfig::load(config_path)?;
            commands::check::run(&model_name, &config)?
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path)?,
            ConfigAction::Path => commands::config_cmd::path(config_path)?,
            ConfigAction::Init { force } => commands::config_cmd::init(force)?,
        },
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "stanblocks", &mut std::io::stdout());
        }
        None => match cli.model_name {
            Some(model_name) => {
                let config = GeneratorConfig::load(config_path)?;
                commands::generate::run(&model_name, &config, false, false)?
            }
            None => Cli::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "either --model_name <PREFIX> or a subcommand is required",
                )
                .exit(),
        },
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = check_args(&cli) {
        e.exit();
    }
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}
