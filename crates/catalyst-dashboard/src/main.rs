//! `catalyst` records console
//!
//! Lists records, shows their details and history, and edits their status
//! against the catalyst backend API.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use catalyst_client::{ListQuery, provider_from_config};
use catalyst_core::{Config, Error, RecordId, Result, init_logging};
use catalyst_dashboard::render::{self, OutputFormat};
use catalyst_dashboard::{Console, ConsoleNotifier, RecordScreen, SaveOutcome};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, info, warn};
use validator::Validate as _;

/// Command line interface for the catalyst records console
#[derive(Parser)]
#[command(
    name = "catalyst",
    version = env!("CARGO_PKG_VERSION"),
    about = "Administrative records console for the catalyst platform",
    long_about = "Browse claims and uploads, inspect their status history and comments, \
                  and update their status with optimistic rollback on failure."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides configuration)
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Pre-issued bearer token (overrides configuration)
    #[arg(long, env = "CATALYST_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long, global = true)]
    json: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// List the records of a resource
    List {
        /// Resource name (see `catalyst resources`)
        resource: String,

        /// Collection filter, repeatable
        #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_filter)]
        filter: Vec<(String, String)>,
    },

    /// Show one record with its status history and comments
    Show {
        /// Resource name
        resource: String,

        /// Record id
        id: RecordId,
    },

    /// Show the status history of a record
    History {
        /// Resource name
        resource: String,

        /// Record id
        id: RecordId,
    },

    /// Update an editable field of a record
    Set {
        /// Resource name
        resource: String,

        /// Record id
        id: RecordId,

        /// Field name (e.g. `business_status`)
        field: String,

        /// New value
        value: String,
    },

    /// List the comments on a record
    Comments {
        /// Resource name
        resource: String,

        /// Record id
        id: RecordId,
    },

    /// Add a comment to a record
    Comment {
        /// Resource name
        resource: String,

        /// Record id
        id: RecordId,

        /// Comment text
        text: String,
    },

    /// List known resources
    Resources,

    /// Validate or show configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,

        /// Validate configuration
        #[arg(short, long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // It's okay if .env doesn't exist
    let env_note = env_file_note(dotenvy::dotenv());

    let cli = Cli::parse();

    match run(cli, env_note).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, env_note: Option<String>) -> Result<()> {
    let config = load_config(&cli)?;
    init_logging(&config.logging);
    if let Some(note) = env_note {
        debug!(%note, ".env file not loaded");
    }
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        "catalyst starting"
    );

    let output = cli.output;
    match cli.command {
        Commands::Config { show, validate } => handle_config_command(&config, show, validate),
        Commands::Resources => {
            let resources = config.resource_descriptors();
            match output {
                OutputFormat::Table => println!("{}", render::render_resources(&resources)),
                OutputFormat::Json => println!("{}", render::render_json(&resources)?),
            }
            Ok(())
        }
        command => {
            let tokens = provider_from_config(&config.auth, &config.api)?;
            let console = Console::new(&config, tokens, Arc::new(ConsoleNotifier))?;
            run_screen_command(&console, command, output).await
        }
    }
}

/// Why a `.env` file was not loaded, if it was not
fn env_file_note<T>(result: dotenvy::Result<T>) -> Option<String> {
    result.err().map(|e| e.to_string())
}

/// Load configuration and apply command line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_from(cli.config.as_deref())?;

    if let Some(base_url) = &cli.base_url {
        config.api.base_url.clone_from(base_url);
    }
    if let Some(token) = &cli.token {
        config.auth.token = Some(token.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Create a screen that is unmounted when Ctrl+C arrives
fn mount(console: &Console, resource: &str) -> Result<Arc<RecordScreen>> {
    let screen = Arc::new(console.screen(resource)?);

    let watched = Arc::clone(&screen);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, abandoning in-flight requests");
            watched.unmount();
        }
    });

    Ok(screen)
}

async fn run_screen_command(
    console: &Console,
    command: Commands,
    output: OutputFormat,
) -> Result<()> {
    match command {
        Commands::List { resource, filter } => {
            let screen = mount(console, &resource)?;
            let query = filter
                .into_iter()
                .fold(ListQuery::new(), |q, (k, v)| q.with_filter(k, v));
            let result = screen.load_filtered(&query).await;
            if result.as_ref().is_err_and(Error::is_cancelled) {
                return result;
            }

            let model = screen.snapshot();
            match output {
                OutputFormat::Table => {
                    println!("{}", render::render_table(screen.descriptor(), &model));
                }
                OutputFormat::Json => println!("{}", render::render_json(&model.records)?),
            }
            result
        }
        Commands::Show { resource, id } => {
            show_record(&*mount(console, &resource)?, id, output).await
        }
        Commands::History { resource, id } => {
            let screen = mount(console, &resource)?;
            screen.load_history(id).await?;
            let model = screen.snapshot();
            match output {
                OutputFormat::Table => println!("{}", render::render_history(&model.history)),
                OutputFormat::Json => println!("{}", render::render_json(&model.history)?),
            }
            Ok(())
        }
        Commands::Set {
            resource,
            id,
            field,
            value,
        } => set_field(&*mount(console, &resource)?, id, &field, &value, output).await,
        Commands::Comments { resource, id } => {
            let screen = mount(console, &resource)?;
            screen.load_comments(id).await?;
            let model = screen.snapshot();
            match output {
                OutputFormat::Table => println!("{}", render::render_comments(&model.comments)),
                OutputFormat::Json => println!("{}", render::render_json(&model.comments)?),
            }
            Ok(())
        }
        Commands::Comment { resource, id, text } => {
            let screen = mount(console, &resource)?;
            screen.add_comment(id, &text).await
        }
        Commands::Resources | Commands::Config { .. } => Ok(()),
    }
}

async fn show_record(screen: &RecordScreen, id: RecordId, output: OutputFormat) -> Result<()> {
    screen.select(id).await?;

    // The drawer still renders when history or comments fail to load
    let descriptor = screen.descriptor();
    if descriptor.history {
        if let Err(e) = screen.load_history(id).await {
            warn!(error = %e, "Status history unavailable");
        }
    }
    if descriptor.comments {
        if let Err(e) = screen.load_comments(id).await {
            warn!(error = %e, "Comments unavailable");
        }
    }

    let model = screen.snapshot();
    let Some(record) = model.detail.as_ref() else {
        return Err(Error::not_found(descriptor.record_path(id)));
    };

    match output {
        OutputFormat::Table => {
            println!("{}", render::render_detail(descriptor, record));
            if descriptor.history {
                println!("{}", "Status History".bold());
                println!("{}", render::render_history(&model.history));
            }
            if descriptor.comments {
                println!("{}", "Comments".bold());
                println!("{}", render::render_comments(&model.comments));
            }
        }
        OutputFormat::Json => {
            let view = json!({
                "record": record,
                "history": model.history,
                "comments": model.comments,
            });
            println!("{}", render::render_json(&view)?);
        }
    }
    Ok(())
}

async fn set_field(
    screen: &RecordScreen,
    id: RecordId,
    field: &str,
    value: &str,
    output: OutputFormat,
) -> Result<()> {
    screen.load().await?;

    match screen.set_field(id, field, parse_value(value)).await? {
        SaveOutcome::Saved => {
            let model = screen.snapshot();
            if let Some(record) = model.record(id) {
                match output {
                    OutputFormat::Table => println!(
                        "{}",
                        render::records_table(screen.descriptor(), std::slice::from_ref(record))
                    ),
                    OutputFormat::Json => println!("{}", render::render_json(record)?),
                }
            }
            Ok(())
        }
        SaveOutcome::RolledBack(message) => Err(Error::Other(message)),
        SaveOutcome::Skipped(reason) => Err(Error::Other(reason.to_string())),
    }
}

/// Interpret a command line value as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse a `key=value` filter
fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

/// Handle configuration commands
fn handle_config_command(config: &Config, show: bool, validate: bool) -> Result<()> {
    if validate {
        config.validate()?;
        if config.auth.token.is_none() && !config.auth.has_client_credentials() {
            warn!("No credentials configured; only `resources` and `config` will work");
        }
        println!("{}", "Configuration is valid".green());
    }

    if show {
        let rendered = toml::to_string_pretty(config)
            .map_err(|e| Error::configuration(format!("Failed to serialize configuration: {e}")))?;
        println!("{rendered}");
    }

    Ok(())
}
