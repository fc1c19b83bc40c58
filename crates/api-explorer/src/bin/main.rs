//! API Explorer CLI
//!
//! Lists endpoints, shows their schemas and examples, and sends test
//! requests. Without a subcommand it starts the interactive shell.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use api_explorer::session::parse_pair;
use api_explorer::settings::log_filter;
use api_explorer::{Command, ExplorerSettings, Session, SettingsOverrides};

/// API Explorer - browse an OpenAPI document and try its endpoints
#[derive(Parser, Debug)]
#[command(name = "api-explorer")]
#[command(version)]
#[command(about = "Browse OpenAPI endpoints, inspect schemas and send test requests")]
struct Args {
    /// URL (or file path) of the OpenAPI document
    #[arg(long, global = true)]
    docs_url: Option<String>,

    /// Use the built-in Comlink catalog even if a document URL is configured
    #[arg(long, global = true, conflicts_with = "docs_url")]
    builtin: bool,

    /// Server that test requests are sent to
    #[arg(long, global = true, env = "API_EXPLORER_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token for test requests
    #[arg(long, global = true, env = "API_EXPLORER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Test request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Settings file (default: settings.json in the config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List endpoints grouped by tag
    List,
    /// Show parameters, body fields and responses of an endpoint
    Show { endpoint: String },
    /// Print an example request body
    Example { endpoint: String },
    /// List request body fields
    Fields { endpoint: String },
    /// Send a test request
    Call {
        endpoint: String,
        /// Parameters as name=value
        params: Vec<String>,
        /// Request body as JSON (defaults to the example)
        #[arg(long)]
        body: Option<String>,
    },
    /// Start the interactive shell
    Shell,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(
            std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        ))
        .init();

    let mut settings = ExplorerSettings::load_or_default(args.settings.as_deref())
        .map_err(|e| format!("Failed to read settings: {}", e))?
        .with_overrides(SettingsOverrides {
            docs_url: args.docs_url,
            base_url: args.base_url,
            timeout_secs: args.timeout,
            bearer_token: args.token,
        });
    if args.builtin {
        settings.docs_url = None;
    }
    debug!("Settings: docs {:?}, base {:?}", settings.docs_url, settings.base_url);

    let mut session = Session::new(settings)?;

    let command = match args.command {
        None | Some(Cmd::Shell) => {
            session.run_shell().await?;
            return Ok(());
        }
        Some(Cmd::List) => Command::List,
        Some(Cmd::Show { endpoint }) => Command::Show(endpoint),
        Some(Cmd::Example { endpoint }) => Command::Example(endpoint),
        Some(Cmd::Fields { endpoint }) => Command::Fields(endpoint),
        Some(Cmd::Call {
            endpoint,
            params,
            body,
        }) => Command::Call {
            endpoint,
            params: params
                .iter()
                .map(|p| parse_pair(p))
                .collect::<Result<Vec<_>, _>>()?,
            body,
        },
    };

    session.load().await?;
    let output = session.execute(command).await?;
    println!("{}", output.trim_end());

    Ok(())
}
