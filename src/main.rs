//! WriteRight - grammar and spelling checker
//!
//! Command-line entry point: one-off checks, settings and stats, raw router
//! messages and the HTTP server.

mod cli;

use clap::{Parser, Subcommand};
use cli::check::CheckArgs;
use cli::settings::SettingsAction;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};
use writeright_core::{error::Result, Provider};

#[derive(Parser)]
#[command(name = "writeright")]
#[command(about = "Grammar and spelling checker", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML); WRITERIGHT_* variables still apply
    #[arg(short, long, env = "WRITERIGHT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the background service behind the HTTP transport
    Serve {
        /// Listen address (defaults to server.addr from the configuration)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Check text (argument, or stdin when omitted or "-")
    Check {
        text: Option<String>,

        /// Language code, e.g. en-GB
        #[arg(short = 'L', long)]
        language: Option<String>,

        /// languagetool or basic
        #[arg(short, long)]
        provider: Option<Provider>,

        /// Use the local rules only
        #[arg(long)]
        offline: bool,

        /// Print the text with the best replacements applied
        #[arg(long)]
        fix: bool,

        /// Print the raw router response
        #[arg(long)]
        json: bool,
    },

    /// View or edit settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Show usage statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Send a raw JSON message to the router (argument or stdin)
    Message { json: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Keep dependency chatter out of command output
    let filter = EnvFilter::new(format!(
        "writeright={level},writeright_core={level},hyper=warn,reqwest=warn,tower_http=info",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("WriteRight v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Serve { addr }) => cli::serve::handle(addr, config_path).await,
        Some(Commands::Check {
            text,
            language,
            provider,
            offline,
            fix,
            json,
        }) => {
            let args = CheckArgs {
                text,
                language,
                provider,
                offline,
                fix,
                json,
            };
            cli::check::handle(args, config_path).await
        }
        Some(Commands::Settings { action }) => cli::settings::handle(action, config_path).await,
        Some(Commands::Stats { json }) => cli::stats::handle(json, config_path).await,
        Some(Commands::Message { json }) => {
            if !cli::message::handle(json, config_path).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        None => cli::serve::handle(None, config_path).await,
    }
}
