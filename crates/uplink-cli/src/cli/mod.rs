//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use uplink_core::{config, interrupt};

mod commands;

#[derive(Parser)]
#[command(name = "uplink")]
#[command(version)]
#[command(about = "Live status client for the session server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the server base URL from config
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Authenticate and watch live server status
    Watch {
        /// Username to authenticate as (falls back to config)
        #[arg(short, long)]
        username: Option<String>,

        /// Authentication key (prompted on stderr when omitted)
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
    /// Print the config file path
    Path,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    let Cli { command, base_url } = cli;

    match command {
        Commands::Watch { username, key } => {
            commands::watch::run(commands::watch::WatchOptions {
                config: &config,
                base_url_flag: base_url.as_deref(),
                username,
                key,
            })
            .await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::show(&config),
            ConfigCommands::Path => commands::config::path(),
        },
    }
}
