#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use preview_bot::{Config, app};

/// `preview-bot` - posts link previews into Matrix rooms.
#[derive(Parser, Debug)]
#[command(name = "preview-bot")]
#[command(version)]
#[command(about = "Matrix bot that posts previews for links sent in rooms.", long_about = None)]
struct Cli {
    /// Config file (overridden by URL_PREVIEW_BOT_CONFIG_PATH)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and post previews until ctrl-c (default)
    Run,
    /// Load and validate the config, then print a summary
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // reqwest and rustls both see the ring backend; pick it explicitly.
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: Failed to install default crypto provider: {e:?}");
    }

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let level = config.log_level.parse::<Level>().unwrap_or_else(|_| {
        eprintln!("Warning: unknown log level {:?}, using info", config.log_level);
        Level::INFO
    });
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => Ok(app::run(config).await?),
        Command::CheckConfig => {
            print!("{}", app::describe(&config));
            println!("config OK");
            Ok(())
        }
    }
}
