use anyhow::Result;
use bytesize_common::observability::{LogConfig, LogFormat, init_logging};
use bytesize_config::{BytesizeConfig, BytesizeConfigLoader, DEFAULT_CONFIG_YAML};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tether::build_resolver;
use tokio_util::sync::CancellationToken;
mod tether;

#[derive(Parser, Debug)]
#[command(name = "bytesize", version, about = "Fetch recent tweets for a handle with fallbacks")]
struct Cli {
    /// YAML config; the built-in defaults are used when omitted.
    #[arg(long, global = true, env = "BYTESIZE_CONFIG")]
    config: Option<PathBuf>,

    /// Mirror log events to stderr as well as the log file.
    #[arg(long, global = true)]
    log_stderr: bool,

    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a handle, @handle or profile URL and print the result as JSON.
    Resolve {
        identifier: String,
        #[arg(long)]
        max_items: Option<usize>,
    },
    /// Print the configured strategy order.
    Strategies,
}

fn load_config(path: Option<&PathBuf>) -> Result<BytesizeConfig> {
    let loader = match path {
        Some(p) => BytesizeConfigLoader::new().with_file(p),
        None => BytesizeConfigLoader::new().with_yaml_str(DEFAULT_CONFIG_YAML),
    };
    Ok(loader.load()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig {
        emit_stderr: cli.log_stderr,
        format: if cli.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        ..LogConfig::default()
    })?;

    let cfg = load_config(cli.config.as_ref())?;
    let resolver = build_resolver(&cfg)?;

    match cli.command {
        Command::Strategies => {
            for name in resolver.strategy_names() {
                println!("{name}");
            }
        }
        Command::Resolve {
            identifier,
            max_items,
        } => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_signal.cancel();
                }
            });

            let resolution = resolver
                .resolve_with_cancel(&identifier, max_items, &cancel)
                .await?;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
    }
    Ok(())
}
