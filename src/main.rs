use clap::{Parser, Subcommand};
use npc_intent_engine::api::{build_agent, serve};
use npc_intent_engine::config::AppConfig;
use npc_intent_engine::utils::init_tracing;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "npc_intent_engine")]
#[command(about = "NPC intent and dialogue engine", long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    #[arg(long, global = true)]
    npc_id: Option<String>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve WebSocket sessions
    Serve,
    /// Run one intent evaluation and print the snapshots and intent
    Probe,
    /// Run one dialogue turn
    Chat {
        text: String,
        #[arg(long, default_value = "player")]
        speaker: String,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    }
    .with_env_overrides();

    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(npc_id) = &cli.npc_id {
        config.npc.npc_id = npc_id.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Serve => {
            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received");
                    signal.cancel();
                }
            });

            serve(&config, shutdown).await?;
        }
        Commands::Probe => {
            let agent = build_agent(&config)?;
            let report = agent.inspect_intent().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Chat { text, speaker } => {
            let agent = build_agent(&config)?;
            let turn = agent.respond(speaker, text).await;
            println!("{}", serde_json::to_string_pretty(&turn)?);
        }
    }

    Ok(())
}
