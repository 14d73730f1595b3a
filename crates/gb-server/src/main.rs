use anyhow::Context;
use clap::Parser;
use gb_config::GuestbookConfig;
use gb_core::Scene;
use gb_server::{App, Server};
use gb_store::NeocitiesStore;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("guestbook error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = GuestbookConfig::load_with_dotenv().context("failed to load configuration")?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            public_dir,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(public_dir) = public_dir {
                config.server.public_dir = public_dir;
            }
            serve(&config).await
        }
        Commands::Fetch { scene } => fetch(&config, scene).await,
    }
}

async fn serve(config: &GuestbookConfig) -> anyhow::Result<()> {
    let store = NeocitiesStore::new(&config.neocities).context("failed to build entry store")?;
    tracing::info!(document = store.document_url(), "using remote document");
    if !config.neocities.is_configured() {
        tracing::warn!("Neocities credentials missing; every append will fail");
    }

    let app = App::new(store, &config.server);
    let server = Server::bind(&config.server.bind_addr(), app)?;
    server.run_until(shutdown_signal()).await;
    Ok(())
}

async fn fetch(config: &GuestbookConfig, scene: Option<Scene>) -> anyhow::Result<()> {
    let store = NeocitiesStore::new(&config.neocities).context("failed to build entry store")?;
    let collection = store
        .load_all()
        .await
        .with_context(|| format!("failed to load {}", store.document_url()))?;

    let output = match scene {
        Some(scene) => serde_json::to_value(collection.scene_view(scene))?,
        None => serde_json::json!({
            "document": store.document_url(),
            "total": collection.len(),
            "foreign": collection.foreign_count(),
            "scenes": collection.scene_counts(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for ctrl-c; shutting down");
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("GUESTBOOK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
