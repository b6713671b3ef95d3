//! Chat-bot configuration service.
//!
//! # Architecture Overview
//!
//! ```text
//!   config/*.json ──notify──▶ ConfigWatcher ──revalidate──▶ ConfigStore (ArcSwap)
//!                                                               │
//!   redis/pm2/groups/privates/.env ──▶ TtlCache ──┐             │
//!                                                 ▼             ▼
//!                                               Settings (accessors)
//!                                                     │
//!   admin client ──HTTP──▶ /api/v1/config/{get,set} ◀─┤
//!   renderer ─────WS────▶ /puppeteer (gate) ◀─────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use chatbot_config::admin::{setup_router, AppState};
use chatbot_config::config::{env, ConfigPaths, ConfigWatcher};
use chatbot_config::lifecycle::{bootstrap, signals::forward_signals, Shutdown};
use chatbot_config::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "chatbot-config")]
#[command(about = "Configuration service for the chat bot", long_about = None)]
struct Args {
    /// Bot root directory (holds `.env`, `package.json` and `config/`).
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Do not reload config files when they change.
    #[arg(long)]
    no_watch: bool,

    /// Quiet period before a changed file is reloaded.
    #[arg(long, default_value_t = 200)]
    debounce_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let paths = ConfigPaths::new(&args.root);

    // `.env` may carry LOG_LEVEL, so export it before logging starts.
    if let Err(e) = env::export_env_file(&paths.env_file()) {
        if !e.is_not_found() {
            return Err(e.into());
        }
    }
    let log_level = init_logging(&env::log_level());

    tracing::info!(version = env!("CARGO_PKG_VERSION"), root = %args.root.display(), "chatbot-config starting");

    let settings = Arc::new(bootstrap(paths)?);
    let shutdown = Shutdown::new();
    tokio::spawn(forward_signals(shutdown.clone()));

    let watcher = if args.no_watch {
        tracing::info!("Config watching disabled");
        None
    } else {
        Some(ConfigWatcher::spawn(
            settings.paths().config_dir(),
            settings.stores(),
            Duration::from_millis(args.debounce_ms),
            shutdown.subscribe(),
        )?)
    };

    let listener = TcpListener::bind((env::host(), env::port())).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let app = setup_router(AppState::new(settings, log_level));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    if let Some(watcher) = watcher {
        watcher.stop().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
