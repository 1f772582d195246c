//! rota-bot — Telegram duty rotation bot.
//!
//! Loads the persisted state document, spawns the recurring scheduler, and
//! drives the Telegram long-polling loop in the foreground. Shutdown is
//! process exit; the scheduler needs no cancellation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{info, warn};

use rota_bot::Poller;
use rota_core::Config;
use rota_engine::Scheduler;
use rota_notify::{Notifier, TelegramNotifier};
use rota_store::StateStore;

// ── CLI ─────────────────────────────────────────────────────────────

/// Telegram duty rotation bot.
#[derive(Parser, Debug)]
#[command(name = "rota-bot", version, about)]
struct Cli {
    /// Path to the JSON state file.
    #[arg(long, env = "ROTA_DATA_FILE", default_value = "data/rota.json")]
    data_file: PathBuf,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rota_core::config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let store = Arc::new(StateStore::new(&cli.data_file));
    let doc = store.load();
    info!(
        path = %cli.data_file.display(),
        participants = doc.participants.len(),
        "state loaded"
    );
    let state = Arc::new(Mutex::new(doc));

    let token = config
        .telegram
        .bot_token
        .clone()
        .context("BOT_TOKEN is not set")?;
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
        token,
        config.telegram.api_base.clone(),
    )?);

    let scheduler = Arc::new(Scheduler::new(
        state.clone(),
        store.clone(),
        notifier.clone(),
        &config.scheduler,
    ));
    tokio::spawn(scheduler.run());

    let poller = Poller::new(&config.telegram, state, store, notifier)?;
    if let Err(e) = poller.register_commands().await {
        warn!(error = %e, "failed to register bot commands");
    }

    info!("rota-bot starting");
    poller.run().await;
    Ok(())
}
