//! # WKMP Playout Director (wkmp-pd)
//!
//! Drives the 4 Hz Director Loop, Schedule Resolver, Source Materializer,
//! Pipeline Supervisor, and PCM Crossfade Session for every configured
//! mount.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wkmp_pd::config::Config;
use wkmp_pd::control::ControlHandle;
use wkmp_pd::events::{DirectorEvent, EventBus};
use wkmp_pd::Director;

#[derive(Parser, Debug)]
#[command(name = "wkmp-pd")]
#[command(about = "WKMP Playout Director - schedule-driven audio transition engine")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "wkmp-pd.toml")]
    config: PathBuf,

    /// Database path (overrides config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// HTTP server port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Media root folder (overrides config file)
    #[arg(short, long)]
    media_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wkmp_pd=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true).with_file(true).with_line_number(true))
        .init();

    info!("Starting WKMP Playout Director (wkmp-pd)");

    let args = Args::parse();
    info!(config = ?args.config, "configuration file");

    let config = Config::load(&args.config, args.database, args.port, args.media_root).await?;
    info!(
        database = %config.database_path.display(),
        port = config.port,
        media_root = %config.media_root.display(),
        "loaded configuration"
    );

    let events = Arc::new(EventBus::new(256));
    let director = Arc::new(Director::new(
        config.db_pool().clone(),
        config.media_root.clone(),
        config.gstreamer_bin.clone(),
        Arc::clone(&events),
    ));

    director.prune_stale_state().await;
    director.restore_state().await;

    let control = ControlHandle::spawn(Arc::clone(&director));
    let _ = control; // held by the API layer once the control RPCs grow a transport

    // §4.1 trigger (a) / §5: one subscriber task consumes schedule-update
    // notifications and flags the schedule cache dirty.
    let schedule_update_handle = tokio::spawn({
        let director = Arc::clone(&director);
        let mut rx = events.subscribe();
        async move {
            loop {
                match rx.recv().await {
                    Ok(DirectorEvent::ScheduleUpdate) => director.on_schedule_update().await,
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "schedule-update subscriber lagged, marking cache dirty to be safe");
                        director.on_schedule_update().await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    });

    let tick_handle = tokio::spawn({
        let director = Arc::clone(&director);
        let tick_interval_ms = config.tick_interval_ms;
        async move {
            director.run(tick_interval_ms).await;
        }
    });

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let api_handle = tokio::spawn({
        let director = Arc::clone(&director);
        async move {
            if let Err(e) = wkmp_pd::api::run(&bind_addr, director).await {
                error!(error = %e, "HTTP surface exited with an error");
            }
        }
    });

    tokio::select! {
        res = tick_handle => {
            if let Err(e) = res {
                error!(error = %e, "director tick loop panicked");
            }
        }
        res = api_handle => {
            if let Err(e) = res {
                error!(error = %e, "HTTP surface task panicked");
            }
        }
        res = schedule_update_handle => {
            if let Err(e) = res {
                error!(error = %e, "schedule-update subscriber panicked");
            }
        }
    }

    info!("WKMP Playout Director shutting down");
    Ok(())
}
