// src/main.rs
use anyhow::Result;
use dotenvy::dotenv;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use market_watcher::config::AppConfig;
use market_watcher::connectors::paper::PaperSession;
use market_watcher::core::engine::Engine;
use market_watcher::plan::store::TradingPlan;
use market_watcher::types::EngineEvent;

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("log", "market-watcher.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(file_writer.and(std::io::stdout))
        .with_ansi(false)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _log_guard = init_logging();

    let config = AppConfig::new()?;
    let plan = TradingPlan::load(
        &config.plan_name,
        config.base_request_id,
        config.discount_factor,
        &config.plan,
    )?;

    println!("========================================");
    println!("     MARKET WATCHER - v0.1.0");
    println!("========================================");
    println!("Plan:        {}", config.plan_name);
    println!("Instruments: {}", plan.len());
    println!("========================================");

    let (event_tx, event_rx) = mpsc::channel(256);

    // Ctrl+C drains and stops the engine.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received");
                let _ = tx.send(EngineEvent::Shutdown).await;
            }
        });
    }

    // SIGHUP re-reads the Settings file and applies it as a reload event on
    // the engine's own queue.
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let tx = event_tx.clone();
        tokio::spawn(async move {
            let mut hangup = match signal(SignalKind::hangup()) {
                Ok(stream) => stream,
                Err(err) => {
                    error!(%err, "cannot install SIGHUP handler");
                    return;
                }
            };
            while hangup.recv().await.is_some() {
                match AppConfig::new() {
                    Ok(new_config) => {
                        info!("SIGHUP received; queueing plan reload");
                        let _ = tx.send(EngineEvent::Reload(new_config.plan)).await;
                    }
                    Err(err) => error!(%err, "reload config rejected"),
                }
            }
        });
    }

    let mut engine = Engine::new(&config, plan, Box::new(PaperSession), event_rx);
    if let Err(err) = engine.run().await {
        error!("fatal engine error: {err}");
    }

    Ok(())
}
