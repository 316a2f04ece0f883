//! Pipeline Orchestrator binary: loads configuration, wires the demonstration
//! collaborators, and drives the Pipeline Orchestrator's cycle loop on
//! `pipeline.poll_interval_seconds` until a cooperative stop signal arrives.
//!
//! Article ingestion, a concrete LLM provider, broker execution, and chat-bot
//! notification front-ends are all external collaborators (spec.md §1); this
//! binary wires only what the core needs to run: the orchestrator plus the
//! repository/`Completer`/`SemanticRouter`/`NotificationSink` adapters in
//! `repos` and `collaborators`.

mod collaborators;
mod config;
mod repos;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use collaborators::{MockCompleter, StaticRouter};
use config::PipelineConfig;
use core_types::{MarketContext, NotificationSink};
use notification_service::{NotificationConfig, NotificationService};
use orchestrator::PipelineOrchestrator;
use repos::{FlatMarketData, InMemoryArticleQueue, InMemoryProposalStore, InMemoryShadowStore};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{interval, Duration};

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn market_context(config: &PipelineConfig) -> MarketContext {
    let mut allocation = std::collections::HashMap::new();
    let (stock, cash) = match config.market_regime {
        core_types::MarketRegime::RiskOn => (0.80, 0.20),
        core_types::MarketRegime::Neutral => (0.50, 0.50),
        core_types::MarketRegime::RiskOff => (0.20, 0.80),
    };
    allocation.insert("stock".to_string(), stock);
    allocation.insert("cash".to_string(), cash);

    MarketContext {
        total_capital: config.total_capital,
        current_allocation: allocation,
        daily_trades: 0,
        weekly_trades: 0,
        daily_volume_usd: config.daily_volume_usd,
        vix: config.vix,
        market_regime: config.market_regime,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
    }));

    tracing::info!("starting news intelligence / constitutional decision pipeline");

    let config = PipelineConfig::from_env()?;
    tracing::info!(
        poll_interval_seconds = config.poll_interval_seconds,
        max_per_cycle = config.max_per_cycle,
        cluster_min_size = config.cluster_min_size,
        "configuration loaded"
    );

    let articles = Arc::new(InMemoryArticleQueue::from_env()?);
    let proposals = Arc::new(InMemoryProposalStore::default());
    let shadows = Arc::new(InMemoryShadowStore::default());
    let completer = Arc::new(MockCompleter);
    let router = Arc::new(StaticRouter);
    let notifier = Arc::new(NotificationService::new(&NotificationConfig::from_env()));
    let market_data = FlatMarketData { price: 100.0 };

    let pipeline = Arc::new(PipelineOrchestrator::new(
        articles,
        proposals,
        shadows,
        completer,
        router,
        notifier.clone(),
        config.orchestrator_settings(),
    ));

    // Integrity check (spec.md §6 / §7 IntegrityFailure): a deployment pins the
    // Constitution's rule-source digest; a mismatch means the rules were
    // tampered with and the process must refuse to start. First run with no
    // pinned file establishes the baseline rather than failing closed, since
    // there is nothing yet to have diverged from.
    let digest_path = std::env::var("CONSTITUTION_DIGEST_PATH").unwrap_or_else(|_| "constitution.digest".to_string());
    let computed_digest = pipeline.constitution_digest().to_string();
    match std::fs::read_to_string(&digest_path) {
        Ok(pinned) if pinned.trim() == computed_digest => {
            tracing::info!("constitution integrity verified");
        }
        Ok(pinned) => {
            tracing::error!(
                expected = pinned.trim(),
                computed = %computed_digest,
                "constitution rule digest mismatch, refusing to start"
            );
            std::process::exit(1);
        }
        Err(_) => {
            tracing::warn!(path = %digest_path, digest = %computed_digest, "no pinned constitution digest found, writing current digest as baseline");
            std::fs::write(&digest_path, &computed_digest).ok();
        }
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut ticker = interval(Duration::from_secs(config.poll_interval_seconds));
    let context = market_context(&config);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                match pipeline.run_cycle(now, &context).await {
                    Ok(proposals) => {
                        tracing::info!(count = proposals.len(), "cycle complete");
                    }
                    Err(e) => {
                        // Batch failure (§7): log and retry on the next tick.
                        tracing::error!(error = %e, "cycle aborted, will retry next tick");
                    }
                }
                if let Err(e) = pipeline.update_shadows(&market_data, now).await {
                    tracing::warn!(error = %e, "shadow mark-to-market failed");
                }

                let stats = pipeline.statistics();
                tracing::info!(
                    cycles = stats.cycles,
                    articles_processed = stats.articles_processed,
                    signals_generated = stats.signals_generated,
                    proposals_created = stats.proposals_created,
                    constitution_rejected = stats.constitution_rejected,
                    shadow_trades_created = stats.shadow_trades_created,
                    "cycle statistics"
                );

                if stats.cycles > 0 && stats.cycles % 24 == 0 {
                    let report = pipeline.shield_report(config.shield_report_window_days, now);
                    notifier.send_shield_report(&report).await;
                }
            }
            _ = sigterm.recv() => {
                tracing::info!("SIGTERM received, stopping after in-flight cycle");
                break;
            }
            _ = sigint.recv() => {
                tracing::info!("SIGINT received, stopping after in-flight cycle");
                break;
            }
        }
    }

    tracing::info!("pipeline stopped");
    Ok(())
}
