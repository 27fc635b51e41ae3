//! Trending Bot - Headless Server
//!
//! Polls pump.fun trending listings and posts newly trending tokens to a
//! Telegram chat.

mod config;
mod status_server;

use clap::Parser;
use config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use trending_alerts::{BotSettings, HtmlFormatter, TelegramBot, TelegramSink};
use trending_core::{Clock, SystemClock};
use trending_engine::{
    CheckCycle, DedupTracker, MessageFormatter, NotificationSink, TrendingMonitor,
};
use trending_feeds::{default_adapters, FetchCoordinator, SourceAdapter};

/// Trending Bot CLI
#[derive(Parser, Debug)]
#[command(name = "trending-bot")]
#[command(about = "Pump.fun trending token alert bot", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(level: &str) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("🚀 Trending Bot starting...");
    info!("  Poll interval: {} ms", config.poll_interval_ms);
    info!("  Freshness window: {} h", config.max_age_hours);
    info!("  Dedup TTL: {} h", config.ttl_hours);
    info!("  Fetch timeout: {} ms", config.fetch_timeout_ms);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let adapters = match default_adapters(config.fetch_timeout()) {
        Ok(adapters) => adapters,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let source_names = adapters
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(" → ");
    let coordinator = FetchCoordinator::new(adapters, Arc::clone(&clock));
    info!("  Sources ({}): {}", coordinator.adapter_count(), source_names);

    let bot = Bot::new(&config.bot_token);
    let sink = Arc::new(TelegramSink::new(bot.clone(), &config.chat_id));
    let formatter = Arc::new(HtmlFormatter::new(Arc::clone(&clock)));

    let cycle = CheckCycle::new(
        coordinator,
        Arc::new(DedupTracker::new(config.dedup_ttl())),
        Arc::clone(&sink) as Arc<dyn NotificationSink>,
        Arc::clone(&formatter) as Arc<dyn MessageFormatter>,
        Arc::clone(&clock),
        config.cycle_config(),
    );
    let monitor = Arc::new(TrendingMonitor::new(
        Arc::new(cycle),
        Arc::clone(&clock),
        config.monitor_config(),
    ));

    // Optional HTTP status endpoint
    let status_handle = match config.status_port {
        Some(port) => match status_server::start_status_server(Arc::clone(&monitor), port).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to start status server: {}", e);
                None
            }
        },
        None => None,
    };

    let startup = formatter.startup_message(config.poll_interval_ms, &host_name());
    if let Err(e) = sink.emit(&startup).await {
        warn!("Failed to send startup message: {}", e);
    }

    monitor.start();

    let telegram = Arc::new(TelegramBot::new(
        bot,
        Arc::clone(&monitor),
        Arc::clone(&formatter),
        BotSettings {
            poll_interval_ms: config.poll_interval_ms,
            max_age_hours: config.max_age_hours,
        },
    ));
    let bot_handle = tokio::spawn(telegram.run());

    info!("Bot started. Press Ctrl+C to stop...");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }

    warn!("Shutdown signal received");
    monitor.stop().await;

    // The dispatcher and HTTP server may be blocked on I/O
    bot_handle.abort();
    if let Some(handle) = status_handle {
        handle.abort();
    }
    let _ = tokio::time::timeout(Duration::from_secs(1), bot_handle).await;

    let status = monitor.status();
    info!("📈 Final Stats:");
    info!("  Checks completed: {}", status.cycles_completed);
    info!("  Alerts sent: {}", status.notifications_sent);
    info!("  Tracked tokens: {}", status.tracked_count);

    info!("👋 Trending Bot stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_args_default_log_level() {
        let args = Args::parse_from(["trending-bot"]);
        assert_eq!(args.log_level, "info");

        let args = Args::parse_from(["trending-bot", "--log-level", "debug"]);
        assert_eq!(args.log_level, "debug");
    }
}
