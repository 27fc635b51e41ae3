//! HTML message rendering for Telegram.

use std::sync::Arc;
use trending_core::{Clock, TrendingToken};
use trending_engine::{MessageFormatter, StatusSnapshot};

const MISSING_SYMBOL: &str = "???";

/// Renders alerts with Telegram's HTML parse mode.
pub struct HtmlFormatter {
    clock: Arc<dyn Clock>,
}

impl HtmlFormatter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Sent once when the bot comes up.
    pub fn startup_message(&self, poll_interval_ms: u64, host: &str) -> String {
        format!(
            "✅ <b>Trending Monitor started</b>\n\
             ⏱ Check interval: {} s\n\
             🖥 Host: {}",
            poll_interval_ms / 1000,
            escape_html(host)
        )
    }

    /// Reply to `/start`.
    pub fn welcome_message(&self, poll_interval_ms: u64, max_age_hours: u64) -> String {
        format!(
            "👋 <b>Welcome to the Pump.fun Trending Bot!</b>\n\n\
             I watch for new tokens that have just entered pump.fun trending.\n\n\
             <b>Commands:</b>\n\
             /status - show bot status\n\
             /check - run a check now\n\
             /help - list commands\n\n\
             ⏱ Check interval: {} s\n\
             🎯 Fresh tokens only (&lt; {} hours)",
            poll_interval_ms / 1000,
            max_age_hours
        )
    }

    pub fn status_message(&self, status: &StatusSnapshot) -> String {
        let hours = status.uptime_ms / 3_600_000;
        let minutes = (status.uptime_ms % 3_600_000) / 60_000;
        let (icon, state) = if status.is_running {
            ("🟢", "Running")
        } else {
            ("🔴", "Stopped")
        };
        let last_check = status
            .last_check_ms
            .map(|ms| self.format_time_ago(ms))
            .unwrap_or_else(|| "No data".to_string());

        format!(
            "📊 <b>Bot status</b>\n\n\
             {} Status: {}\n\
             ⏱ Uptime: {}h {}m\n\
             📈 Tracked tokens: {}\n\
             🕐 Last check: {}\n\
             📨 Alerts sent: {}",
            icon,
            state,
            hours,
            minutes,
            status.tracked_count,
            last_check,
            status.notifications_sent
        )
    }

    /// Relative age of a Unix-ms timestamp; `Unknown` for a missing one.
    pub fn format_time_ago(&self, timestamp_ms: i64) -> String {
        if timestamp_ms <= 0 {
            return "Unknown".to_string();
        }

        let diff = self.clock.now_ms() - timestamp_ms;
        let minutes = diff / 60_000;
        let hours = diff / 3_600_000;

        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{} min ago", minutes)
        } else if hours < 24 {
            format!("{} {} ago", hours, plural(hours, "hour"))
        } else {
            let days = hours / 24;
            format!("{} {} ago", days, plural(days, "day"))
        }
    }
}

impl MessageFormatter for HtmlFormatter {
    fn format_token(&self, token: &TrendingToken) -> String {
        let symbol = token.symbol.as_deref().unwrap_or(MISSING_SYMBOL);
        let mint = escape_html(&token.id);

        format!(
            "🚀 <b>Just entered Trending!</b>\n\n\
             🪙 <b>{}</b> (${})\n\
             💰 MCap: {}\n\
             ⏰ Created: {}\n\
             🔗 <a href=\"https://pump.fun/coin/{mint}\">Pump.fun</a> | \
             <a href=\"https://dexscreener.com/solana/{mint}\">DexScreener</a>\n\n\
             <code>{mint}</code>",
            escape_html(&token.display_name),
            escape_html(symbol),
            format_market_cap(token.market_cap_usd),
            self.format_time_ago(token.created_at_ms),
        )
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n > 1 {
        format!("{}s", unit)
    } else {
        unit.to_string()
    }
}

/// Compact USD amount, `N/A` when unknown.
pub fn format_market_cap(market_cap: f64) -> String {
    if !market_cap.is_finite() || market_cap <= 0.0 {
        return "N/A".to_string();
    }

    if market_cap >= 1_000_000_000.0 {
        format!("${:.2}B", market_cap / 1_000_000_000.0)
    } else if market_cap >= 1_000_000.0 {
        format!("${:.2}M", market_cap / 1_000_000.0)
    } else if market_cap >= 1_000.0 {
        format!("${:.2}K", market_cap / 1_000.0)
    } else {
        format!("${:.2}", market_cap)
    }
}

/// Escape the characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
