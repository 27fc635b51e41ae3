//! Telegram delivery and bot command handlers.

use crate::format::HtmlFormatter;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Recipient};
use teloxide::utils::command::BotCommands;
use teloxide::RequestError;
use thiserror::Error;
use tracing::{info, warn};
use trending_engine::{CycleError, NotificationSink, SinkError, TrendingMonitor};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] RequestError),
}

/// Resolve a configured chat into a send target: a numeric id, or a
/// public channel username with or without the leading `@`.
pub fn parse_recipient(chat: &str) -> Recipient {
    let chat = chat.trim();
    match chat.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if chat.starts_with('@') => Recipient::ChannelUsername(chat.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{}", chat)),
    }
}

/// Classify a Telegram failure for the cycle's retry policy.
pub fn classify_error(err: &RequestError) -> SinkError {
    match err {
        RequestError::RetryAfter(secs) => SinkError::RateLimited {
            retry_after: Some(secs.duration()),
        },
        other => SinkError::Delivery(other.to_string()),
    }
}

/// Posts alert messages to the configured chat in HTML mode.
pub struct TelegramSink {
    bot: Bot,
    chat: Recipient,
}

impl TelegramSink {
    pub fn new(bot: Bot, chat: &str) -> Self {
        Self {
            bot,
            chat: parse_recipient(chat),
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn emit(&self, message: &str) -> Result<(), SinkError> {
        self.bot
            .send_message(self.chat.clone(), message)
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(|e| classify_error(&e))
    }
}

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show the welcome message")]
    Start,
    #[command(description = "Show bot status")]
    Status,
    #[command(description = "Run a trending check now")]
    Check,
    #[command(description = "Show help")]
    Help,
}

/// Command-surface settings echoed back to users.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub poll_interval_ms: u64,
    pub max_age_hours: u64,
}

/// Telegram bot wrapper.
pub struct TelegramBot {
    bot: Bot,
    monitor: Arc<TrendingMonitor>,
    formatter: Arc<HtmlFormatter>,
    settings: BotSettings,
}

impl TelegramBot {
    pub fn new(
        bot: Bot,
        monitor: Arc<TrendingMonitor>,
        formatter: Arc<HtmlFormatter>,
        settings: BotSettings,
    ) -> Self {
        Self {
            bot,
            monitor,
            formatter,
            settings,
        }
    }

    /// Run the bot command handler until the dispatcher stops.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();
        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(bot, msg, cmd).await }
            },
        );

        info!("Telegram command handler running");
        Dispatcher::builder(bot, handler)
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        info!(chat = %msg.chat.id, command = ?cmd, "Command received");

        match cmd {
            Command::Start => {
                let text = self
                    .formatter
                    .welcome_message(self.settings.poll_interval_ms, self.settings.max_age_hours);
                bot.send_message(msg.chat.id, text)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }

            Command::Status => {
                let text = self.formatter.status_message(&self.monitor.status());
                bot.send_message(msg.chat.id, text)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }

            Command::Check => {
                bot.send_message(msg.chat.id, "🔍 Running a check...")
                    .await?;
                let text = check_reply(self.monitor.force_check().await.map(|r| r.notified.len()));
                bot.send_message(msg.chat.id, text).await?;
            }

            Command::Help => {
                bot.send_message(msg.chat.id, Command::descriptions().to_string())
                    .await?;
            }
        }

        Ok(())
    }
}

/// Reply text for `/check` given the number of newly notified tokens.
fn check_reply(result: Result<usize, CycleError>) -> String {
    match result {
        Ok(0) => "✅ No new tokens in trending.".to_string(),
        Ok(n) => format!("✅ Check complete: {} new token(s) sent.", n),
        Err(CycleError::AlreadyRunning) => {
            warn!("Manual check rejected, cycle in flight");
            "⏳ A check is already running, try again shortly.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use teloxide::types::Seconds;
    use teloxide::ApiError;
    use std::time::Duration;

    #[test]
    fn test_parse_recipient() {
        assert_eq!(parse_recipient("-1001234567890"), Recipient::Id(ChatId(-1001234567890)));
        assert_eq!(parse_recipient(" 42 "), Recipient::Id(ChatId(42)));
        assert_eq!(
            parse_recipient("@pump_alerts"),
            Recipient::ChannelUsername("@pump_alerts".to_string())
        );
        assert_eq!(
            parse_recipient("pump_alerts"),
            Recipient::ChannelUsername("@pump_alerts".to_string())
        );
    }

    #[test]
    fn test_classify_retry_after() {
        let err = RequestError::RetryAfter(Seconds::from_seconds(5));
        assert_eq!(
            classify_error(&err),
            SinkError::RateLimited {
                retry_after: Some(Duration::from_secs(5))
            }
        );
    }

    #[test]
    fn test_classify_other_errors() {
        let err = RequestError::Api(ApiError::BotBlocked);
        assert!(matches!(classify_error(&err), SinkError::Delivery(_)));
    }

    #[test]
    fn test_check_reply() {
        assert_eq!(check_reply(Ok(0)), "✅ No new tokens in trending.");
        assert_eq!(check_reply(Ok(2)), "✅ Check complete: 2 new token(s) sent.");
        assert!(check_reply(Err(CycleError::AlreadyRunning)).contains("already running"));
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/status", "trending_bot").ok(), Some(Command::Status));
        assert_eq!(Command::parse("/check", "trending_bot").ok(), Some(Command::Check));
        assert!(Command::parse("/premium 5", "trending_bot").is_err());

        let help = Command::descriptions().to_string();
        assert!(help.contains("/start"));
        assert!(help.contains("/check"));
    }
}
