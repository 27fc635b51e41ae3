//! Telegram alerting for trending tokens.
//!
//! This crate provides:
//! - HTML message formatting
//! - A Telegram notification sink
//! - Bot command handlers (/start, /status, /check, /help)

pub mod format;
pub mod telegram;

pub use format::{escape_html, format_market_cap, HtmlFormatter};
pub use telegram::{BotSettings, Command, TelegramBot, TelegramError, TelegramSink};
