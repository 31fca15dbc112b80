//! Telegram Bot API Adapter
//!
//! Implements the HTTP client for the Bot API methods the engine needs:
//! gift catalog listing, gift delivery, and plain-text notifications.
//!
//! Sub-modules:
//! - `client`: HTTP client with rate limiting and error classification
//! - `gifts`: `getAvailableGifts` / `sendGift` (catalog + acquisition ports)
//! - `messages`: `sendMessage` (notifier port)
//! - `types`: API request/response type definitions

pub mod client;
pub mod gifts;
pub mod messages;
pub mod types;

pub use client::{ApiCallError, BotApiClient};
pub use gifts::TelegramGifts;
pub use messages::TelegramNotifier;
