//! # Relaybot - offline message relay for chat bots
//!
//! When someone addresses a user who is not around (`!msg bob see you at 6`), the message is
//! queued. The next time bob is seen saying anything, everything queued for him is delivered
//! as a short summary. Direct relays (`!tell`, `!whisper`) reach online users immediately.
//!
//! ## Features
//!
//! - **Identity resolution**: recipients are keyed by stable id when one is known (online
//!   directory, `nick#id` token, or a previously learned id) and by nickname otherwise.
//! - **Visibility aware delivery**: public and private queued messages are summarized
//!   separately; a private trigger delivers everything privately.
//! - **Durable queue**: JSON files written in the background with save coalescing, file
//!   locking and atomic replace.
//! - **Graceful degradation**: missing or broken storage never stops the bot.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relaybot::config::Config;
//! use relaybot::relay::{ChatEvent, OnlineUsers, RelayBot, UserRef};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut bot = RelayBot::open(&config).await;
//!     let online = OnlineUsers::new();
//!
//!     let event = ChatEvent::new(UserRef::nick_only("alice"), "!msg bob hello", false);
//!     for out in bot.handle_event(&event, &online) {
//!         println!("{}", out.text);
//!     }
//!     bot.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`relay`] - queue, identity resolution, flush and command handling
//! - [`config`] - configuration loading
//! - [`validation`] - address token parsing
//! - [`logutil`] - log sanitizing
//! - [`console`] - stdin/stdout host used by the `relaybot` binary

pub mod config;
pub mod console;
pub mod logutil;
pub mod relay;
pub mod validation;
