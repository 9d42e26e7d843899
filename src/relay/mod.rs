//! # Relay Core Module
//!
//! Offline message relay: when someone addresses a user who is not around, the message is
//! queued; the next time that user is seen speaking, everything queued for them is
//! delivered as a summary.
//!
//! ## Components
//!
//! - [`identity`] - identity keys, sender snapshots, learned nick/id directory, resolver
//! - [`directory`] - online directory supplied by the host
//! - [`message`] - inbound events, queued messages, outbound deliveries
//! - [`store`] - pending queue store with load/save
//! - [`persist`] - background write-back with save coalescing
//! - [`elapsed`] - "time ago" coarsening
//! - [`aggregator`] - flush path
//! - [`commands`] - `message`, `tell`, `whisper`, `say`
//! - [`bot`] - per-event orchestration
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────────┐
//! │  ChatEvent      │ ← every line the host sees
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Aggregator     │ ← flush sender's queue (0-2 deliveries)
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Commands       │ ← msg enqueues; tell/whisper/say relay directly
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  PendingStore   │ ← snapshot handed to the persister after each mutation
//! └─────────────────┘
//! ```

pub mod aggregator;
pub mod bot;
pub mod commands;
pub mod directory;
pub mod elapsed;
pub mod errors;
pub mod identity;
pub mod message;
pub mod persist;
pub mod store;

pub use bot::RelayBot;
pub use directory::{OnlineDirectory, OnlineUser, OnlineUsers};
pub use errors::RelayError;
pub use identity::{IdentityKey, KnownUsers, UserRef};
pub use message::{ChatEvent, Outbound, QueuedMessage};
pub use store::PendingStore;
