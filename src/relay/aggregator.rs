//! Flush path: deliver everything queued for a user the moment they are seen.
//!
//! Runs for every observed chat event, including empty presence pings. Queued messages are
//! split into a public and a private summary. Visibility only escalates: a message queued
//! privately is always delivered privately, and a flush triggered from a private event
//! delivers everything privately.
use chrono::{DateTime, Utc};
use log::debug;

use super::elapsed;
use super::message::{ChatEvent, Outbound, QueuedMessage};
use super::store::PendingStore;

/// Render one delivery summary, oldest message first.
pub fn summarize(messages: &[&QueuedMessage], now: DateTime<Utc>) -> String {
    let plural = if messages.len() > 1 { "s" } else { "" };
    let mut text = format!("you have {} new message{}\n", messages.len(), plural);
    for message in messages {
        text.push_str(&format!(
            "[{} ago] {}: {}\n",
            elapsed::ago(message.queued_at(), now),
            message.sender.nick,
            message.text
        ));
    }
    text
}

/// Flush the sender of `event`, timing messages against the current clock.
pub fn flush(store: &mut PendingStore, event: &ChatEvent) -> Vec<Outbound> {
    flush_at(store, event, Utc::now())
}

/// Drain the pending queue of the event's sender and build 0, 1 or 2 deliveries
/// (public first, then private), all addressed back to that sender.
pub fn flush_at(store: &mut PendingStore, event: &ChatEvent, now: DateTime<Utc>) -> Vec<Outbound> {
    store.observe(&event.sender);
    let Some((key, drained)) = store.drain_for(&event.sender) else {
        return Vec::new();
    };
    let (private, public): (Vec<&QueuedMessage>, Vec<&QueuedMessage>) =
        drained.iter().partition(|m| m.private || event.private);
    debug!(
        "flushing {} for {}: {} public, {} private",
        key,
        event.sender,
        public.len(),
        private.len()
    );

    let mut out = Vec::with_capacity(2);
    if !public.is_empty() {
        out.push(Outbound::to(event.sender.clone(), summarize(&public, now), false));
    }
    if !private.is_empty() {
        out.push(Outbound::to(event.sender.clone(), summarize(&private, now), true));
    }
    out
}
