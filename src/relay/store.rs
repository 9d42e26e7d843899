//! Pending queue store.
//!
//! Maps an [IdentityKey] to the messages waiting for that recipient, oldest first. A key is
//! present only while its queue is non-empty. Every mutation hands a snapshot to the
//! background persister (see [super::persist]); callers never see a half-applied change
//! because all mutation goes through `&mut self`.
//!
//! ```rust,no_run
//! use relaybot::relay::store::PendingStore;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = PendingStore::open_or_degrade("./data", Duration::from_millis(250)).await;
//!     println!("{} recipients have pending messages", store.len());
//! }
//! ```
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use super::errors::RelayError;
use super::identity::{IdentityKey, KnownUsers, UserRef};
use super::message::QueuedMessage;
use super::persist::{start_persister, PersistHandle, StoreFiles, StoreSnapshot};

#[derive(Debug, Default)]
pub struct PendingStore {
    pending: BTreeMap<IdentityKey, Vec<QueuedMessage>>,
    known: KnownUsers,
    persister: Option<PersistHandle>,
}

impl PendingStore {
    /// A store without persistence.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Build an in-memory store from an existing snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut pending = snapshot.pending;
        pending.retain(|_, queue| !queue.is_empty());
        Self {
            pending,
            known: snapshot.known,
            persister: None,
        }
    }

    /// Open the store in `data_dir`, loading whatever is on disk and starting the writer task.
    pub async fn open(data_dir: &str, coalesce: Duration) -> Result<Self, RelayError> {
        fs::create_dir_all(data_dir).await?;
        let files = StoreFiles::in_dir(data_dir);
        let snapshot = load_snapshot(&files).await;
        let mut store = Self::from_snapshot(snapshot);
        info!(
            "loaded {} pending queues and {} known users from {}",
            store.pending.len(),
            store.known.len(),
            data_dir
        );
        store.persister = Some(start_persister(files, coalesce));
        Ok(store)
    }

    /// Like [PendingStore::open] but falls back to an in-memory store when the data directory
    /// cannot be prepared, so the bot keeps working without persistence.
    pub async fn open_or_degrade(data_dir: &str, coalesce: Duration) -> Self {
        match Self::open(data_dir, coalesce).await {
            Ok(store) => store,
            Err(e) => {
                warn!(
                    "message storage unavailable at {}: {} (continuing without persistence)",
                    data_dir, e
                );
                Self::in_memory()
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persister.is_some()
    }

    /// Append a message to the queue for `key`. Returns the queue length afterwards.
    pub fn enqueue(&mut self, key: IdentityKey, message: QueuedMessage) -> usize {
        let queue = self.pending.entry(key).or_default();
        queue.push(message);
        let len = queue.len();
        self.persist();
        len
    }

    /// Remove and return the queue stored under exactly `key`.
    pub fn drain(&mut self, key: &IdentityKey) -> Option<Vec<QueuedMessage>> {
        let drained = self.pending.remove(key)?;
        self.persist();
        Some(drained)
    }

    /// Remove and return the queue for an observed user: id key first, then nickname key.
    pub fn drain_for(&mut self, user: &UserRef) -> Option<(IdentityKey, Vec<QueuedMessage>)> {
        let by_id = IdentityKey::by_id(user.id.clone());
        let by_nick = IdentityKey::by_nick(user.nick.clone());
        for key in [by_id, by_nick] {
            if key == IdentityKey::default() {
                continue;
            }
            if let Some(queue) = self.drain(&key) {
                debug!("drained {} messages for {}", queue.len(), key);
                return Some((key, queue));
            }
        }
        None
    }

    /// Record what an observed user told us about themselves.
    ///
    /// Learns the nick -> id mapping and folds any queue filed under the bare nickname into
    /// the id-keyed queue, keeping timestamp order. Returns true when anything changed.
    pub fn observe(&mut self, user: &UserRef) -> bool {
        if !self.known.learn(user) && !self.has_split_queue(user) {
            return false;
        }
        if !user.id.is_empty() && !user.nick.is_empty() {
            let from = IdentityKey::by_nick(user.nick.clone());
            self.rekey(&from, IdentityKey::by_id(user.id.clone()));
        }
        self.persist();
        true
    }

    /// Move the queue under `from` to `to`, merging by timestamp if `to` already has one.
    pub fn rekey(&mut self, from: &IdentityKey, to: IdentityKey) -> bool {
        if *from == to {
            return false;
        }
        let Some(moved) = self.pending.remove(from) else {
            return false;
        };
        let count = moved.len();
        debug!("moving {} queued messages from {} to {}", count, from, to);
        let queue = self.pending.entry(to).or_default();
        queue.extend(moved);
        // stable: equal timestamps keep their relative order
        queue.sort_by_key(|m| m.timestamp);
        self.persist();
        true
    }

    fn has_split_queue(&self, user: &UserRef) -> bool {
        !user.id.is_empty()
            && !user.nick.is_empty()
            && self.pending.contains_key(&IdentityKey::by_nick(user.nick.clone()))
    }

    pub fn pending_for(&self, key: &IdentityKey) -> &[QueuedMessage] {
        self.pending.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of recipients with pending messages.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn total_messages(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IdentityKey, &[QueuedMessage])> {
        self.pending.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn known(&self) -> &KnownUsers {
        &self.known
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            pending: self.pending.clone(),
            known: self.known.clone(),
        }
    }

    /// Wait for outstanding writes. No-op for in-memory stores.
    pub async fn flush(&self) -> Result<(), RelayError> {
        match &self.persister {
            Some(handle) => handle.flush().await,
            None => Ok(()),
        }
    }

    fn persist(&self) {
        if let Some(handle) = &self.persister {
            handle.save(self.snapshot());
        }
    }
}

/// Read both store files. Missing or unreadable files yield empty state.
pub async fn load_snapshot(files: &StoreFiles) -> StoreSnapshot {
    StoreSnapshot {
        pending: read_json_or_default(&files.messages).await,
        known: read_json_or_default(&files.identities).await,
    }
}

async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match fs::read_to_string(path).await {
        Ok(data) => {
            // Guard against any accidental leading NULs
            let cleaned = data.trim_start_matches('\0');
            if cleaned.trim().is_empty() {
                return T::default();
            }
            serde_json::from_str(cleaned).unwrap_or_else(|e| {
                warn!("error reading {}: {} (starting empty)", path.display(), e);
                T::default()
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => T::default(),
        Err(e) => {
            warn!("error opening {}: {} (starting empty)", path.display(), e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn msg(text: &str, offset_secs: i64) -> QueuedMessage {
        let at = Utc::now() + ChronoDuration::seconds(offset_secs);
        QueuedMessage::new(text, UserRef::nick_only("alice"), at, false)
    }

    #[test]
    fn drain_removes_key_entirely() {
        let mut store = PendingStore::in_memory();
        store.enqueue(IdentityKey::by_nick("bob"), msg("one", 0));
        store.enqueue(IdentityKey::by_nick("bob"), msg("two", 1));
        let (key, drained) = store.drain_for(&UserRef::nick_only("bob")).unwrap();
        assert_eq!(key, IdentityKey::by_nick("bob"));
        assert_eq!(
            drained.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(),
            ["one", "two"]
        );
        assert!(store.is_empty());
        assert!(store.drain_for(&UserRef::nick_only("bob")).is_none());
    }

    #[test]
    fn drain_prefers_id_key() {
        let mut store = PendingStore::in_memory();
        store.enqueue(IdentityKey::by_nick("bob"), msg("by nick", 0));
        store.enqueue(IdentityKey::by_id("42"), msg("by id", 0));
        let (key, _) = store.drain_for(&UserRef::new("bob", "42")).unwrap();
        assert_eq!(key, IdentityKey::by_id("42"));
        assert!(store.contains(&IdentityKey::by_nick("bob")));
    }

    #[test]
    fn observe_merges_nick_queue_into_id_queue() {
        let mut store = PendingStore::in_memory();
        store.enqueue(IdentityKey::by_id("42"), msg("later", 10));
        store.enqueue(IdentityKey::by_nick("bob"), msg("earlier", 0));
        assert!(store.observe(&UserRef::new("bob", "42")));
        assert!(!store.contains(&IdentityKey::by_nick("bob")));
        let texts: Vec<_> = store
            .pending_for(&IdentityKey::by_id("42"))
            .iter()
            .map(|m| m.text.clone())
            .collect();
        assert_eq!(texts, ["earlier", "later"]);
        assert_eq!(store.known().id_for("bob"), Some("42"));
        assert!(!store.observe(&UserRef::new("bob", "42")));
    }

    #[test]
    fn observe_without_id_changes_nothing() {
        let mut store = PendingStore::in_memory();
        store.enqueue(IdentityKey::by_nick("bob"), msg("hi", 0));
        assert!(!store.observe(&UserRef::nick_only("bob")));
        assert!(store.contains(&IdentityKey::by_nick("bob")));
    }

    #[test]
    fn from_snapshot_drops_empty_queues() {
        let mut snap = StoreSnapshot::default();
        snap.pending.insert(IdentityKey::by_nick("ghost"), Vec::new());
        let store = PendingStore::from_snapshot(snap);
        assert!(store.is_empty());
    }
}
