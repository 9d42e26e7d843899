//! Background write-back for the pending queue store.
//!
//! Mutations hand a full snapshot to a single writer task through [PersistHandle::save] and
//! return immediately. The task keeps only the newest snapshot and writes at most once per
//! coalescing window, so a burst of enqueues costs one file rewrite. Every write takes an
//! exclusive `fs2` lock on the destination and replaces it atomically via a temp file.
//!
//! Failures are logged and dropped; the in-memory store stays authoritative until the next
//! successful write.
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use fs2::FileExt;

use super::errors::RelayError;
use super::identity::{IdentityKey, KnownUsers};
use super::message::QueuedMessage;

pub const MESSAGES_FILE: &str = "messages.json";
pub const IDENTITIES_FILE: &str = "identities.json";

/// Location of the two store files inside a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFiles {
    pub messages: PathBuf,
    pub identities: PathBuf,
}

impl StoreFiles {
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            messages: dir.join(MESSAGES_FILE),
            identities: dir.join(IDENTITIES_FILE),
        }
    }
}

/// Full copy of the persisted state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub pending: BTreeMap<IdentityKey, Vec<QueuedMessage>>,
    pub known: KnownUsers,
}

impl StoreSnapshot {
    /// Write both files. Runs blocking file IO.
    pub fn write_to(&self, files: &StoreFiles) -> Result<(), RelayError> {
        let messages = serde_json::to_string_pretty(&self.pending)?;
        write_file_locked(&files.messages, &messages)?;
        let identities = serde_json::to_string_pretty(&self.known)?;
        write_file_locked(&files.identities, &identities)?;
        Ok(())
    }
}

enum PersistCommand {
    Save(StoreSnapshot),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone, Debug)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistHandle {
    /// Queue a snapshot for writing. Never blocks.
    pub fn save(&self, snapshot: StoreSnapshot) {
        if self.tx.send(PersistCommand::Save(snapshot)).is_err() {
            warn!("persistence task stopped; snapshot dropped");
        }
    }

    /// Wait until every snapshot queued before this call has been written (or failed).
    pub async fn flush(&self) -> Result<(), RelayError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PersistCommand::Flush(tx))
            .map_err(|_| RelayError::PersisterStopped)?;
        rx.await.map_err(|_| RelayError::PersisterStopped)
    }
}

/// Spawn the writer task. Must be called inside a Tokio runtime.
pub fn start_persister(files: StoreFiles, coalesce: Duration) -> PersistHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<PersistCommand>();

    tokio::spawn(async move {
        let mut pending: Option<StoreSnapshot> = None;
        let mut deadline: Option<Instant> = None;
        let mut writes: u64 = 0;
        loop {
            let cmd = match deadline {
                Some(at) => tokio::select! {
                    cmd = rx.recv() => cmd,
                    _ = tokio::time::sleep_until(at) => {
                        if let Some(snapshot) = pending.take() {
                            write_snapshot(&files, snapshot).await;
                            writes += 1;
                        }
                        deadline = None;
                        continue;
                    }
                },
                None => rx.recv().await,
            };
            match cmd {
                Some(PersistCommand::Save(snapshot)) => {
                    if pending.replace(snapshot).is_some() {
                        debug!("coalesced pending store save");
                    }
                    if deadline.is_none() {
                        deadline = Some(Instant::now() + coalesce);
                    }
                }
                Some(PersistCommand::Flush(done)) => {
                    if let Some(snapshot) = pending.take() {
                        write_snapshot(&files, snapshot).await;
                        writes += 1;
                    }
                    deadline = None;
                    let _ = done.send(());
                }
                None => {
                    // All handles dropped: write whatever is left and stop
                    if let Some(snapshot) = pending.take() {
                        write_snapshot(&files, snapshot).await;
                        writes += 1;
                    }
                    break;
                }
            }
        }
        debug!("persistence task terminated after {} writes", writes);
    });

    PersistHandle { tx }
}

async fn write_snapshot(files: &StoreFiles, snapshot: StoreSnapshot) {
    let target = files.clone();
    let keys = snapshot.pending.len();
    let result = tokio::task::spawn_blocking(move || snapshot.write_to(&target))
        .await
        .map_err(|e| RelayError::Internal(e.to_string()))
        .and_then(|r| r);
    let path = files.messages.display();
    match result {
        Ok(()) => debug!("saved pending store ({} keys) to {}", keys, path),
        Err(e) => warn!("error writing message store {}: {}", path, e),
    }
}

/// Replace `path` with `content` under an exclusive lock, via a temp file and rename.
pub fn write_file_locked(path: &Path, content: &str) -> Result<(), RelayError> {
    use std::fs::{self, File, OpenOptions};
    use std::io::Write;

    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("store.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        let attempt = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate);
        match attempt {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(e.into()),
        }
    };

    fs::rename(&tmp_path, path)?;
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    drop(lock_file);
    Ok(())
}
