//! Background writer that saves progression snapshots in order.
//!
//! Each session gets one writer task. Saves queued while a write is in
//! flight are coalesced to the newest snapshot. Failed writes are retried
//! with exponential backoff; the in-memory state is never rolled back.
//! Store calls run on the blocking pool so disk latency never holds up a
//! runtime worker.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::character::progression::PlayerProgression;
use crate::core::config::SessionConfig;
use crate::core::error::{Result, StorageError};
use crate::core::game_state::UserId;
use crate::storage::ProgressionStore;

enum SaveRequest {
    Save(Box<PlayerProgression>),
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl From<&SessionConfig> for RetryPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            attempts: config.save_retry_attempts.max(1),
            base_delay: Duration::from_millis(config.save_retry_base_ms),
        }
    }
}

/// Handle for queueing saves. Cheap to clone.
#[derive(Clone)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<SaveRequest>,
}

impl SaveQueue {
    /// Start the writer task for one user.
    pub fn spawn(
        user: UserId,
        store: Arc<dyn ProgressionStore>,
        policy: RetryPolicy,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_writer(user, store, policy, rx));
        (Self { tx }, task)
    }

    /// Fire-and-forget.
    pub fn save(&self, progression: PlayerProgression) {
        if self.tx.send(SaveRequest::Save(Box::new(progression))).is_err() {
            warn!("save queue closed, dropping snapshot");
        }
    }

    /// Wait until every save queued before this call has been attempted.
    pub async fn flush(&self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SaveRequest::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.await.is_ok()
    }
}

async fn run_writer(
    user: UserId,
    store: Arc<dyn ProgressionStore>,
    policy: RetryPolicy,
    mut rx: mpsc::UnboundedReceiver<SaveRequest>,
) {
    while let Some(request) = rx.recv().await {
        let mut latest = match request {
            SaveRequest::Save(progression) => progression,
            SaveRequest::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        // Coalesce up to the next flush marker.
        let mut pending_ack = None;
        while let Ok(next) = rx.try_recv() {
            match next {
                SaveRequest::Save(progression) => latest = progression,
                SaveRequest::Flush(ack) => {
                    pending_ack = Some(ack);
                    break;
                }
            }
        }

        if let Err(err) = save_with_retry(Arc::clone(&store), &user, &latest, policy).await {
            error!(user = %user, "giving up on save after {} attempts: {}", policy.attempts, err);
        }
        if let Some(ack) = pending_ack {
            let _ = ack.send(());
        }
    }
}

/// Run a synchronous store call on tokio's blocking pool.
pub async fn blocking<T, F>(store: Arc<dyn ProgressionStore>, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn ProgressionStore) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(|err| StorageError::Io(io::Error::other(err)))?
}

pub async fn save_with_retry(
    store: Arc<dyn ProgressionStore>,
    user: &UserId,
    progression: &PlayerProgression,
    policy: RetryPolicy,
) -> Result<()> {
    let mut attempt = 1;
    let mut delay = policy.base_delay;
    loop {
        let (user_id, snapshot) = (user.clone(), progression.clone());
        let saved = blocking(Arc::clone(&store), move |store| {
            store.save(&user_id, &snapshot)
        })
        .await;
        match saved {
            Ok(()) => return Ok(()),
            Err(err) if attempt < policy.attempts => {
                warn!(
                    user = %user,
                    attempt,
                    "save failed: {}; retrying in {:?}",
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
