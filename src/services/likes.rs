//! Like batching queue
//!
//! Coalesces per-plugin like/unlike toggles over a shared delay window
//! before sending them to the backend, trading immediacy for batched
//! efficiency. The caller gets the new state back synchronously so the UI
//! can render optimistically while the batch is still pending.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::PublicApi;
use crate::models::Plugin;
use crate::utils::errors::Result;
use crate::utils::logging::log_like_batch;

/// A like toggle waiting for the next batch flush
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLike {
    pub user_id: String,
    pub is_liked: bool,
    /// Epoch milliseconds of the toggle
    pub timestamp: i64,
}

/// Debounced queue of like toggles, one shared timer for all plugins
pub struct LikeQueue {
    api: PublicApi,
    batch_delay: Duration,
    pending: Mutex<HashMap<String, PendingLike>>,
    processing: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
    weak_self: Weak<LikeQueue>,
}

impl LikeQueue {
    pub fn new(api: PublicApi, batch_delay: Duration) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            api,
            batch_delay,
            pending: Mutex::new(HashMap::new()),
            processing: AtomicBool::new(false),
            timer: Mutex::new(None),
            weak_self: weak.clone(),
        })
    }

    /// Toggle a like. The latest toggle per plugin wins; every toggle
    /// re-arms the shared debounce timer. Returns the new state
    /// synchronously for immediate UI feedback.
    pub fn toggle_like(&self, plugin_id: &str, user_id: &str, currently_liked: bool) -> bool {
        let is_liked = !currently_liked;

        {
            let mut pending = self.pending.lock().expect("like map poisoned");
            pending.insert(
                plugin_id.to_string(),
                PendingLike {
                    user_id: user_id.to_string(),
                    is_liked,
                    timestamp: Utc::now().timestamp_millis(),
                },
            );
            debug!(
                plugin_id = plugin_id,
                is_liked = is_liked,
                pending = pending.len(),
                "Like toggle buffered"
            );
        }

        self.arm_timer();
        is_liked
    }

    /// The buffered state for a plugin, if a toggle is waiting
    pub fn pending_status(&self, plugin_id: &str) -> Option<bool> {
        self.pending
            .lock()
            .expect("like map poisoned")
            .get(plugin_id)
            .map(|p| p.is_liked)
    }

    /// Like state as the user sees it: buffered toggle first, otherwise
    /// the server-reported list
    pub fn is_liked_effective(&self, plugin: &Plugin, user_id: &str) -> bool {
        self.pending_status(&plugin.id)
            .unwrap_or_else(|| plugin.liked_by.iter().any(|u| u == user_id))
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.lock().expect("like map poisoned").is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("like map poisoned").len()
    }

    /// Time left until the batch fires, measured from the oldest toggle
    pub fn remaining_time(&self) -> Duration {
        let pending = self.pending.lock().expect("like map poisoned");
        let oldest = match pending.values().map(|p| p.timestamp).min() {
            Some(ts) => ts,
            None => return Duration::ZERO,
        };
        let elapsed_ms = (Utc::now().timestamp_millis() - oldest).max(0) as u64;
        self.batch_delay
            .checked_sub(Duration::from_millis(elapsed_ms))
            .unwrap_or(Duration::ZERO)
    }

    /// Restart the shared debounce timer (cancelling any previous one)
    fn arm_timer(&self) {
        let weak = self.weak_self.clone();
        let delay = self.batch_delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(queue) = weak.upgrade() {
                if let Err(e) = queue.flush().await {
                    warn!(error = %e, "Scheduled like flush failed");
                }
            }
        });

        let mut timer = self.timer.lock().expect("timer slot poisoned");
        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
    }

    /// Send all buffered toggles as concurrent per-plugin requests. Only
    /// one flush runs at a time; toggles arriving mid-flight buffer for
    /// the next cycle. On any failure the in-flight entries are restored
    /// wholesale, except where a newer toggle already took the slot.
    pub async fn flush(&self) -> Result<()> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Like flush already in progress, buffering only");
            return Ok(());
        }

        let in_flight: HashMap<String, PendingLike> = {
            let mut pending = self.pending.lock().expect("like map poisoned");
            std::mem::take(&mut *pending)
        };

        if in_flight.is_empty() {
            self.processing.store(false, Ordering::SeqCst);
            return Ok(());
        }

        let requests = in_flight
            .iter()
            .map(|(plugin_id, like)| self.api.like_plugin(plugin_id, &like.user_id));
        let results = join_all(requests).await;
        let failure = results.into_iter().find_map(|r| r.err());

        match failure {
            None => {
                log_like_batch(self.pending_count(), in_flight.len(), true);
                self.processing.store(false, Ordering::SeqCst);
                Ok(())
            }
            Some(e) => {
                // All-or-nothing restore; last-toggle-wins is preserved by
                // never clobbering an entry re-added during the flight
                let mut pending = self.pending.lock().expect("like map poisoned");
                for (plugin_id, like) in in_flight {
                    pending.entry(plugin_id).or_insert(like);
                }
                log_like_batch(pending.len(), 0, false);
                drop(pending);
                self.processing.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}

impl Drop for LikeQueue {
    fn drop(&mut self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for LikeQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikeQueue")
            .field("batch_delay", &self.batch_delay)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}
