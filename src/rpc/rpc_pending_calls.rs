use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::rpc::RpcError;

/// Completion handle for one in-flight call: resolved with the raw reply
/// payload or failed with the call's error, exactly once. The suspended
/// caller holds the receiving end and performs the typed decode itself
/// after resumption.
pub type CallCompletion = oneshot::Sender<Result<Bytes, RpcError>>;

/// Registry of calls that have been sent but not yet answered, keyed by
/// request ID.
///
/// Shared between a connection's send path, which registers entries, and
/// its receive loop, which removes them. The lock is internal and never
/// held across a suspension point.
pub struct PendingCalls {
    entries: Mutex<HashMap<i64, CallCompletion>>,
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Makes `id` awaitable. IDs are allocated monotonically under the send
    /// permit, so a duplicate means ID allocation is broken: debug builds
    /// assert, while release builds silently replace the prior entry and
    /// the displaced caller fails with [`RpcError::Stopped`] when its
    /// completion is dropped.
    pub fn register(&self, id: i64, completion: CallCompletion) {
        let previous = self.lock().insert(id, completion);
        debug_assert!(previous.is_none(), "request ID {id} registered twice");
    }

    /// Removes and returns the completion for `id`, if present.
    ///
    /// `None` means the entry was already settled, or never existed; the
    /// receive loop treats that as a response to discard.
    pub fn try_remove(&self, id: i64) -> Option<CallCompletion> {
        self.lock().remove(&id)
    }

    /// Empties the registry, returning every outstanding completion. Used
    /// when the client stops and its in-flight calls must all be failed.
    pub fn drain_all(&self) -> Vec<CallCompletion> {
        self.lock().drain().map(|(_, completion)| completion).collect()
    }

    // A panic while holding the lock leaves the map consistent (plain
    // inserts and removes), so a poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<i64, CallCompletion>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
