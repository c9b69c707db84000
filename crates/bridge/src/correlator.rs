//! In-flight call tracking.
//!
//! Each registered call gets a UUID v4 id, a oneshot completion slot and a
//! timer task. Only whoever removes the entry from the table may complete
//! it; anyone arriving later finds nothing and does nothing.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use gb_protocol::RemoteErrorPayload;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::BridgeError;

/// What a call eventually resolves to.
pub type CallOutcome = Result<Value, BridgeError>;

struct PendingCall {
    method: String,
    issued_at: Instant,
    timer: AbortHandle,
    tx: oneshot::Sender<CallOutcome>,
}

struct Inner {
    pending: Mutex<HashMap<String, PendingCall>>,
    timeout: Duration,
}

/// Table of outstanding calls. Cheap to clone; clones share the table.
#[derive(Clone)]
pub struct Correlator {
    inner: Arc<Inner>,
}

impl Correlator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                timeout,
            }),
        }
    }

    /// Per-call deadline applied by [`register`](Self::register).
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Register a new call and arm its timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn register(&self, method: &str) -> PendingHandle {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.inner.pending.lock();

        let mut id = uuid::Uuid::new_v4().to_string();
        while pending.contains_key(&id) {
            id = uuid::Uuid::new_v4().to_string();
        }

        // Spawned while the table is locked so the timer can never observe
        // the table before the entry exists.
        let timer = {
            let owner = Arc::downgrade(&self.inner);
            let id = id.clone();
            let timeout = self.inner.timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(inner) = owner.upgrade() {
                    inner.expire(&id);
                }
            })
            .abort_handle()
        };

        pending.insert(
            id.clone(),
            PendingCall {
                method: method.to_string(),
                issued_at: Instant::now(),
                timer,
                tx,
            },
        );
        tracing::trace!(id = %id, method, in_flight = pending.len(), "registered call");

        PendingHandle {
            id,
            rx,
            owner: Arc::downgrade(&self.inner),
        }
    }

    /// Resolve the call `id` with a decoded response.
    ///
    /// Returns `false` (and drops the outcome) when no such call is pending:
    /// a duplicate, a response to a call that already timed out, or traffic
    /// that was never ours.
    pub fn complete(&self, id: &str, outcome: Result<Value, RemoteErrorPayload>) -> bool {
        let Some(call) = self.inner.pending.lock().remove(id) else {
            tracing::warn!(id = %id, "dropping response for unknown or expired call");
            return false;
        };
        call.timer.abort();
        tracing::debug!(
            id = %id,
            method = %call.method,
            elapsed_ms = call.issued_at.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "call completed"
        );
        let _ = call.tx.send(outcome.map_err(BridgeError::from));
        true
    }

    /// Remove a call without completing it. Safe to call repeatedly.
    pub fn cancel(&self, id: &str) -> bool {
        self.inner.cancel(id)
    }

    /// Fail every pending call with `ConnectionClosed(reason)`.
    /// Returns the number of calls failed.
    pub fn fail_all(&self, reason: &str) -> usize {
        let drained: Vec<(String, PendingCall)> = self.inner.pending.lock().drain().collect();
        let count = drained.len();

        for (_, call) in drained {
            call.timer.abort();
            let _ = call
                .tx
                .send(Err(BridgeError::ConnectionClosed(reason.to_string())));
        }

        if count > 0 {
            tracing::warn!(failed_calls = count, reason, "failed in-flight calls");
        }
        count
    }

    /// Number of pending (in-flight) calls.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.pending.lock().contains_key(id)
    }
}

impl Inner {
    fn expire(&self, id: &str) {
        let Some(call) = self.pending.lock().remove(id) else {
            return;
        };
        tracing::warn!(
            id = %id,
            method = %call.method,
            timeout_ms = self.timeout.as_millis() as u64,
            "call timed out"
        );
        let _ = call.tx.send(Err(BridgeError::Timeout {
            method: call.method,
            after: self.timeout,
        }));
    }

    fn cancel(&self, id: &str) -> bool {
        match self.pending.lock().remove(id) {
            Some(call) => {
                call.timer.abort();
                tracing::trace!(id = %id, method = %call.method, "cancelled call");
                true
            }
            None => false,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PendingHandle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The caller's side of a registered call.
///
/// Dropping the handle before the call completes removes the entry and
/// stops its timer.
pub struct PendingHandle {
    id: String,
    rx: oneshot::Receiver<CallOutcome>,
    owner: Weak<Inner>,
}

impl PendingHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait until the call is completed, expires or is failed.
    pub async fn wait(mut self) -> CallOutcome {
        self.settled().await
    }

    /// Like [`wait`](Self::wait) without consuming the handle, so it can be
    /// raced against other work. Must not be polled again once it returned.
    pub async fn settled(&mut self) -> CallOutcome {
        match (&mut self.rx).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BridgeError::ConnectionClosed("call was cancelled".into())),
        }
    }
}

impl Drop for PendingHandle {
    fn drop(&mut self) {
        if let Some(inner) = self.owner.upgrade() {
            inner.cancel(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn complete_wakes_only_the_matching_call() {
        let correlator = Correlator::new(Duration::from_secs(10));
        let a = correlator.register("get_scene_tree");
        let b = correlator.register("select_node");
        assert_ne!(a.id(), b.id());
        assert_eq!(correlator.pending_count(), 2);

        assert!(correlator.complete(b.id(), Ok(json!({"selected": true}))));
        assert_eq!(b.wait().await.unwrap(), json!({"selected": true}));

        assert_eq!(correlator.pending_count(), 1);
        assert!(correlator.contains(a.id()));
    }

    #[tokio::test]
    async fn remote_error_payload_becomes_remote_error() {
        let correlator = Correlator::new(Duration::from_secs(10));
        let call = correlator.register("add_node");
        correlator.complete(
            call.id(),
            Err(RemoteErrorPayload {
                message: "Parent not found".into(),
                details: Some(json!({"parentPath": "/root/Nope"})),
            }),
        );

        match call.wait().await {
            Err(BridgeError::Remote { message, details }) => {
                assert_eq!(message, "Parent not found");
                assert_eq!(details, Some(json!({"parentPath": "/root/Nope"})));
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_id_is_dropped() {
        let correlator = Correlator::new(Duration::from_secs(10));
        let call = correlator.register("notify");
        assert!(!correlator.complete("not-a-real-id", Ok(json!(1))));
        assert!(correlator.contains(call.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_removes_entry_and_late_response_is_dropped() {
        let correlator = Correlator::new(Duration::from_secs(10));
        let call = correlator.register("get_editor_logs");
        let id = call.id().to_string();

        match call.wait().await {
            Err(BridgeError::Timeout { method, after }) => {
                assert_eq!(method, "get_editor_logs");
                assert_eq!(after, Duration::from_secs(10));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }

        assert_eq!(correlator.pending_count(), 0);
        assert!(!correlator.complete(&id, Ok(json!("late"))));
    }

    #[tokio::test(start_paused = true)]
    async fn response_before_deadline_disarms_timer() {
        let correlator = Correlator::new(Duration::from_secs(1));
        let call = correlator.register("save_scene");
        correlator.complete(call.id(), Ok(json!(null)));

        // Well past the deadline: the aborted timer must not fire.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(call.wait().await.unwrap(), json!(null));
    }

    #[tokio::test]
    async fn fail_all_completes_everything_once() {
        let correlator = Correlator::new(Duration::from_secs(10));
        let calls: Vec<_> = (0..3).map(|_| correlator.register("get_node_info")).collect();

        assert_eq!(correlator.fail_all("editor went away"), 3);
        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(correlator.fail_all("again"), 0);

        for call in calls {
            match call.wait().await {
                Err(BridgeError::ConnectionClosed(reason)) => assert_eq!(reason, "editor went away"),
                other => panic!("expected ConnectionClosed, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let correlator = Correlator::new(Duration::from_secs(10));
        let call = correlator.register("open_scene");
        let id = call.id().to_string();

        assert!(correlator.cancel(&id));
        assert!(!correlator.cancel(&id));
        assert!(!correlator.complete(&id, Ok(json!(1))));
        drop(call);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn dropping_the_handle_releases_the_entry() {
        let correlator = Correlator::new(Duration::from_secs(10));
        let call = correlator.register("run_project");
        assert_eq!(correlator.pending_count(), 1);
        drop(call);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn abandoned_wait_releases_the_entry() {
        let correlator = Correlator::new(Duration::from_secs(10));
        let call = correlator.register("build_project");

        let waited = tokio::time::timeout(Duration::from_millis(10), call.wait()).await;
        assert!(waited.is_err());
        assert_eq!(correlator.pending_count(), 0);
    }
}
