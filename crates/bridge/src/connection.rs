//! Connection manager: owns the single link to the editor and drives its
//! `Disconnected -> Connecting -> Connected` lifecycle.
//!
//! Every successful open gets a new generation number. Reader and writer
//! tasks carry the generation they were spawned for, and anything they try
//! to do on behalf of a stale generation is ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use futures_util::{SinkExt, StreamExt};
use gb_protocol::CallResponse;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use crate::correlator::Correlator;
use crate::error::BridgeError;
use crate::reconnect::{ReconnectBackoff, ReconnectPolicy};
use crate::transport::{Connector, FrameSink, FrameStream, Link};

const OUTBOUND_BUFFER: usize = 64;
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Observable lifecycle state of the editor link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Snapshot for health output.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub state: ConnectionState,
    pub endpoint: String,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
}

/// Knobs for [`ConnectionManager::new`].
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub connect_timeout: Duration,
    pub max_frame_bytes: usize,
    pub policy: ReconnectPolicy,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_frame_bytes: 16 * 1024 * 1024,
            policy: ReconnectPolicy::Passive,
        }
    }
}

type SharedAttempt = Shared<BoxFuture<'static, Result<(), BridgeError>>>;

enum Slot {
    Disconnected,
    Connecting {
        attempt: SharedAttempt,
        task: AbortHandle,
        generation: u64,
    },
    Connected(LiveLink),
}

struct LiveLink {
    generation: u64,
    outbound: mpsc::Sender<String>,
    reader: AbortHandle,
    /// Tells the writer to drop whatever is still queued and close.
    halt: CancellationToken,
    connected_at: DateTime<Utc>,
}

impl LiveLink {
    fn retire(self) {
        self.reader.abort();
        self.halt.cancel();
    }
}

struct Inner {
    connector: Arc<dyn Connector>,
    correlator: Correlator,
    options: ConnectionOptions,
    slot: Mutex<Slot>,
    generation: AtomicU64,
    state_tx: watch::Sender<ConnectionState>,
    reconnect: Mutex<Option<CancellationToken>>,
}

/// Handle to the editor link. Cheap to clone; clones share the link.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Inbound responses are routed to `correlator`; dropped links fail
    /// every call pending in it.
    pub fn new(
        connector: Arc<dyn Connector>,
        correlator: Correlator,
        options: ConnectionOptions,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                connector,
                correlator,
                options,
                slot: Mutex::new(Slot::Disconnected),
                generation: AtomicU64::new(0),
                state_tx,
                reconnect: Mutex::new(None),
            }),
        }
    }

    /// Resolve once the link is open.
    ///
    /// Callers arriving while an attempt is in flight share that attempt and
    /// its outcome; at most one transport connect runs at a time.
    pub async fn ensure_connected(&self) -> Result<(), BridgeError> {
        self.inner.ensure_connected().await
    }

    /// Connect once. Under the active policy a failed attempt is handed to
    /// the background reconnect loop instead of being left for the next call.
    pub async fn start(&self) -> Result<(), BridgeError> {
        let result = self.inner.ensure_connected().await;
        if result.is_err() {
            self.inner.schedule_reconnect();
        }
        result
    }

    /// Queue a frame on the live link.
    pub async fn send(&self, frame: String) -> Result<(), BridgeError> {
        let outbound = match &*self.inner.slot.lock() {
            Slot::Connected(link) => link.outbound.clone(),
            _ => return Err(BridgeError::Send("editor is not connected".into())),
        };
        outbound
            .send(frame)
            .await
            .map_err(|_| BridgeError::Send("editor link is closing".into()))
    }

    /// Tear everything down: stop background reconnection, abort a pending
    /// connect, close the live link and fail all pending calls.
    /// Safe to call any number of times.
    pub fn disconnect_all(&self) {
        if let Some(token) = self.inner.reconnect.lock().take() {
            token.cancel();
        }

        let mut slot = self.inner.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Disconnected) {
            Slot::Disconnected => {}
            Slot::Connecting { task, generation, .. } => {
                task.abort();
                tracing::info!(generation, "aborted connection attempt");
            }
            Slot::Connected(link) => {
                tracing::info!(generation = link.generation, "disconnected from editor");
                link.retire();
            }
        }
        self.inner.publish(ConnectionState::Disconnected);
        self.inner.correlator.fail_all("disconnected");
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn endpoint(&self) -> &str {
        self.inner.connector.endpoint()
    }

    pub fn info(&self) -> ConnectionInfo {
        let slot = self.inner.slot.lock();
        let (state, connected_at) = match &*slot {
            Slot::Disconnected => (ConnectionState::Disconnected, None),
            Slot::Connecting { .. } => (ConnectionState::Connecting, None),
            Slot::Connected(link) => (ConnectionState::Connected, Some(link.connected_at)),
        };
        ConnectionInfo {
            state,
            endpoint: self.inner.connector.endpoint().to_string(),
            generation: self.inner.generation.load(Ordering::SeqCst),
            connected_at,
        }
    }
}

impl Inner {
    async fn ensure_connected(self: &Arc<Self>) -> Result<(), BridgeError> {
        match self.attempt() {
            Some(attempt) => attempt.await,
            None => Ok(()),
        }
    }

    /// The in-flight attempt to wait on, starting one if needed.
    /// `None` when already connected.
    fn attempt(self: &Arc<Self>) -> Option<SharedAttempt> {
        let mut slot = self.slot.lock();
        match &*slot {
            Slot::Connected(_) => None,
            Slot::Connecting { attempt, .. } => Some(attempt.clone()),
            Slot::Disconnected => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let handle = tokio::spawn(Arc::clone(self).open(generation));
                let task = handle.abort_handle();
                let attempt = async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(e) if e.is_cancelled() => Err(BridgeError::Connection(
                            "connection attempt aborted".into(),
                        )),
                        Err(e) => Err(BridgeError::Connection(format!(
                            "connection task failed: {e}"
                        ))),
                    }
                }
                .boxed()
                .shared();

                *slot = Slot::Connecting {
                    attempt: attempt.clone(),
                    task,
                    generation,
                };
                self.publish(ConnectionState::Connecting);
                Some(attempt)
            }
        }
    }

    async fn open(self: Arc<Self>, generation: u64) -> Result<(), BridgeError> {
        let endpoint = self.connector.endpoint().to_string();
        tracing::info!(endpoint = %endpoint, generation, "connecting to editor");

        let connect = tokio::time::timeout(self.options.connect_timeout, self.connector.connect());
        let link = match connect.await {
            Ok(Ok(link)) => link,
            Ok(Err(e)) => {
                let err = BridgeError::Connection(format!("{endpoint}: {e}"));
                self.abandon_attempt(generation, &err);
                return Err(err);
            }
            Err(_) => {
                let err = BridgeError::Connection(format!(
                    "{endpoint}: no answer within {}ms",
                    self.options.connect_timeout.as_millis()
                ));
                self.abandon_attempt(generation, &err);
                return Err(err);
            }
        };

        self.install(generation, link)?;
        tracing::info!(endpoint = %endpoint, generation, "connected to editor");
        Ok(())
    }

    fn abandon_attempt(&self, generation: u64, err: &BridgeError) {
        let mut slot = self.slot.lock();
        if matches!(&*slot, Slot::Connecting { generation: g, .. } if *g == generation) {
            *slot = Slot::Disconnected;
            self.publish(ConnectionState::Disconnected);
        }
        tracing::warn!(generation, error = %err, "connection attempt failed");
    }

    /// Promote a freshly opened link to the live one, unless the attempt
    /// was superseded while connecting.
    fn install(self: &Arc<Self>, generation: u64, link: Link) -> Result<(), BridgeError> {
        let mut slot = self.slot.lock();
        if !matches!(&*slot, Slot::Connecting { generation: g, .. } if *g == generation) {
            tracing::debug!(generation, "discarding superseded link");
            return Err(BridgeError::Connection(
                "connection attempt superseded".into(),
            ));
        }

        let Link { sink, stream } = link;
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let halt = CancellationToken::new();
        let owner = Arc::downgrade(self);
        tokio::spawn(write_loop(
            owner.clone(),
            generation,
            sink,
            outbound_rx,
            halt.clone(),
        ));
        let reader = tokio::spawn(read_loop(owner, generation, stream)).abort_handle();

        *slot = Slot::Connected(LiveLink {
            generation,
            outbound,
            reader,
            halt,
            connected_at: Utc::now(),
        });
        self.publish(ConnectionState::Connected);
        Ok(())
    }

    /// Route one inbound frame to its pending call.
    fn dispatch(&self, generation: u64, text: &str) {
        if text.len() > self.options.max_frame_bytes {
            tracing::warn!(
                bytes = text.len(),
                max = self.options.max_frame_bytes,
                "inbound frame exceeds max_frame_bytes, dropping"
            );
            return;
        }

        let response = match CallResponse::decode(text) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable frame");
                return;
            }
        };
        let (id, outcome) = response.into_outcome();

        let slot = self.slot.lock();
        match &*slot {
            Slot::Connected(link) if link.generation == generation => {
                self.correlator.complete(&id, outcome);
            }
            _ => tracing::debug!(id = %id, generation, "dropping frame from stale link"),
        }
    }

    /// The link of `generation` died underneath us.
    fn on_link_down(self: &Arc<Self>, generation: u64, reason: &str) {
        {
            let mut slot = self.slot.lock();
            if !matches!(&*slot, Slot::Connected(link) if link.generation == generation) {
                return;
            }
            if let Slot::Connected(link) = std::mem::replace(&mut *slot, Slot::Disconnected) {
                link.retire();
            }
            self.publish(ConnectionState::Disconnected);
            tracing::warn!(generation, reason, "editor link lost");
            self.correlator.fail_all(reason);
        }
        self.schedule_reconnect();
    }

    /// Start the background reconnect loop if the policy asks for one and
    /// none is running.
    fn schedule_reconnect(self: &Arc<Self>) {
        let ReconnectPolicy::Active(backoff) = &self.options.policy else {
            return;
        };

        let token = {
            let mut current = self.reconnect.lock();
            if current.as_ref().is_some_and(|t| !t.is_cancelled()) {
                return;
            }
            let token = CancellationToken::new();
            *current = Some(token.clone());
            token
        };

        tokio::spawn(reconnect_loop(Arc::downgrade(self), backoff.clone(), token));
    }

    fn publish(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(token) = self.reconnect.get_mut().take() {
            token.cancel();
        }
        match std::mem::replace(self.slot.get_mut(), Slot::Disconnected) {
            Slot::Connecting { task, .. } => task.abort(),
            Slot::Connected(link) => link.retire(),
            Slot::Disconnected => {}
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Link tasks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn read_loop(owner: Weak<Inner>, generation: u64, mut stream: FrameStream) {
    let reason = loop {
        match stream.next().await {
            Some(Ok(text)) => match owner.upgrade() {
                Some(inner) => inner.dispatch(generation, &text),
                None => return,
            },
            Some(Err(e)) => break format!("read failed: {e}"),
            None => break "editor closed the connection".to_string(),
        }
    };

    if let Some(inner) = owner.upgrade() {
        inner.on_link_down(generation, &reason);
    }
}

async fn write_loop(
    owner: Weak<Inner>,
    generation: u64,
    mut sink: FrameSink,
    mut outbound: mpsc::Receiver<String>,
    halt: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = halt.cancelled() => break,
            next = outbound.recv() => match next {
                Some(frame) => frame,
                None => break,
            },
        };

        let sent = tokio::select! {
            biased;
            _ = halt.cancelled() => {
                // The frame's call has already been failed. Leave the sink
                // unflushed so it never reaches the editor.
                tracing::debug!(generation, "link retired mid-write, discarding frame");
                outbound.close();
                return;
            }
            r = sink.send(frame) => r,
        };
        if let Err(e) = sent {
            if let Some(inner) = owner.upgrade() {
                inner.on_link_down(generation, &format!("write failed: {e}"));
            }
            return;
        }
    }

    // Retired locally: frames still queued belong to calls that were
    // already failed, so they are dropped rather than written.
    outbound.close();
    let mut discarded = 0usize;
    while outbound.try_recv().is_ok() {
        discarded += 1;
    }
    if discarded > 0 {
        tracing::debug!(generation, discarded, "dropped queued frames of retired link");
    }

    match tokio::time::timeout(CLOSE_GRACE, sink.close()).await {
        Ok(Ok(())) => tracing::debug!(generation, "closed editor link"),
        Ok(Err(e)) => tracing::debug!(generation, error = %e, "error closing editor link"),
        Err(_) => tracing::debug!(generation, "editor did not acknowledge close"),
    }
}

async fn reconnect_loop(owner: Weak<Inner>, backoff: ReconnectBackoff, token: CancellationToken) {
    let mut schedule = backoff.schedule();

    loop {
        let Some(delay) = schedule.next_delay() else {
            tracing::error!(attempts = schedule.failures(), "max reconnect attempts exhausted");
            break;
        };

        tracing::info!(
            delay_ms = delay.as_millis() as u64,
            attempt = schedule.failures() + 1,
            "reconnecting to editor"
        );
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = token.cancelled() => return,
        }

        let Some(inner) = owner.upgrade() else {
            return;
        };
        let result = tokio::select! {
            r = inner.ensure_connected() => r,
            _ = token.cancelled() => return,
        };

        match result {
            Ok(()) => {
                // If the fresh link already dropped, its on_link_down saw our
                // token and skipped scheduling; keep going in that case.
                let mut current = inner.reconnect.lock();
                if token.is_cancelled() {
                    return;
                }
                if *inner.state_tx.borrow() == ConnectionState::Connected {
                    *current = None;
                    tracing::info!("reconnected to editor");
                    return;
                }
                schedule.reset();
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt = schedule.failures() + 1, "reconnect attempt failed");
                schedule.failed();
            }
        }
    }

    if let Some(inner) = owner.upgrade() {
        let mut current = inner.reconnect.lock();
        if !token.is_cancelled() {
            *current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use futures_util::{sink, stream};
    use gb_protocol::CallRequest;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// In-memory editor: every `connect` yields a link whose outbound frames
    /// land in `sent` and whose inbound frames come from the paired sender.
    struct MemoryConnector {
        connects: AtomicUsize,
        links: Mutex<Vec<mpsc::UnboundedSender<String>>>,
        sent: mpsc::UnboundedSender<String>,
    }

    impl MemoryConnector {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (sent, sent_rx) = mpsc::unbounded_channel();
            let connector = Arc::new(Self {
                connects: AtomicUsize::new(0),
                links: Mutex::new(Vec::new()),
                sent,
            });
            (connector, sent_rx)
        }

        /// Inbound side of the most recent link.
        fn editor(&self) -> mpsc::UnboundedSender<String> {
            self.links.lock().last().cloned().expect("no link opened")
        }

        /// Simulate the editor hanging up on the most recent link.
        fn hang_up(&self) {
            self.links.lock().clear();
        }
    }

    #[async_trait]
    impl Connector for MemoryConnector {
        async fn connect(&self) -> Result<Link, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;

            let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();
            self.links.lock().push(inbound_tx);

            let sent = self.sent.clone();
            let sink = sink::unfold(sent, |sent, frame: String| async move {
                sent.send(frame).map_err(|_| TransportError::Closed)?;
                Ok::<_, TransportError>(sent)
            });
            let stream = stream::unfold(inbound_rx, |mut rx| async move {
                rx.recv()
                    .await
                    .map(|frame| (Ok::<_, TransportError>(frame), rx))
            });

            Ok(Link {
                sink: Box::pin(sink),
                stream: Box::pin(stream),
            })
        }

        fn endpoint(&self) -> &str {
            "memory://editor"
        }
    }

    /// Never finishes connecting.
    struct StuckConnector;

    #[async_trait]
    impl Connector for StuckConnector {
        async fn connect(&self) -> Result<Link, TransportError> {
            futures_util::future::pending().await
        }

        fn endpoint(&self) -> &str {
            "memory://stuck"
        }
    }

    fn setup(
        connector: Arc<dyn Connector>,
        options: ConnectionOptions,
    ) -> (ConnectionManager, Correlator) {
        let correlator = Correlator::new(Duration::from_secs(10));
        let manager = ConnectionManager::new(connector, correlator.clone(), options);
        (manager, correlator)
    }

    #[tokio::test]
    async fn connects_once_for_concurrent_callers() {
        let (connector, _sent) = MemoryConnector::new();
        let (manager, _) = setup(connector.clone(), ConnectionOptions::default());

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let m = manager.clone();
                tokio::spawn(async move { m.ensure_connected().await })
            })
            .collect();
        for a in attempts {
            a.await.unwrap().unwrap();
        }

        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(manager.info().generation, 1);
        assert!(manager.info().connected_at.is_some());
    }

    #[tokio::test]
    async fn send_before_connect_is_a_send_error() {
        let (connector, _sent) = MemoryConnector::new();
        let (manager, _) = setup(connector, ConnectionOptions::default());
        let err = manager.send("{}".into()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Send(_)));
    }

    #[tokio::test]
    async fn routes_responses_to_the_correlator() {
        let (connector, mut sent) = MemoryConnector::new();
        let (manager, correlator) = setup(connector.clone(), ConnectionOptions::default());
        manager.ensure_connected().await.unwrap();

        let call = correlator.register("get_scene_tree");
        let frame = CallRequest::new(call.id(), "get_scene_tree", json!(null))
            .encode()
            .unwrap();
        manager.send(frame).await.unwrap();

        let request: serde_json::Value = serde_json::from_str(&sent.recv().await.unwrap()).unwrap();
        assert_eq!(request["method"], "get_scene_tree");
        assert_eq!(request["params"], json!({}));

        let reply = json!({"id": request["id"], "result": {"name": "Main"}}).to_string();
        connector.editor().send(reply).unwrap();
        assert_eq!(call.wait().await.unwrap(), json!({"name": "Main"}));
    }

    #[tokio::test]
    async fn oversized_and_garbage_frames_are_dropped() {
        let (connector, _sent) = MemoryConnector::new();
        let options = ConnectionOptions {
            max_frame_bytes: 64,
            ..Default::default()
        };
        let (manager, correlator) = setup(connector.clone(), options);
        manager.ensure_connected().await.unwrap();

        let call = correlator.register("get_editor_logs");
        let editor = connector.editor();
        editor
            .send(json!({"id": call.id(), "result": "x".repeat(128)}).to_string())
            .unwrap();
        editor.send("not json".into()).unwrap();
        editor.send(json!({"id": call.id(), "result": 1}).to_string()).unwrap();

        assert_eq!(call.wait().await.unwrap(), json!(1));
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn remote_close_fails_pending_and_disconnects() {
        let (connector, _sent) = MemoryConnector::new();
        let (manager, correlator) = setup(connector.clone(), ConnectionOptions::default());
        let mut states = manager.subscribe();
        manager.ensure_connected().await.unwrap();

        let call = correlator.register("run_project");
        connector.hang_up();

        assert!(matches!(call.wait().await, Err(BridgeError::ConnectionClosed(_))));
        states
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();
        assert_eq!(correlator.pending_count(), 0);

        // Passive: the next ensure_connected opens a fresh link.
        manager.ensure_connected().await.unwrap();
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
        assert_eq!(manager.info().generation, 2);
    }

    #[tokio::test]
    async fn disconnect_all_is_idempotent() {
        let (connector, _sent) = MemoryConnector::new();
        let (manager, correlator) = setup(connector, ConnectionOptions::default());

        manager.disconnect_all();
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.ensure_connected().await.unwrap();
        let call = correlator.register("save_scene");
        manager.disconnect_all();
        manager.disconnect_all();

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        match call.wait().await {
            Err(BridgeError::ConnectionClosed(reason)) => assert_eq!(reason, "disconnected"),
            other => panic!("expected ConnectionClosed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disconnect_all_aborts_a_pending_attempt() {
        let (manager, _) = setup(Arc::new(StuckConnector), ConnectionOptions::default());

        let waiter = {
            let m = manager.clone();
            tokio::spawn(async move { m.ensure_connected().await })
        };
        let mut states = manager.subscribe();
        states
            .wait_for(|s| *s == ConnectionState::Connecting)
            .await
            .unwrap();

        manager.disconnect_all();
        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err, BridgeError::Connection(_)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_timeout_is_a_connection_error() {
        let options = ConnectionOptions {
            connect_timeout: Duration::from_secs(3),
            ..Default::default()
        };
        let (manager, _) = setup(Arc::new(StuckConnector), options);

        let err = manager.ensure_connected().await.unwrap_err();
        assert!(matches!(err, BridgeError::Connection(ref m) if m.contains("3000ms")));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn active_policy_reconnects_without_a_call() {
        let (connector, _sent) = MemoryConnector::new();
        let options = ConnectionOptions {
            policy: ReconnectPolicy::Active(ReconnectBackoff {
                initial_delay: Duration::from_millis(100),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (manager, _) = setup(connector.clone(), options);
        manager.ensure_connected().await.unwrap();

        let mut states = manager.subscribe();
        connector.hang_up();
        states
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();
        states
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
        assert_eq!(manager.info().generation, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_all_cancels_background_reconnect() {
        let (connector, _sent) = MemoryConnector::new();
        let options = ConnectionOptions {
            policy: ReconnectPolicy::Active(ReconnectBackoff::default()),
            ..Default::default()
        };
        let (manager, _) = setup(connector.clone(), options);
        manager.ensure_connected().await.unwrap();

        let mut states = manager.subscribe();
        connector.hang_up();
        states
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();

        manager.disconnect_all();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }
}
