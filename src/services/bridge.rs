use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{RealtimeError, Result};
use crate::services::event_bus::EventBus;
use crate::services::sse::{EventDecoder, SseDecoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Connecting,
    Streaming,
    Closed,
}

/// Rebroadcasts one server-sent-event stream onto an [`EventBus`].
///
/// Lifecycle is `Idle -> Connecting -> Streaming -> Closed`. A closed bridge
/// never reopens and never publishes again; the bridge does not reconnect on
/// its own.
pub struct EventBridge {
    id: Uuid,
    resource: String,
    bus: EventBus,
    decoder: EventDecoder,
    state: Mutex<BridgeState>,
    shutdown: watch::Sender<bool>,
}

impl EventBridge {
    pub fn new(resource: impl Into<String>, bus: EventBus) -> Result<Self> {
        let (shutdown, _) = watch::channel(false);
        Ok(EventBridge {
            id: Uuid::new_v4(),
            resource: resource.into(),
            bus,
            decoder: EventDecoder::new()?,
            state: Mutex::new(BridgeState::Idle),
            shutdown,
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn state(&self) -> BridgeState {
        *self.lock_state()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == BridgeState::Closed
    }

    fn lock_state(&self) -> MutexGuard<'_, BridgeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn transition(&self, allowed_from: &[BridgeState], to: BridgeState) -> Result<()> {
        let mut state = self.lock_state();
        if *state == BridgeState::Closed {
            return Err(RealtimeError::Closed);
        }
        if !allowed_from.contains(&*state) {
            return Err(RealtimeError::Transport(format!(
                "invalid bridge transition {:?} -> {:?}",
                *state, to
            )));
        }
        let from = *state;
        tracing::debug!(bridge_id = %self.id, resource = %self.resource, ?from, ?to, "bridge state");
        *state = to;
        Ok(())
    }

    /// Moves to `Closed`. Returns `true` only for the call that actually
    /// closed the bridge.
    pub fn close(&self) -> bool {
        {
            let mut state = self.lock_state();
            if *state == BridgeState::Closed {
                return false;
            }
            *state = BridgeState::Closed;
        }
        self.shutdown.send_replace(true);
        tracing::info!(bridge_id = %self.id, resource = %self.resource, "bridge closed");
        true
    }

    /// Opens the stream and pumps it until teardown or transport failure.
    /// Returns the number of events published.
    pub async fn connect(&self, client: &reqwest::Client, url: &str, token: Option<&str>) -> Result<usize> {
        self.transition(&[BridgeState::Idle], BridgeState::Connecting)?;
        let mut shutdown = self.shutdown.subscribe();

        let mut request = client.get(url).header(ACCEPT, "text/event-stream");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = tokio::select! {
            _ = shutdown.wait_for(|closed| *closed) => return Err(RealtimeError::Closed),
            response = request.send() => response,
        };
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(bridge_id = %self.id, resource = %self.resource, "stream connect failed: {err}");
                self.close();
                return Err(err.into());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(bridge_id = %self.id, resource = %self.resource, %status, "stream rejected");
            self.close();
            return Err(RealtimeError::Transport(format!("stream endpoint returned {}", status)));
        }

        tracing::info!(bridge_id = %self.id, resource = %self.resource, "stream connected");
        tokio::select! {
            _ = shutdown.wait_for(|closed| *closed) => Err(RealtimeError::Closed),
            published = self.pump(response.bytes_stream()) => published,
        }
    }

    /// Decodes `stream` and publishes each event in arrival order. Malformed
    /// messages are logged and skipped; a transport error or the end of the
    /// stream closes the bridge.
    pub async fn pump<S, B, E>(&self, stream: S) -> Result<usize>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        // Direct callers start from Idle; `connect` has already moved to Connecting.
        self.transition(&[BridgeState::Idle, BridgeState::Connecting], BridgeState::Streaming)?;

        futures::pin_mut!(stream);
        let mut lines = SseDecoder::new();
        let mut published = 0;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(bridge_id = %self.id, resource = %self.resource, "stream dropped: {err}");
                    self.close();
                    return Err(RealtimeError::Transport(err.to_string()));
                }
            };

            for frame in lines.push(bytes.as_ref()) {
                if self.is_closed() {
                    return Ok(published);
                }
                match self.decoder.decode(&frame) {
                    Ok(Some(event)) => {
                        tracing::debug!(
                            bridge_id = %self.id,
                            event = %event.event,
                            channel = %event.channel,
                            "event received"
                        );
                        self.bus.publish(&event);
                        published += 1;
                    }
                    Ok(None) => tracing::trace!(bridge_id = %self.id, "heartbeat"),
                    Err(err) => {
                        tracing::warn!(bridge_id = %self.id, resource = %self.resource, "discarding message: {err}");
                    }
                }
            }
        }

        tracing::info!(bridge_id = %self.id, resource = %self.resource, published, "stream ended");
        self.close();
        Ok(published)
    }
}

/// Owns a spawned bridge task. Closing (explicitly or on drop) tears the
/// connection down exactly once.
pub struct BridgeHandle {
    bridge: Arc<EventBridge>,
}

impl BridgeHandle {
    /// Must be called from within a tokio runtime.
    pub fn spawn(bridge: Arc<EventBridge>, client: reqwest::Client, url: String, token: Option<String>) -> Self {
        let task_bridge = bridge.clone();
        tokio::spawn(async move {
            match task_bridge.connect(&client, &url, token.as_deref()).await {
                Ok(published) => tracing::debug!(resource = %task_bridge.resource(), published, "bridge task finished"),
                Err(RealtimeError::Closed) => {}
                Err(err) => tracing::warn!(resource = %task_bridge.resource(), "bridge task failed: {err}"),
            }
        });
        BridgeHandle { bridge }
    }

    pub fn bridge(&self) -> &Arc<EventBridge> {
        &self.bridge
    }

    pub fn state(&self) -> BridgeState {
        self.bridge.state()
    }

    pub fn is_live(&self) -> bool {
        !self.bridge.is_closed()
    }

    pub fn close(&self) -> bool {
        self.bridge.close()
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.bridge.close();
    }
}

/// At most one live bridge per resource key (e.g. `company:<id>`).
pub struct BridgeRegistry {
    bus: EventBus,
    client: reqwest::Client,
    token: Option<String>,
    bridges: Mutex<HashMap<String, BridgeHandle>>,
}

impl BridgeRegistry {
    pub fn new(bus: EventBus, client: reqwest::Client, token: Option<String>) -> Self {
        BridgeRegistry {
            bus,
            client,
            token,
            bridges: Mutex::new(HashMap::new()),
        }
    }

    fn lock_bridges(&self) -> MutexGuard<'_, HashMap<String, BridgeHandle>> {
        match self.bridges.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns the live bridge for `resource`, opening a fresh one when there
    /// is none or the previous one has closed.
    pub fn ensure(&self, resource: &str, url: &str) -> Result<Arc<EventBridge>> {
        let mut bridges = self.lock_bridges();
        if let Some(existing) = bridges.get(resource) {
            if existing.is_live() {
                return Ok(existing.bridge().clone());
            }
        }

        let bridge = Arc::new(EventBridge::new(resource, self.bus.clone())?);
        let handle = BridgeHandle::spawn(bridge.clone(), self.client.clone(), url.to_string(), self.token.clone());
        bridges.insert(resource.to_string(), handle);
        tracing::info!(resource, "bridge opened");
        Ok(bridge)
    }

    pub fn release(&self, resource: &str) -> bool {
        match self.lock_bridges().remove(resource) {
            Some(handle) => handle.close(),
            None => false,
        }
    }

    pub fn close_all(&self) {
        let drained: Vec<BridgeHandle> = self.lock_bridges().drain().map(|(_, handle)| handle).collect();
        for handle in drained {
            handle.close();
        }
    }

    pub fn live_count(&self) -> usize {
        self.lock_bridges().values().filter(|handle| handle.is_live()).count()
    }
}
