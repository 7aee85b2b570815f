//! WebSocket channel carrying realtime pushes for one identity.
//!
//! The session context owns exactly one [`RealtimeChannel`] per logged-in
//! user. On connect the channel authenticates with the bearer token as a
//! handshake query parameter, emits `join-room` so identity-addressed
//! pushes arrive, and spawns a reader task that fans incoming events out
//! to every subscriber. Connection loss is handled inside the task:
//! exponential back-off with jitter, re-auth and re-`join-room` on every
//! successful reconnect, and a parked (permanently disconnected) state
//! once retries are exhausted. Missed events are not replayed; consumers
//! that need gap-free state reconcile through REST pulls.

use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use fixly_core::AppConfig;

use crate::error::RealtimeError;
use crate::events::{ClientEvent, ServerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Fan-out buffer per subscriber; a lagging subscriber loses the oldest
/// events, which pull reconciliation covers.
const EVENT_BUFFER: usize = 100;
const OUTBOUND_BUFFER: usize = 32;
const MAX_DELAY_MS: u64 = 60_000;

/// Reconnect schedule: `base_ms` doubles per attempt with ±25% jitter,
/// capped at one minute. After `max_retries` failed attempts the channel
/// parks as disconnected.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_ms: u64,
}

impl From<&AppConfig> for ReconnectPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_retries: config.reconnect_max_retries,
            base_ms: config.reconnect_base_ms,
        }
    }
}

/// Handle to the realtime connection.
///
/// Dropping the handle stops the reader task and closes the socket;
/// [`RealtimeChannel::disconnect`] does the same but waits for the task
/// to finish.
#[derive(Debug)]
pub struct RealtimeChannel {
    events: broadcast::Sender<ServerEvent>,
    connected: watch::Receiver<bool>,
    outbound: mpsc::Sender<ClientEvent>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RealtimeChannel {
    /// Connects to the configured realtime endpoint and joins `user_id`'s
    /// room.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Endpoint`] if the configured URL does not
    /// parse, or [`RealtimeError::Socket`] if the first connection attempt
    /// fails. Later connection losses are retried internally instead.
    pub async fn connect(
        config: &AppConfig,
        user_id: &str,
        token: &str,
    ) -> Result<Self, RealtimeError> {
        Self::connect_with(&config.realtime_url, user_id, token, config.into()).await
    }

    /// Connects to an explicit endpoint (for tests against a local server).
    ///
    /// # Errors
    ///
    /// Same as [`RealtimeChannel::connect`].
    pub async fn connect_with(
        realtime_url: &str,
        user_id: &str,
        token: &str,
        policy: ReconnectPolicy,
    ) -> Result<Self, RealtimeError> {
        let url = handshake_url(realtime_url, token)?;
        let stream = open_and_join(&url, user_id).await?;

        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (connected_tx, connected_rx) = watch::channel(true);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            stream,
            url,
            user_id.to_string(),
            policy,
            events.clone(),
            connected_tx,
            outbound_rx,
            stop_rx,
        ));

        Ok(Self {
            events,
            connected: connected_rx,
            outbound: outbound_tx,
            stop: stop_tx,
            task,
        })
    }

    /// Queues an event for the server.
    ///
    /// Frames queued while the task is between reconnect attempts are sent
    /// once the connection is back.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Closed`] if the channel has been
    /// disconnected or has given up reconnecting.
    pub async fn emit(&self, event: ClientEvent) -> Result<(), RealtimeError> {
        self.outbound
            .send(event)
            .await
            .map_err(|_| RealtimeError::Closed)
    }

    /// A new listener for server pushes. Dropping the receiver detaches it;
    /// the channel itself is unaffected.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Watch the connection flag, which flips around reconnect attempts.
    #[must_use]
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Closes the connection and waits for the reader task to stop.
    pub async fn disconnect(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

fn handshake_url(realtime_url: &str, token: &str) -> Result<Url, RealtimeError> {
    let mut url = Url::parse(realtime_url).map_err(|e| RealtimeError::Endpoint {
        url: realtime_url.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// Opens the socket and announces the identity before anything else is
/// sent, so the server can route pushes from the first moment.
async fn open_and_join(url: &Url, user_id: &str) -> Result<WsStream, RealtimeError> {
    let (mut stream, _) = connect_async(url.as_str()).await?;
    let join = ClientEvent::JoinRoom {
        user_id: user_id.to_string(),
    };
    stream.send(Message::Text(serde_json::to_string(&join)?)).await?;
    Ok(stream)
}

enum PumpEnd {
    Shutdown,
    ConnectionLost,
}

#[allow(clippy::too_many_arguments)]
async fn run(
    stream: WsStream,
    url: Url,
    user_id: String,
    policy: ReconnectPolicy,
    events: broadcast::Sender<ServerEvent>,
    connected: watch::Sender<bool>,
    mut outbound: mpsc::Receiver<ClientEvent>,
    mut stop: watch::Receiver<bool>,
) {
    let (mut sink, mut source) = stream.split();
    loop {
        match pump(&mut sink, &mut source, &events, &mut outbound, &mut stop).await {
            PumpEnd::Shutdown => {
                let _ = sink.close().await;
                let _ = connected.send(false);
                return;
            }
            PumpEnd::ConnectionLost => {
                let _ = connected.send(false);
                match reconnect(&url, &user_id, policy, &mut stop).await {
                    Some(stream) => {
                        (sink, source) = stream.split();
                        let _ = connected.send(true);
                        tracing::info!("realtime connection restored");
                    }
                    None => {
                        tracing::warn!(
                            "giving up on realtime reconnection; live updates are off"
                        );
                        return;
                    }
                }
            }
        }
    }
}

/// Drives one live connection until it drops or the channel is told to
/// stop.
async fn pump(
    sink: &mut WsSink,
    source: &mut WsSource,
    events: &broadcast::Sender<ServerEvent>,
    outbound: &mut mpsc::Receiver<ClientEvent>,
    stop: &mut watch::Receiver<bool>,
) -> PumpEnd {
    loop {
        tokio::select! {
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => dispatch(&text, events),
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "server closed the realtime connection");
                    return PumpEnd::ConnectionLost;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    tracing::warn!(%error, "realtime read failed");
                    return PumpEnd::ConnectionLost;
                }
                None => return PumpEnd::ConnectionLost,
            },
            command = outbound.recv() => match command {
                Some(event) => {
                    if let Err(error) = send_frame(sink, &event).await {
                        tracing::warn!(%error, "realtime send failed, dropping frame");
                        return PumpEnd::ConnectionLost;
                    }
                }
                // Every channel handle is gone; stop quietly.
                None => return PumpEnd::Shutdown,
            },
            _ = stop.changed() => return PumpEnd::Shutdown,
        }
    }
}

fn dispatch(text: &str, events: &broadcast::Sender<ServerEvent>) {
    match serde_json::from_str::<ServerEvent>(text) {
        // No subscribers is fine; the event just evaporates.
        Ok(event) => {
            let _ = events.send(event);
        }
        Err(error) => tracing::debug!(%error, frame = text, "ignoring unrecognized frame"),
    }
}

async fn send_frame(sink: &mut WsSink, event: &ClientEvent) -> Result<(), RealtimeError> {
    let frame = serde_json::to_string(event)?;
    sink.send(Message::Text(frame)).await?;
    Ok(())
}

/// Retries the connection on the policy's schedule. Returns `None` when
/// retries are exhausted or a shutdown arrives mid-wait.
async fn reconnect(
    url: &Url,
    user_id: &str,
    policy: ReconnectPolicy,
    stop: &mut watch::Receiver<bool>,
) -> Option<WsStream> {
    let mut attempt = 0u32;
    loop {
        if attempt >= policy.max_retries {
            return None;
        }
        attempt += 1;
        let delay_ms = backoff_delay_ms(attempt, policy.base_ms);
        tracing::warn!(
            attempt,
            max_retries = policy.max_retries,
            delay_ms,
            "realtime connection lost, retrying after back-off"
        );
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
            _ = stop.changed() => return None,
        }
        match open_and_join(url, user_id).await {
            Ok(stream) => return Some(stream),
            Err(error) => tracing::warn!(attempt, %error, "reconnect attempt failed"),
        }
    }
}

/// Delay before reconnect attempt `attempt` (1-based): exponential in the
/// attempt number, ±25% jitter, capped.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn backoff_delay_ms(attempt: u32, base_ms: u64) -> u64 {
    let computed = base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}
