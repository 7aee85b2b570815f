use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The configured endpoint is not a parseable URL.
    #[error("invalid realtime endpoint '{url}': {reason}")]
    Endpoint { url: String, reason: String },
    #[error("websocket error: {0}")]
    Socket(#[from] tungstenite::Error),
    #[error("failed to encode outbound frame: {0}")]
    Encode(#[from] serde_json::Error),
    /// The background task has stopped, either by an explicit disconnect
    /// or because reconnection retries were exhausted.
    #[error("realtime channel is closed")]
    Closed,
}
