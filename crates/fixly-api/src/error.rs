use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The stored credential was rejected. By the time this surfaces the
    /// token store has already been cleared.
    #[error("session expired")]
    Unauthorized,
    /// Non-2xx response other than 401, with the server's message when it
    /// sent one.
    #[error("request failed with {status}: {message}")]
    Status { status: StatusCode, message: String },
    /// The backend answered 2xx but flagged `success: false`.
    #[error("api error: {0}")]
    Api(String),
    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
