use thiserror::Error;

use fixly_api::ApiError;
use fixly_realtime::RealtimeError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not logged in; run `fixly login` first")]
    LoggedOut,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Realtime(#[from] RealtimeError),
    #[error("cannot {action} the token cache at {path}: {source}")]
    Cache {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}
