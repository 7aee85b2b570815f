use std::sync::Arc;

use tokio::sync::RwLock;

/// Shared holder for the bearer token.
///
/// One store is shared by the API client, the realtime connector, and the
/// session manager, so clearing it on a 401 takes effect everywhere at
/// once. Cloning the store clones the handle, not the token.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with a token, used when resuming a cached session.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(token.into()))),
        }
    }

    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    pub async fn set(&self, token: impl Into<String>) {
        *self.inner.write().await = Some(token.into());
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_none()
    }
}
