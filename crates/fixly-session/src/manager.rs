//! The one owner of the authenticated session.
//!
//! [`SessionManager`] ties together the REST client, the shared
//! [`TokenStore`], the on-disk [`TokenCache`] and the realtime channel.
//! It is an explicit context object: composing code receives it by
//! injection and borrows the channel for subscriptions, so exactly one
//! realtime connection exists per logged-in identity.

use fixly_api::{ApiClient, ApiError, Identity, TokenStore};
use fixly_core::AppConfig;
use fixly_realtime::{RealtimeChannel, RealtimeError};

use crate::cache::TokenCache;
use crate::error::SessionError;

pub struct SessionManager {
    config: AppConfig,
    api: ApiClient,
    tokens: TokenStore,
    cache: TokenCache,
    identity: Option<Identity>,
    channel: Option<RealtimeChannel>,
}

impl SessionManager {
    /// Builds a logged-out manager around an injected API client. The
    /// client must share `tokens`, otherwise its requests will not pick
    /// up the bearer token this manager stores.
    #[must_use]
    pub fn new(config: &AppConfig, api: ApiClient, tokens: TokenStore) -> Self {
        let cache = TokenCache::new(config.token_path.clone());
        Self {
            config: config.clone(),
            api,
            tokens,
            cache,
            identity: None,
            channel: None,
        }
    }

    /// Authenticates against `/auth/login`, persists the bearer token in
    /// the shared store and the on-disk cache, records the identity and
    /// connects the realtime channel for it.
    ///
    /// A realtime connect failure does not fail the login: the REST
    /// session is valid without it, so the manager logs a warning and
    /// stays logged in with no channel. [`SessionManager::ensure_channel`]
    /// retries on demand.
    ///
    /// # Errors
    ///
    /// [`SessionError::Api`] when the credentials are rejected or the
    /// request fails, [`SessionError::Cache`] when the token cannot be
    /// written to disk. Either way the previous session, if any, is left
    /// untouched.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let response = self.api.login(email, password).await?;
        self.tokens.set(response.token.as_str()).await;
        self.cache.store(&response.token)?;
        self.identity = Some(response.user.clone());
        tracing::info!(user = %response.user.email, "logged in");

        if let Err(error) = self.connect_channel().await {
            tracing::warn!(%error, "realtime channel unavailable, continuing without live updates");
        }
        Ok(response.user)
    }

    /// Clears the token from the store and the cache, drops the identity
    /// and closes the realtime channel.
    ///
    /// # Errors
    ///
    /// [`SessionError::Cache`] when the cached token file cannot be
    /// removed; the in-memory session is already torn down by then.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(channel) = self.channel.take() {
            channel.disconnect().await;
        }
        self.tokens.clear().await;
        self.identity = None;
        self.cache.remove()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Restores the session cached by a previous run.
    ///
    /// Loads the cached token, validates it against `/auth/profile` and
    /// connects the realtime channel. A `401` means the token went stale
    /// while the process was down; the store is already cleared by the
    /// client's 401 handling, so this reduces to logged-out and removes
    /// the cache. Returns the identity when a session was restored.
    ///
    /// # Errors
    ///
    /// [`SessionError::Api`] for request failures other than a stale
    /// token (the cache is kept so a later resume can retry), and
    /// [`SessionError::Cache`] for token file trouble.
    pub async fn resume(&mut self) -> Result<Option<Identity>, SessionError> {
        let Some(token) = self.cache.load()? else {
            return Ok(None);
        };
        self.tokens.set(token).await;

        let identity = match self.api.profile().await {
            Ok(identity) => identity,
            Err(ApiError::Unauthorized) => {
                self.cache.remove()?;
                self.identity = None;
                tracing::info!("cached token is no longer valid");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        self.identity = Some(identity.clone());
        tracing::info!(user = %identity.email, "session resumed");

        if let Err(error) = self.connect_channel().await {
            tracing::warn!(%error, "realtime channel unavailable, continuing without live updates");
        }
        Ok(Some(identity))
    }

    /// Borrow the live channel, connecting (or replacing a dead one)
    /// first if needed.
    ///
    /// # Errors
    ///
    /// [`SessionError::LoggedOut`] when there is no identity or token to
    /// connect with, [`SessionError::Realtime`] when the endpoint cannot
    /// be reached.
    pub async fn ensure_channel(&mut self) -> Result<&RealtimeChannel, SessionError> {
        let healthy = self
            .channel
            .as_ref()
            .is_some_and(RealtimeChannel::is_connected);
        if !healthy {
            self.connect_channel().await?;
        }
        match &self.channel {
            Some(channel) => Ok(channel),
            None => Err(RealtimeError::Closed.into()),
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn channel(&self) -> Option<&RealtimeChannel> {
        self.channel.as_ref()
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Opens a fresh channel for the current identity, replacing any
    /// previous one so a single identity never holds two connections.
    async fn connect_channel(&mut self) -> Result<(), SessionError> {
        let identity = self.identity.as_ref().ok_or(SessionError::LoggedOut)?;
        let token = self.tokens.get().await.ok_or(SessionError::LoggedOut)?;
        let user_id = identity.id.clone();

        if let Some(previous) = self.channel.take() {
            previous.disconnect().await;
        }
        let channel = RealtimeChannel::connect(&self.config, &user_id, &token).await?;
        self.channel = Some(channel);
        Ok(())
    }
}
