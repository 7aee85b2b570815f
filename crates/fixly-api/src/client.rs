//! HTTP client for the Fixly backend REST API.
//!
//! Wraps `reqwest` with bearer-token management, typed response
//! deserialization, and the cross-cutting response handling every call
//! shares: a `401` clears the shared [`TokenStore`] and raises
//! [`Notice::SessionExpired`], any other non-2xx raises one
//! [`Notice::Error`] with the server's message, and a `success: false`
//! envelope on a 2xx surfaces as [`ApiError::Api`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use fixly_core::{
    AppConfig, Booking, BookingRequest, BookingStatus, ExpertProfile, GeoPoint, ServiceCategory,
};

use crate::error::ApiError;
use crate::notify::{Notice, NotificationSink};
use crate::token::TokenStore;
use crate::types::{
    ApiResponse, BookingResponse, BookingsPage, CancelRequest, CommentRequest, CommentResponse,
    CommunityPost, EmergencyAlertRequest, ExpertResponse, ExpertsResponse, Identity, LoginRequest,
    LoginResponse, MessageRequest, PaymentIntent, PaymentIntentRequest, PostComment, PostRequest,
    PostResponse, PostsResponse, ProfileResponse, StatusUpdateRequest, TrackingHistory,
    TrackingResponse,
};

const NETWORK_ERROR_NOTICE: &str = "Network error. Please check your connection.";
const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

/// Client for the Fixly REST API.
///
/// Holds the HTTP client, the normalized base URL, the shared token store,
/// and the notification sink. Use [`ApiClient::new`] with the loaded
/// [`AppConfig`] for production or [`ApiClient::with_base_url`] to point at
/// a mock server in tests. Cloning is cheap; clones share the token store.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    tokens: TokenStore,
    notifier: Arc<dyn NotificationSink>,
}

impl ApiClient {
    /// Creates a client pointed at the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ApiError::Api`] if the configured base
    /// URL does not parse.
    pub fn new(
        config: &AppConfig,
        tokens: TokenStore,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, ApiError> {
        Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            tokens,
            notifier,
        )
    }

    /// Creates a client with an explicit base URL (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ApiError::Api`] if `base_url` is not a
    /// valid URL.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        tokens: TokenStore,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("fixly/0.1 (terminal client)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join appends endpoint paths instead of replacing the last
        // path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ApiError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            tokens,
            notifier,
        })
    }

    /// The token store this client attaches bearer tokens from.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Authenticates with email and password.
    ///
    /// Returns the issued token and the caller's identity. The token is
    /// deliberately not written to the store here; the session layer owns
    /// the credential lifecycle.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the backend rejects the credentials.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.build_url("auth/login", &[])?;
        let payload = LoginRequest { email, password };
        let body = self.execute(self.client.post(url).json(&payload)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<LoginResponse> = Self::decode("login", body)?;
        Ok(envelope.data)
    }

    /// Fetches the identity behind the stored token.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unauthorized`] when the token has been revoked; the
    ///   store is cleared before this returns.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn profile(&self) -> Result<Identity, ApiError> {
        let url = self.build_url("auth/profile", &[])?;
        let body = self.execute(self.client.get(url)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<ProfileResponse> = Self::decode("profile", body)?;
        Ok(envelope.data.user)
    }

    /// Submits a completed booking request.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Api`] if the backend accepted the request but flagged
    ///   `success: false`.
    /// - [`ApiError::Status`] on a validation rejection.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ApiError> {
        let url = self.build_url("bookings", &[])?;
        let body = self.execute(self.client.post(url).json(request)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<BookingResponse> = Self::decode("create_booking", body)?;
        Ok(envelope.data.booking)
    }

    /// Lists the caller's bookings, newest first, with pagination metadata.
    ///
    /// When `status` is `None` all bookings are returned.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unauthorized`] when the stored token is rejected.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn my_bookings(
        &self,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> Result<BookingsPage, ApiError> {
        let page = page.to_string();
        let limit = limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![("page", &page), ("limit", &limit)];
        if let Some(status) = status {
            params.push(("status", status.as_str()));
        }

        let url = self.build_url("bookings/my-bookings", &params)?;
        let body = self.execute(self.client.get(url)).await?;
        Self::check_envelope(&body)?;

        Self::decode::<ApiResponse<BookingsPage>>("my_bookings", body).map(|e| e.data)
    }

    /// Fetches one booking by id, with the expert populated.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the booking does not exist or belongs to
    ///   someone else.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn get_booking(&self, id: &str) -> Result<Booking, ApiError> {
        let url = self.build_url(&format!("bookings/{id}"), &[])?;
        let body = self.execute(self.client.get(url)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<BookingResponse> =
            Self::decode(&format!("get_booking({id})"), body)?;
        Ok(envelope.data.booking)
    }

    /// Moves a booking to a new status.
    ///
    /// The backend enforces which transitions each party may make; this
    /// client only sends the request.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the transition is rejected.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn update_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Booking, ApiError> {
        let url = self.build_url(&format!("bookings/{id}/status"), &[])?;
        let payload = StatusUpdateRequest { status };
        let body = self.execute(self.client.put(url).json(&payload)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<BookingResponse> =
            Self::decode(&format!("update_status({id})"), body)?;
        Ok(envelope.data.booking)
    }

    /// Appends a text chat message to a booking.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the booking does not accept messages.
    /// - [`ApiError::Http`] on network failure.
    pub async fn send_message(&self, id: &str, message: &str) -> Result<(), ApiError> {
        let url = self.build_url(&format!("bookings/{id}/messages"), &[])?;
        let payload = MessageRequest::text(message);
        let body = self.execute(self.client.post(url).json(&payload)).await?;
        Self::check_envelope(&body)
    }

    /// Cancels a booking, with an optional reason for the expert.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the booking can no longer be cancelled.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn cancel_booking(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Booking, ApiError> {
        let url = self.build_url(&format!("bookings/{id}/cancel"), &[])?;
        let payload = CancelRequest { reason };
        let body = self.execute(self.client.put(url).json(&payload)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<BookingResponse> =
            Self::decode(&format!("cancel_booking({id})"), body)?;
        Ok(envelope.data.booking)
    }

    /// Searches experts offering a category, nearest first when a location
    /// is given.
    ///
    /// The location is sent as a `lat,lng` pair in a single query
    /// parameter, matching what the backend's geo filter parses.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn experts(
        &self,
        category: ServiceCategory,
        location: Option<GeoPoint>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ExpertProfile>, ApiError> {
        let page = page.to_string();
        let limit = limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![("category", category.slug())];
        // Bind the formatted pair outside the if block so the borrow lives
        // long enough.
        let pair;
        if let Some(point) = location {
            pair = format!("{},{}", point.lat, point.lng);
            params.push(("location", &pair));
        }
        params.push(("page", &page));
        params.push(("limit", &limit));

        let url = self.build_url("experts", &params)?;
        let body = self.execute(self.client.get(url)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<ExpertsResponse> = Self::decode("experts", body)?;
        Ok(envelope.data.experts)
    }

    /// Fetches one expert's full profile.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the expert does not exist.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn get_expert(&self, id: &str) -> Result<ExpertProfile, ApiError> {
        let url = self.build_url(&format!("experts/{id}"), &[])?;
        let body = self.execute(self.client.get(url)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<ExpertResponse> =
            Self::decode(&format!("get_expert({id})"), body)?;
        Ok(envelope.data.expert)
    }

    /// Opens a payment intent for a booking and returns its client secret.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the booking is not payable.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn create_payment_intent(
        &self,
        booking_id: &str,
        amount: f64,
    ) -> Result<PaymentIntent, ApiError> {
        let url = self.build_url("payments/create-payment-intent", &[])?;
        let payload = PaymentIntentRequest { amount, booking_id };
        let body = self.execute(self.client.post(url).json(&payload)).await?;
        Self::check_envelope(&body)?;

        Self::decode::<ApiResponse<PaymentIntent>>("create_payment_intent", body).map(|e| e.data)
    }

    /// Fetches the recorded location trail and current ETA for a booking.
    ///
    /// Used by the tracking session both for its initial state and for
    /// reconciliation pulls when the push channel goes quiet.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when tracking has not started.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn tracking_history(&self, booking_id: &str) -> Result<TrackingHistory, ApiError> {
        let url = self.build_url(&format!("tracking/history/{booking_id}"), &[])?;
        let body = self.execute(self.client.get(url)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<TrackingResponse> =
            Self::decode(&format!("tracking_history({booking_id})"), body)?;
        Ok(envelope.data.tracking)
    }

    /// Raises an emergency alert with the backend.
    ///
    /// The realtime broadcast to nearby experts happens server-side; this
    /// call only has to land.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the backend rejects the alert.
    /// - [`ApiError::Http`] on network failure.
    pub async fn send_emergency_alert(
        &self,
        alert: &EmergencyAlertRequest<'_>,
    ) -> Result<(), ApiError> {
        let url = self.build_url("emergency/alert", &[])?;
        let body = self.execute(self.client.post(url).json(alert)).await?;
        Self::check_envelope(&body)
    }

    /// Lists community posts, newest first.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn posts(&self) -> Result<Vec<CommunityPost>, ApiError> {
        let url = self.build_url("community/posts", &[])?;
        let body = self.execute(self.client.get(url)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<PostsResponse> = Self::decode("posts", body)?;
        Ok(envelope.data.posts)
    }

    /// Publishes a community post.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the post is rejected.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn create_post(&self, title: &str, content: &str) -> Result<CommunityPost, ApiError> {
        let url = self.build_url("community/posts", &[])?;
        let payload = PostRequest { title, content };
        let body = self.execute(self.client.post(url).json(&payload)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<PostResponse> = Self::decode("create_post", body)?;
        Ok(envelope.data.post)
    }

    /// Adds a comment to a community post.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] when the post does not exist.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn add_comment(&self, post_id: &str, content: &str) -> Result<PostComment, ApiError> {
        let url = self.build_url(&format!("community/posts/{post_id}/comments"), &[])?;
        let payload = CommentRequest { content };
        let body = self.execute(self.client.post(url).json(&payload)).await?;
        Self::check_envelope(&body)?;

        let envelope: ApiResponse<CommentResponse> =
            Self::decode(&format!("add_comment({post_id})"), body)?;
        Ok(envelope.data.comment)
    }

    /// Builds the full request URL with properly percent-encoded query
    /// parameters.
    ///
    /// Joins `path` onto the stored base URL and appends `query` via
    /// [`Url::query_pairs_mut`], ensuring all values are safely encoded.
    fn build_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Api(format!("invalid request path '{path}': {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends one request with the shared response handling applied.
    ///
    /// Attaches the bearer token when one is stored, then maps the outcome:
    /// network failure and `401` each raise their notice (the latter after
    /// clearing the token store), any other non-2xx raises one
    /// [`Notice::Error`] with the server's message, and a 2xx body is
    /// parsed as JSON. The `success` envelope flag is left to the caller.
    async fn execute(&self, request: RequestBuilder) -> Result<serde_json::Value, ApiError> {
        let request = match self.tokens.get().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let request = request.build()?;
        let url = request.url().clone();

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(source) => {
                tracing::warn!(%url, error = %source, "request failed to complete");
                self.notifier
                    .notify(Notice::Error(NETWORK_ERROR_NOTICE.to_string()));
                return Err(ApiError::Http(source));
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.clear().await;
            tracing::warn!(%url, "token rejected, clearing stored credential");
            self.notifier.notify(Notice::SessionExpired);
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await?;
        if !status.is_success() {
            let message = Self::failure_message(&body);
            tracing::debug!(%url, %status, server_message = %message, "request rejected");
            self.notifier.notify(Notice::Error(message.clone()));
            return Err(ApiError::Status { status, message });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Checks the `"success"` envelope flag and returns an error if the
    /// backend flagged failure on a 2xx response.
    fn check_envelope(body: &serde_json::Value) -> Result<(), ApiError> {
        if body.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
            let msg = body
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(FALLBACK_ERROR_MESSAGE)
                .to_string();
            return Err(ApiError::Api(msg));
        }
        Ok(())
    }

    /// Extracts the server's `message` from an error body, falling back to
    /// a generic line when the body is not JSON or carries none.
    fn failure_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(ToOwned::to_owned)
            })
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
    }

    fn decode<T: DeserializeOwned>(context: &str, body: serde_json::Value) -> Result<T, ApiError> {
        serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::SilentSink;

    fn test_client(base_url: &str) -> ApiClient {
        ApiClient::with_base_url(base_url, 30, TokenStore::new(), Arc::new(SilentSink))
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_joins_paths_onto_the_base() {
        let client = test_client("http://localhost:5000/api");
        let url = client
            .build_url("bookings/abc123", &[])
            .expect("join should succeed");
        assert_eq!(url.as_str(), "http://localhost:5000/api/bookings/abc123");
    }

    #[test]
    fn build_url_strips_trailing_slash() {
        let client = test_client("http://localhost:5000/api/");
        let url = client
            .build_url("experts", &[("category", "plumber"), ("page", "1")])
            .expect("join should succeed");
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/experts?category=plumber&page=1"
        );
    }

    #[test]
    fn build_url_encodes_special_characters() {
        let client = test_client("http://localhost:5000/api");
        let url = client
            .build_url("experts", &[("location", "12.97,77.59")])
            .expect("join should succeed");
        assert!(
            url.as_str().contains("location=12.97%2C77.59"),
            "location pair should be percent-encoded: {url}"
        );
    }

    #[test]
    fn check_envelope_accepts_success_and_rejects_failure() {
        let ok = serde_json::json!({ "success": true, "bookings": [] });
        assert!(ApiClient::check_envelope(&ok).is_ok());

        let failed = serde_json::json!({ "success": false, "message": "Booking not found" });
        match ApiClient::check_envelope(&failed) {
            Err(ApiError::Api(msg)) => assert_eq!(msg, "Booking not found"),
            other => panic!("expected ApiError::Api, got {other:?}"),
        }
    }

    #[test]
    fn failure_message_prefers_the_server_message() {
        assert_eq!(
            ApiClient::failure_message(r#"{"success":false,"message":"Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(ApiClient::failure_message("<html>502</html>"), "An error occurred");
    }
}
