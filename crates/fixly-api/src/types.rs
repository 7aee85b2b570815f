//! Request and response bodies for the marketplace REST API.
//!
//! The backend wraps every response in a `{"success": true, ...}` envelope;
//! [`ApiResponse`] captures that pattern generically and the per-endpoint
//! wrappers name the single payload field each endpoint nests its data in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fixly_core::{Booking, BookingStatus, EmergencyType, ExpertProfile, GeoPoint, TrackingSample};

/// Top-level envelope for all API responses.
///
/// `success` is `false` when the backend rejected the request at the
/// application level; the remaining fields are flattened from the body.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

/// Payload for endpoints that return nothing beyond the envelope.
#[derive(Debug, Deserialize)]
pub struct Empty {}

// ---------------------------------------------------------------------------
// auth
// ---------------------------------------------------------------------------

/// The authenticated account, as `/auth/login` and `/auth/profile` report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `/auth/login` payload: the bearer token plus the account it belongs to.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Identity,
}

#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    pub user: Identity,
}

// ---------------------------------------------------------------------------
// bookings
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BookingResponse {
    pub booking: Booking,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
}

/// One page of `/bookings/my-bookings`.
#[derive(Debug, Deserialize)]
pub struct BookingsPage {
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateRequest {
    pub status: BookingStatus,
}

/// Body of `POST /bookings/:id/messages`. Only text messages exist on this
/// client; attachments are a backend feature the apps never shipped.
#[derive(Debug, Serialize)]
pub struct MessageRequest<'a> {
    pub message: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}

impl<'a> MessageRequest<'a> {
    #[must_use]
    pub fn text(message: &'a str) -> Self {
        Self {
            message,
            kind: "text",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// experts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ExpertsResponse {
    pub experts: Vec<ExpertProfile>,
}

#[derive(Debug, Deserialize)]
pub struct ExpertResponse {
    pub expert: ExpertProfile,
}

// ---------------------------------------------------------------------------
// payments
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest<'a> {
    pub amount: f64,
    pub booking_id: &'a str,
}

/// Opaque handle the payment provider needs to complete the charge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
}

// ---------------------------------------------------------------------------
// tracking
// ---------------------------------------------------------------------------

/// `/tracking/history/:bookingId` payload: ordered samples plus the
/// backend's current arrival estimate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingHistory {
    #[serde(default)]
    pub history: Vec<TrackingSample>,
    pub estimated_arrival: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TrackingResponse {
    pub tracking: TrackingHistory,
}

// ---------------------------------------------------------------------------
// emergency
// ---------------------------------------------------------------------------

/// The alert endpoint predates the rest of the API and spells coordinates
/// out in full rather than using `lat`/`lng`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EmergencyLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoPoint> for EmergencyLocation {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.lat,
            longitude: point.lng,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAlertRequest<'a> {
    #[serde(rename = "type")]
    pub kind: EmergencyType,
    pub description: &'a str,
    pub location: EmergencyLocation,
    pub user_id: &'a str,
}

// ---------------------------------------------------------------------------
// community
// ---------------------------------------------------------------------------

/// Author stub embedded in posts and comments.
#[derive(Debug, Clone, Deserialize)]
pub struct PostAuthor {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostComment {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: PostAuthor,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: PostAuthor,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub comments: Vec<PostComment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PostsResponse {
    pub posts: Vec<CommunityPost>,
}

#[derive(Debug, Deserialize)]
pub struct PostResponse {
    pub post: CommunityPost,
}

#[derive(Debug, Deserialize)]
pub struct CommentResponse {
    pub comment: PostComment,
}

#[derive(Debug, Serialize)]
pub struct PostRequest<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CommentRequest<'a> {
    pub content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_flattens_payload_fields() {
        let json = r#"{
            "success": true,
            "token": "jwt-token",
            "user": { "_id": "u1", "name": "Asha", "email": "asha@example.com" }
        }"#;
        let envelope: ApiResponse<LoginResponse> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.token, "jwt-token");
        assert_eq!(envelope.data.user.id, "u1");
    }

    #[test]
    fn envelope_with_empty_payload() {
        let json = r#"{ "success": true, "message": "Alert sent" }"#;
        let envelope: ApiResponse<Empty> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
    }

    #[test]
    fn message_request_is_typed_text() {
        let body = serde_json::to_value(MessageRequest::text("On my way?")).unwrap();
        assert_eq!(body["message"], "On my way?");
        assert_eq!(body["type"], "text");
    }

    #[test]
    fn cancel_request_omits_absent_reason() {
        let body = serde_json::to_value(CancelRequest { reason: None }).unwrap();
        assert!(body.get("reason").is_none());
        let body = serde_json::to_value(CancelRequest {
            reason: Some("found local help"),
        })
        .unwrap();
        assert_eq!(body["reason"], "found local help");
    }

    #[test]
    fn emergency_alert_spells_out_coordinates() {
        let request = EmergencyAlertRequest {
            kind: EmergencyType::Sos,
            description: "URGENT SOS - Immediate assistance required!",
            location: GeoPoint {
                lat: 12.9716,
                lng: 77.5946,
            }
            .into(),
            user_id: "u1",
        };
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(body["type"], "sos");
        assert_eq!(body["location"]["latitude"], 12.9716);
        assert_eq!(body["location"]["longitude"], 77.5946);
        assert_eq!(body["userId"], "u1");
    }

    #[test]
    fn tracking_history_tolerates_missing_history() {
        let response: TrackingResponse =
            serde_json::from_str(r#"{ "tracking": { "estimatedArrival": null } }"#).unwrap();
        assert!(response.tracking.history.is_empty());
        assert!(response.tracking.estimated_arrival.is_none());
    }

    #[test]
    fn bookings_page_defaults_pagination() {
        let page: BookingsPage = serde_json::from_str(r#"{ "bookings": [] }"#).unwrap();
        assert!(page.bookings.is_empty());
        assert_eq!(page.pagination.pages, 0);
    }

    #[test]
    fn community_post_parses_nested_comments() {
        let json = r#"{
            "_id": "p1",
            "user": { "name": "Asha" },
            "title": "Reliable electrician?",
            "content": "Looking for someone near Indiranagar.",
            "comments": [{
                "_id": "c1",
                "user": { "name": "Ravi" },
                "content": "Try the directory filter.",
                "createdAt": "2025-03-01T10:00:00Z"
            }],
            "createdAt": "2025-03-01T09:00:00Z"
        }"#;
        let post: CommunityPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].user.name, "Ravi");
    }
}
