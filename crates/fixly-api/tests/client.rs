//! Integration tests for `ApiClient` using wiremock HTTP mocks.
//!
//! Beyond endpoint shapes, these pin down the shared response handling:
//! bearer attachment, the 401 session-expiry side effects, and which
//! failures raise user-visible notices.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fixly_api::{ApiClient, ApiError, Notice, NotificationSink, TokenStore};
use fixly_core::{
    BookingRequest, BookingStatus, GeoPoint, Pricing, Schedule, ServiceCategory, ServiceDetails,
    ServiceLocation, Urgency,
};

/// Sink that records every notice so tests can assert on them.
#[derive(Default)]
struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    fn recorded(&self) -> Vec<Notice> {
        self.notices.lock().expect("notice lock poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("notice lock poisoned").push(notice);
    }
}

fn test_client(base_url: &str, tokens: TokenStore) -> (ApiClient, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let client = ApiClient::with_base_url(base_url, 30, tokens, sink.clone())
        .expect("client construction should not fail");
    (client, sink)
}

fn booking_json(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "status": status,
        "service": {
            "category": "plumber",
            "description": "Leaking kitchen tap",
            "urgency": "high"
        },
        "location": {
            "address": "12 MG Road, Bengaluru",
            "coordinates": { "lat": 12.9716, "lng": 77.5946 }
        },
        "scheduling": {
            "preferredDate": "2025-03-14",
            "preferredTime": { "start": "09:00", "end": "11:00" }
        },
        "pricing": { "basePrice": 500.0, "materialsCost": 150.0, "discount": 0.0 }
    })
}

#[tokio::test]
async fn login_returns_the_token_without_storing_it() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "success": true,
        "token": "jwt-abc",
        "user": { "_id": "u1", "name": "Asha", "email": "asha@example.com" }
    });

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "asha@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let (client, _sink) = test_client(&server.uri(), TokenStore::new());
    let login = client
        .login("asha@example.com", "hunter2")
        .await
        .expect("login should succeed");

    assert_eq!(login.token, "jwt-abc");
    assert_eq!(login.user.name, "Asha");
    assert!(
        client.tokens().is_empty().await,
        "storing the credential is the session layer's job"
    );
}

#[tokio::test]
async fn stored_token_is_sent_as_a_bearer_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/my-bookings"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "bookings": [],
            "pagination": { "page": 1, "limit": 10, "total": 0, "pages": 0 }
        })))
        .mount(&server)
        .await;

    let (client, _sink) = test_client(&server.uri(), TokenStore::with_token("secret-token"));
    let page = client
        .my_bookings(None, 1, 10)
        .await
        .expect("listing should succeed");

    assert!(page.bookings.is_empty());
    assert_eq!(page.pagination.total, 0);
}

#[tokio::test]
async fn my_bookings_sends_the_status_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/my-bookings"))
        .and(query_param("status", "pending"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "bookings": [booking_json("b1", "pending")],
            "pagination": { "page": 2, "limit": 5, "total": 6, "pages": 2 }
        })))
        .mount(&server)
        .await;

    let (client, _sink) = test_client(&server.uri(), TokenStore::new());
    let page = client
        .my_bookings(Some(BookingStatus::Pending), 2, 5)
        .await
        .expect("listing should succeed");

    assert_eq!(page.bookings.len(), 1);
    assert_eq!(page.bookings[0].id, "b1");
    assert_eq!(page.pagination.pages, 2);
}

#[tokio::test]
async fn unauthorized_clears_the_token_and_raises_session_expired() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "success": false,
            "message": "Not authorized"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/community/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "posts": []
        })))
        .mount(&server)
        .await;

    let tokens = TokenStore::with_token("stale-token");
    let (client, sink) = test_client(&server.uri(), tokens.clone());

    let err = client.profile().await.expect_err("stale token must fail");
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(tokens.is_empty().await, "401 must clear the shared store");
    assert_eq!(sink.recorded(), vec![Notice::SessionExpired]);

    // The follow-up request must go out without a bearer header.
    client.posts().await.expect("anonymous listing should succeed");
    let requests = server
        .received_requests()
        .await
        .expect("requests are recorded");
    let follow_up = requests.last().expect("at least the follow-up request");
    assert!(follow_up.headers.get("authorization").is_none());
}

#[tokio::test]
async fn rejected_request_surfaces_the_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "success": false,
            "message": "Booking not found"
        })))
        .mount(&server)
        .await;

    let (client, sink) = test_client(&server.uri(), TokenStore::new());
    let err = client
        .get_booking("missing")
        .await
        .expect_err("missing booking must fail");

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "Booking not found");
        }
        other => panic!("expected ApiError::Status, got {other:?}"),
    }
    assert_eq!(
        sink.recorded(),
        vec![Notice::Error("Booking not found".to_string())]
    );
}

#[tokio::test]
async fn envelope_failure_on_a_success_status_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "Tracking unavailable"
        })))
        .mount(&server)
        .await;

    let (client, sink) = test_client(&server.uri(), TokenStore::new());
    let err = client
        .get_booking("b1")
        .await
        .expect_err("flagged envelope must fail");

    match err {
        ApiError::Api(message) => assert_eq!(message, "Tracking unavailable"),
        other => panic!("expected ApiError::Api, got {other:?}"),
    }
    // Envelope failures are returned to the caller to handle, not toasted.
    assert!(sink.recorded().is_empty());
}

#[tokio::test]
async fn create_booking_posts_the_wizard_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .and(body_partial_json(serde_json::json!({
            "expert": "e42",
            "service": { "category": "plumber", "urgency": "high" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "success": true,
            "booking": booking_json("b9", "pending")
        })))
        .mount(&server)
        .await;

    let request = BookingRequest {
        service: ServiceDetails {
            category: ServiceCategory::Plumber,
            subcategory: None,
            description: "Leaking kitchen tap".to_string(),
            urgency: Urgency::High,
            estimated_duration: None,
        },
        location: ServiceLocation {
            address: "12 MG Road, Bengaluru".to_string(),
            coordinates: Some(GeoPoint {
                lat: 12.9716,
                lng: 77.5946,
            }),
            landmark: None,
            access_instructions: None,
        },
        scheduling: Schedule::new(
            NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
            None,
            true,
        ),
        expert: "e42".to_string(),
        pricing: Pricing {
            base_price: 500.0,
            materials_cost: 0.0,
            discount: 0.0,
        },
    };

    let (client, _sink) = test_client(&server.uri(), TokenStore::with_token("tok"));
    let booking = client
        .create_booking(&request)
        .await
        .expect("creation should succeed");

    assert_eq!(booking.id, "b9");
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn cancel_booking_omits_the_reason_when_none() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/bookings/b1/cancel"))
        .and(body_json(serde_json::json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "booking": booking_json("b1", "cancelled")
        })))
        .mount(&server)
        .await;

    let (client, _sink) = test_client(&server.uri(), TokenStore::new());
    let booking = client
        .cancel_booking("b1", None)
        .await
        .expect("cancel should succeed");

    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert!(booking.status.is_terminal());
}

#[tokio::test]
async fn experts_filters_by_category_and_location_pair() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/experts"))
        .and(query_param("category", "plumber"))
        .and(query_param("location", "12.9716,77.5946"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "experts": [{
                "_id": "e42",
                "user": { "name": "Ravi Kumar", "phone": "+91 98400 00000" },
                "services": [{ "category": "plumber", "hourlyRate": 450.0 }],
                "rating": { "average": 4.6, "count": 31 },
                "isOnline": true
            }]
        })))
        .mount(&server)
        .await;

    let (client, _sink) = test_client(&server.uri(), TokenStore::new());
    let experts = client
        .experts(
            ServiceCategory::Plumber,
            Some(GeoPoint {
                lat: 12.9716,
                lng: 77.5946,
            }),
            1,
            20,
        )
        .await
        .expect("search should succeed");

    assert_eq!(experts.len(), 1);
    assert_eq!(experts[0].id, "e42");
    assert_eq!(experts[0].user.name, "Ravi Kumar");
    assert!(experts[0].is_online);
}

#[tokio::test]
async fn tracking_history_unwraps_the_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracking/history/b7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "tracking": {
                "history": [
                    {
                        "lat": 12.96,
                        "lng": 77.58,
                        "timestamp": "2025-03-14T09:12:00Z",
                        "status": "en_route"
                    }
                ],
                "estimatedArrival": "2025-03-14T09:40:00Z"
            }
        })))
        .mount(&server)
        .await;

    let (client, _sink) = test_client(&server.uri(), TokenStore::with_token("tok"));
    let tracking = client
        .tracking_history("b7")
        .await
        .expect("history should parse");

    assert_eq!(tracking.history.len(), 1);
    assert!(tracking.estimated_arrival.is_some());
}

#[tokio::test]
async fn emergency_alert_spells_out_full_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emergency/alert"))
        .and(body_partial_json(serde_json::json!({
            "type": "sos",
            "location": { "latitude": 12.9716, "longitude": 77.5946 }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true })),
        )
        .mount(&server)
        .await;

    let alert = fixly_api::EmergencyAlertRequest {
        kind: fixly_core::EmergencyType::Sos,
        description: "Burst pipe flooding the flat",
        location: GeoPoint {
            lat: 12.9716,
            lng: 77.5946,
        }
        .into(),
        user_id: "u1",
    };

    let (client, _sink) = test_client(&server.uri(), TokenStore::with_token("tok"));
    client
        .send_emergency_alert(&alert)
        .await
        .expect("alert should be accepted");
}
