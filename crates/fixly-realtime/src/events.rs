//! Typed wire events for the realtime channel.
//!
//! Every frame is a JSON object `{ "event": "<name>", "data": { … } }`.
//! Event names are kebab-case, payload fields camelCase, matching the
//! backend's emit calls. Frames with an unrecognized event name fail to
//! parse and are dropped by the reader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fixly_core::{EmergencyType, GeoPoint, TrackingSample};

/// Pushes the backend addresses to this identity's room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A new position sample for a tracked booking.
    #[serde(rename_all = "camelCase")]
    ExpertLocationUpdate {
        booking_id: String,
        expert_location: TrackingSample,
        #[serde(default)]
        estimated_arrival: Option<DateTime<Utc>>,
    },
    /// The expert reached the service location.
    #[serde(rename_all = "camelCase")]
    ExpertArrived { booking_id: String },
    /// The expert started sharing their location.
    #[serde(rename_all = "camelCase")]
    TrackingStarted { booking_id: String },
    /// An emergency alert near this user was raised.
    EmergencyNotification {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    IncomingVideoCall {
        booking_id: String,
        user_name: String,
    },
    #[serde(rename_all = "camelCase")]
    VideoCallAccepted {
        #[serde(default)]
        booking_id: Option<String>,
    },
}

impl ServerEvent {
    /// The booking this event is scoped to, when it is scoped to one.
    #[must_use]
    pub fn booking_id(&self) -> Option<&str> {
        match self {
            ServerEvent::ExpertLocationUpdate { booking_id, .. }
            | ServerEvent::ExpertArrived { booking_id }
            | ServerEvent::TrackingStarted { booking_id }
            | ServerEvent::IncomingVideoCall { booking_id, .. } => Some(booking_id),
            ServerEvent::VideoCallAccepted { booking_id } => booking_id.as_deref(),
            ServerEvent::EmergencyNotification { .. } => None,
        }
    }
}

/// Frames this client emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Registers the connection for identity-addressed pushes. Sent once
    /// after every successful connect.
    #[serde(rename_all = "camelCase")]
    JoinRoom { user_id: String },
    /// Broadcast an emergency to nearby experts. Unlike the REST alert,
    /// the emitted location uses the short `lat`/`lng` spelling.
    #[serde(rename_all = "camelCase")]
    EmergencyAlert {
        location: GeoPoint,
        emergency_type: EmergencyType,
        description: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_room_frame_has_event_and_data() {
        let frame = serde_json::to_value(ClientEvent::JoinRoom {
            user_id: "u1".to_string(),
        })
        .unwrap();
        assert_eq!(
            frame,
            serde_json::json!({ "event": "join-room", "data": { "userId": "u1" } })
        );
    }

    #[test]
    fn emergency_alert_uses_short_coordinates_and_lowercase_type() {
        let frame = serde_json::to_value(ClientEvent::EmergencyAlert {
            location: GeoPoint {
                lat: 12.9716,
                lng: 77.5946,
            },
            emergency_type: EmergencyType::General,
            description: "Emergency service requested".to_string(),
        })
        .unwrap();
        assert_eq!(frame["event"], "emergency-alert");
        assert_eq!(frame["data"]["location"]["lat"], 12.9716);
        assert_eq!(frame["data"]["emergencyType"], "general");
    }

    #[test]
    fn location_update_parses_the_backend_shape() {
        let frame = r#"{
            "event": "expert-location-update",
            "data": {
                "bookingId": "b1",
                "expertLocation": {
                    "lat": 12.96,
                    "lng": 77.58,
                    "timestamp": "2025-03-01T10:15:00Z",
                    "status": "en_route"
                },
                "estimatedArrival": "2025-03-01T10:40:00Z"
            }
        }"#;
        let event: ServerEvent = serde_json::from_str(frame).unwrap();
        match &event {
            ServerEvent::ExpertLocationUpdate {
                booking_id,
                expert_location,
                estimated_arrival,
            } => {
                assert_eq!(booking_id, "b1");
                assert_eq!(expert_location.lat, 12.96);
                assert!(estimated_arrival.is_some());
            }
            other => panic!("expected a location update, got {other:?}"),
        }
        assert_eq!(event.booking_id(), Some("b1"));
    }

    #[test]
    fn unknown_event_names_do_not_parse() {
        let frame = r#"{ "event": "expert-sneezed", "data": {} }"#;
        assert!(serde_json::from_str::<ServerEvent>(frame).is_err());
    }

    #[test]
    fn global_events_have_no_booking_scope() {
        let frame = r#"{ "event": "emergency-notification", "data": {} }"#;
        let event: ServerEvent = serde_json::from_str(frame).unwrap();
        assert_eq!(event.booking_id(), None);
    }

    #[test]
    fn video_call_accepted_tolerates_an_empty_payload() {
        let frame = r#"{ "event": "video-call-accepted", "data": {} }"#;
        let event: ServerEvent = serde_json::from_str(frame).unwrap();
        assert_eq!(event, ServerEvent::VideoCallAccepted { booking_id: None });
    }
}
