use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// What the expert is doing at the moment a location sample was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertActivity {
    EnRoute,
    Arrived,
    Working,
    Idle,
}

impl ExpertActivity {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ExpertActivity::EnRoute => "On the way",
            ExpertActivity::Arrived => "Arrived",
            ExpertActivity::Working => "Working",
            ExpertActivity::Idle => "Idle",
        }
    }
}

/// One reported expert position. Samples are identified by `timestamp`;
/// the backend never reuses a timestamp within a booking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingSample {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
    pub status: ExpertActivity,
}

impl TrackingSample {
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Tracking state embedded in a booking snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    /// Reported positions, oldest first.
    #[serde(default)]
    pub expert_location: Vec<TrackingSample>,
    pub estimated_arrival: Option<DateTime<Utc>>,
}

impl TrackingInfo {
    /// The most recently reported position, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&TrackingSample> {
        self.expert_location.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_sample(secs: i64, status: ExpertActivity) -> TrackingSample {
        TrackingSample {
            lat: 28.6139,
            lng: 77.209,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            status,
        }
    }

    #[test]
    fn activity_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&ExpertActivity::EnRoute).unwrap();
        assert_eq!(json, "\"en_route\"");
        let parsed: ExpertActivity = serde_json::from_str("\"working\"").unwrap();
        assert_eq!(parsed, ExpertActivity::Working);
    }

    #[test]
    fn sample_deserializes_from_backend_shape() {
        let json = r#"{
            "lat": 28.6139,
            "lng": 77.209,
            "timestamp": "2025-03-01T10:15:00Z",
            "status": "en_route"
        }"#;
        let sample: TrackingSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.status, ExpertActivity::EnRoute);
        assert_eq!(sample.point().lat, 28.6139);
    }

    #[test]
    fn tracking_info_latest_is_the_last_sample() {
        let info = TrackingInfo {
            expert_location: vec![
                make_sample(100, ExpertActivity::EnRoute),
                make_sample(200, ExpertActivity::Arrived),
            ],
            estimated_arrival: None,
        };
        assert_eq!(info.latest().unwrap().status, ExpertActivity::Arrived);
    }

    #[test]
    fn tracking_info_tolerates_missing_fields() {
        let info: TrackingInfo = serde_json::from_str("{}").unwrap();
        assert!(info.expert_location.is_empty());
        assert!(info.latest().is_none());
        assert!(info.estimated_arrival.is_none());
    }

    #[test]
    fn tracking_info_uses_camel_case_field_names() {
        let json = r#"{
            "expertLocation": [],
            "estimatedArrival": "2025-03-01T11:00:00Z"
        }"#;
        let info: TrackingInfo = serde_json::from_str(json).unwrap();
        assert!(info.estimated_arrival.is_some());
    }
}
