use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::categories::{ServiceCategory, Urgency};
use crate::experts::ExpertField;
use crate::tracking::{GeoPoint, TrackingInfo};

/// Server-side lifecycle of a booking.
///
/// `pending → accepted → in_progress → completed`, with cancellation
/// possible until work starts and disputes once an expert is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
}

impl BookingStatus {
    /// Wire slug, also used for the `status` query filter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Disputed => "disputed",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Accepted => "Accepted",
            BookingStatus::InProgress => "In progress",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Disputed => "Disputed",
        }
    }

    /// Statuses after which the booking can never change again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Statuses during which an expert is assigned and live tracking runs.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Accepted | BookingStatus::InProgress)
    }

    /// Whether the server accepts a transition from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Accepted, BookingStatus::InProgress)
                | (BookingStatus::Accepted, BookingStatus::Cancelled)
                | (BookingStatus::Accepted, BookingStatus::Disputed)
                | (BookingStatus::InProgress, BookingStatus::Completed)
                | (BookingStatus::InProgress, BookingStatus::Disputed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "in_progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "disputed" => Ok(BookingStatus::Disputed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error returned when a string does not name a known booking status.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

/// What work is being requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub category: ServiceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub description: String,
    pub urgency: Urgency,
    /// Expert's estimate in hours, set server-side after acceptance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<f64>,
}

/// Where the work happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLocation {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_instructions: Option<String>,
}

/// `HH:MM` strings on the wire, the format the booking form submits.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// A same-day arrival window. `start` is strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeWindow {
    /// # Errors
    ///
    /// Returns [`InvalidTimeWindow`] unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, InvalidTimeWindow> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(InvalidTimeWindow { start, end })
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("time window start {start} is not before end {end}")]
pub struct InvalidTimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// When the work should happen. The `actual_*` fields are written by the
/// server once the expert starts and finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub preferred_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<TimeWindow>,
    #[serde(default)]
    pub flexible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end_time: Option<DateTime<Utc>>,
}

impl Schedule {
    #[must_use]
    pub fn new(preferred_date: NaiveDate, preferred_time: Option<TimeWindow>, flexible: bool) -> Self {
        Self {
            preferred_date,
            preferred_time,
            flexible,
            actual_start_time: None,
            actual_end_time: None,
        }
    }
}

/// Price components in whole-rupee JSON numbers, as the backend sends them.
/// The server echoes a derived `finalPrice` which this client recomputes
/// instead of storing; the formula is shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub base_price: f64,
    #[serde(default)]
    pub materials_cost: f64,
    #[serde(default)]
    pub discount: f64,
}

impl Pricing {
    /// Amount actually charged, never negative.
    #[must_use]
    pub fn final_price(&self) -> f64 {
        (self.base_price + self.materials_cost - self.discount).max(0.0)
    }
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Expert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// In-booking communication. Chat history is append-only from this
/// client's point of view; new messages arrive via refetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    #[serde(default)]
    pub chat_messages: Vec<ChatMessage>,
}

/// A booking as the server last reported it. Everything here is a
/// snapshot; the authoritative copy lives on the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: BookingStatus,
    pub service: ServiceDetails,
    pub location: ServiceLocation,
    pub scheduling: Schedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert: Option<ExpertField>,
    pub pricing: Pricing,
    #[serde(default)]
    pub communication: Communication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingInfo>,
}

impl Booking {
    /// Latest chat messages, oldest first, capped at `limit`.
    #[must_use]
    pub fn chat_tail(&self, limit: usize) -> &[ChatMessage] {
        let messages = &self.communication.chat_messages;
        let start = messages.len().saturating_sub(limit);
        &messages[start..]
    }
}
