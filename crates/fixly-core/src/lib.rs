//! Shared data model and configuration for the fixly client stack: the
//! service taxonomy, booking and tracking wire types, the immutable
//! booking draft, and environment-driven settings.

pub mod app_config;
pub mod booking;
pub mod categories;
pub mod config;
pub mod draft;
pub mod emergency;
pub mod experts;
pub mod tracking;

pub use app_config::AppConfig;
pub use booking::{
    Booking, BookingStatus, ChatMessage, Communication, InvalidTimeWindow, Pricing, Schedule,
    Sender, ServiceDetails, ServiceLocation, TimeWindow, UnknownStatus,
};
pub use categories::{ServiceCategory, UnknownCategory, UnknownUrgency, Urgency};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use draft::{BookingDraft, BookingRequest, DraftError, BOOKING_HORIZON_DAYS};
pub use emergency::{EmergencyType, UnknownEmergencyType};
pub use experts::{
    ExpertField, ExpertProfile, ExpertRating, ExpertRef, ExpertService, ExpertSummary, ExpertUser,
};
pub use tracking::{ExpertActivity, GeoPoint, TrackingInfo, TrackingSample};
