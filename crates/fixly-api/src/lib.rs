//! Typed client for the Fixly backend REST API.
//!
//! [`ApiClient`] wraps every endpoint the terminal client touches and
//! applies the shared response handling: bearer tokens from a
//! [`TokenStore`], session expiry on `401`, and user-visible notices
//! through a [`NotificationSink`].

pub mod client;
pub mod error;
pub mod notify;
pub mod token;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use notify::{Notice, NotificationSink, SilentSink};
pub use token::TokenStore;
pub use types::{
    ApiResponse, BookingResponse, BookingsPage, CommunityPost, EmergencyAlertRequest,
    EmergencyLocation, Identity, LoginResponse, Pagination, PaymentIntent, PostComment,
    TrackingHistory,
};
