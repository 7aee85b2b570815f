//! Live tracking for an active booking: a pure session state machine
//! that merges pushed realtime events with pulled history fetches, and an
//! async worker that drives it against the backend.

pub mod session;
pub mod worker;

pub use session::{DisplayStatus, SessionEffect, TrackingSession};
pub use worker::{PullCadence, TrackingWorker};
