use chrono::{DateTime, Utc};

use fixly_api::Notice;
use fixly_core::{BookingStatus, TrackingSample};
use fixly_realtime::ServerEvent;

/// What the tracking view says the expert is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    /// No data yet.
    Idle,
    EnRoute,
    Arrived,
    Working,
    /// The booking left the active set; the session is over.
    Ended,
}

impl DisplayStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DisplayStatus::Idle => "Waiting for updates",
            DisplayStatus::EnRoute => "Expert on the way",
            DisplayStatus::Arrived => "Expert has arrived",
            DisplayStatus::Working => "Work in progress",
            DisplayStatus::Ended => "Tracking ended",
        }
    }
}

/// Work the session asks its driver to do. The machine itself never
/// touches the network; it hands these out and the driver feeds the
/// results back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Re-read the booking and feed its status into
    /// [`TrackingSession::apply_booking_status`].
    RefetchStatus,
    /// Re-pull the tracking history and feed it into
    /// [`TrackingSession::apply_history`].
    RefetchHistory,
    /// Surface a user-visible notice.
    Notify(Notice),
    /// The booking is no longer active; tear the session down.
    End,
}

/// Merged location/ETA/status view for one booking, reconciled from two
/// sources: pushed realtime events and pulled history fetches.
///
/// The sample log is append-only, kept in timestamp order, and
/// deduplicated by timestamp, so the current location is always the
/// temporally newest sample regardless of which source delivered it or
/// in what order the sources arrived.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    booking_id: String,
    history: Vec<TrackingSample>,
    eta: Option<DateTime<Utc>>,
    display: DisplayStatus,
}

impl TrackingSession {
    #[must_use]
    pub fn new(booking_id: impl Into<String>) -> Self {
        Self {
            booking_id: booking_id.into(),
            history: Vec::new(),
            eta: None,
            display: DisplayStatus::Idle,
        }
    }

    #[must_use]
    pub fn booking_id(&self) -> &str {
        &self.booking_id
    }

    /// Reported positions, oldest first.
    #[must_use]
    pub fn history(&self) -> &[TrackingSample] {
        &self.history
    }

    /// The newest sample across both sources.
    #[must_use]
    pub fn current(&self) -> Option<&TrackingSample> {
        self.history.last()
    }

    /// Last ETA either source supplied. Unlike the sample log this is
    /// last-input-wins, with no timestamp discipline of its own.
    #[must_use]
    pub fn eta(&self) -> Option<DateTime<Utc>> {
        self.eta
    }

    #[must_use]
    pub fn display(&self) -> DisplayStatus {
        self.display
    }

    /// Feeds one pushed event in. Events for other bookings are discarded
    /// with no observable change, whatever their type.
    pub fn apply_event(&mut self, event: &ServerEvent) -> Vec<SessionEffect> {
        if event.booking_id() != Some(self.booking_id.as_str()) {
            return Vec::new();
        }
        match event {
            ServerEvent::ExpertLocationUpdate {
                expert_location,
                estimated_arrival,
                ..
            } => {
                self.absorb(*expert_location);
                self.eta = *estimated_arrival;
                Vec::new()
            }
            ServerEvent::ExpertArrived { .. } => {
                self.display = DisplayStatus::Arrived;
                vec![
                    SessionEffect::Notify(Notice::Success("Expert has arrived!".to_string())),
                    SessionEffect::RefetchStatus,
                ]
            }
            ServerEvent::TrackingStarted { .. } => vec![
                SessionEffect::Notify(Notice::Success("Tracking has started!".to_string())),
                SessionEffect::RefetchHistory,
            ],
            _ => Vec::new(),
        }
    }

    /// Feeds a pulled history in: union-merges the samples and takes the
    /// pulled ETA.
    pub fn apply_history(
        &mut self,
        samples: Vec<TrackingSample>,
        eta: Option<DateTime<Utc>>,
    ) -> Vec<SessionEffect> {
        for sample in samples {
            self.absorb(sample);
        }
        self.eta = eta;
        Vec::new()
    }

    /// Feeds a refetched booking status in. `accepted` shows as en route
    /// unless an arrival push already landed; `in_progress` shows as
    /// working, which is therefore only ever reached through a refetch.
    /// Anything outside the active set ends the session.
    pub fn apply_booking_status(&mut self, status: BookingStatus) -> Vec<SessionEffect> {
        match status {
            BookingStatus::InProgress => {
                self.display = DisplayStatus::Working;
                Vec::new()
            }
            BookingStatus::Accepted => {
                if self.display != DisplayStatus::Arrived {
                    self.display = DisplayStatus::EnRoute;
                }
                Vec::new()
            }
            _ => {
                self.display = DisplayStatus::Ended;
                vec![SessionEffect::End]
            }
        }
    }

    fn absorb(&mut self, sample: TrackingSample) {
        match self
            .history
            .binary_search_by_key(&sample.timestamp, |s| s.timestamp)
        {
            // The backend never reuses a timestamp within a booking; an
            // equal key is the same sample arriving through the other
            // source.
            Ok(_) => {}
            Err(position) => self.history.insert(position, sample),
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
