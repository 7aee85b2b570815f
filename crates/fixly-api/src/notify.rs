use std::fmt;

/// A transient, user-visible notification. The terminal front end prints
/// these; tests record them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
    /// The stored credential was rejected and has been cleared; the user
    /// must log in again.
    SessionExpired,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Error(message) | Notice::Success(message) => f.write_str(message),
            Notice::SessionExpired => f.write_str("Your session has expired. Please log in again."),
        }
    }
}

/// Sink for user-visible notifications, injected wherever a component needs
/// to raise one. Implementations must be cheap and non-blocking; they are
/// called from async request paths.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sink that drops every notice, for contexts with no user to talk to.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl NotificationSink for SilentSink {
    fn notify(&self, _notice: Notice) {}
}
