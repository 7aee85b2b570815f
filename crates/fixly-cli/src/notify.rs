//! Terminal output for notices raised anywhere in the stack.

use fixly_api::{Notice, NotificationSink};

/// Prints each notice on its own line the moment it is raised, including
/// from background tasks like the tracking worker.
pub(crate) struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(_) => println!("{notice}"),
            Notice::Error(_) | Notice::SessionExpired => eprintln!("error: {notice}"),
        }
    }
}

/// Spinner-free pending indicator for slow calls.
pub(crate) fn pending(action: &str) {
    println!("{action}\u{2026}");
}
