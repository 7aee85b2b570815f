//! Booking list, detail, cancellation and chat handlers.

use chrono::Local;

use fixly_core::{Booking, BookingStatus, Sender};
use fixly_session::SessionManager;

use crate::auth::require_session;

const PAGE_SIZE: u32 = 10;
const CHAT_TAIL: usize = 5;

/// List the caller's bookings, newest first as the backend orders them.
///
/// # Errors
///
/// Returns an error when no session can be restored or the listing fails.
pub(crate) async fn run_bookings(
    session: &mut SessionManager,
    status: Option<BookingStatus>,
    page: u32,
) -> anyhow::Result<()> {
    require_session(session).await?;
    let listing = session.api().my_bookings(status, page, PAGE_SIZE).await?;

    if listing.bookings.is_empty() {
        println!("no bookings found; create one with `fixly book`");
        return Ok(());
    }

    println!("{:<26}{:<14}{:<13}{:<12}JOB", "ID", "SERVICE", "STATUS", "DATE");
    for booking in &listing.bookings {
        // NaiveDate's Display ignores width flags, so pad the rendered string.
        let date = booking.scheduling.preferred_date.to_string();
        println!(
            "{:<26}{:<14}{:<13}{:<12}{}",
            booking.id,
            booking.service.category.label(),
            booking.status.label(),
            date,
            truncate(&booking.service.description, 40),
        );
    }
    let pagination = &listing.pagination;
    println!();
    println!(
        "page {} of {} ({} total)",
        pagination.page, pagination.pages, pagination.total
    );
    Ok(())
}

/// Show one booking in full, with the recent chat tail.
///
/// # Errors
///
/// Returns an error when no session can be restored or the booking cannot
/// be fetched.
pub(crate) async fn run_booking(session: &mut SessionManager, id: &str) -> anyhow::Result<()> {
    require_session(session).await?;
    let booking = session.api().get_booking(id).await?;
    print_booking(&booking);
    Ok(())
}

/// Cancel a booking, optionally with a reason the expert will see.
///
/// # Errors
///
/// Returns an error when no session can be restored or the booking is
/// past the point of cancellation.
pub(crate) async fn run_cancel(
    session: &mut SessionManager,
    id: &str,
    reason: Option<&str>,
) -> anyhow::Result<()> {
    require_session(session).await?;
    let booking = session.api().cancel_booking(id, reason).await?;
    println!("Booking {} is now {}.", booking.id, booking.status.label());
    Ok(())
}

/// Send a chat message on a booking.
///
/// # Errors
///
/// Returns an error when no session can be restored or the message is
/// rejected.
pub(crate) async fn run_message(
    session: &mut SessionManager,
    id: &str,
    text: &str,
) -> anyhow::Result<()> {
    require_session(session).await?;
    session.api().send_message(id, text).await?;
    println!("Message sent.");
    Ok(())
}

fn print_booking(booking: &Booking) {
    println!("Booking {} \u{2014} {}", booking.id, booking.status.label());
    println!(
        "Service:  {} ({})",
        booking.service.category.label(),
        booking.service.urgency.label()
    );
    println!("Job:      {}", booking.service.description);
    println!("Address:  {}", booking.location.address);

    let schedule = &booking.scheduling;
    let window = if schedule.flexible {
        "any time".to_string()
    } else {
        schedule.preferred_time.map_or_else(
            || "any time".to_string(),
            |w| {
                format!(
                    "{}\u{2013}{}",
                    w.start.format("%H:%M"),
                    w.end.format("%H:%M")
                )
            },
        )
    };
    println!("Visit:    {} ({window})", schedule.preferred_date);

    if let Some(expert) = &booking.expert {
        match expert.profile() {
            Some(profile) => println!(
                "Expert:   {} ({})",
                profile.user.name,
                if profile.is_online { "online" } else { "offline" }
            ),
            None => println!("Expert:   {}", expert.id()),
        }
    }
    println!("Total:    \u{20b9}{:.2}", booking.pricing.final_price());

    let tail = booking.chat_tail(CHAT_TAIL);
    if !tail.is_empty() {
        println!();
        println!("Recent chat:");
        for message in tail {
            let stamp = message.timestamp.with_timezone(&Local).format("%H:%M");
            let who = match message.sender {
                Sender::User => "you",
                Sender::Expert => "expert",
            };
            println!("  [{stamp}] {who}: {}", message.message);
        }
    }
}

/// Cap display text at `limit` characters, marking the cut.
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        format!("{}...", text.chars().take(limit).collect::<String>())
    } else {
        text.to_string()
    }
}
