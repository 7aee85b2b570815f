//! Follow live tracking for one booking until it ends.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::broadcast;

use fixly_api::NotificationSink;
use fixly_core::AppConfig;
use fixly_realtime::ServerEvent;
use fixly_session::SessionManager;
use fixly_tracking::{DisplayStatus, TrackingSession, TrackingWorker};

use crate::auth::require_session;

/// Run the tracking worker for a booking, printing a line per update,
/// until the booking leaves the active set or Ctrl-C.
///
/// With no realtime channel the worker runs on pulls alone; call and
/// emergency notices then stay silent, tracking itself still works.
///
/// # Errors
///
/// Returns an error when no session can be restored.
pub(crate) async fn run_watch(
    session: &mut SessionManager,
    config: &AppConfig,
    notifier: Arc<dyn NotificationSink>,
    booking_id: &str,
) -> anyhow::Result<()> {
    require_session(session).await?;

    // Subscribe before the worker's first pull so no push slips between
    // them. One receiver feeds the worker, the other surfaces the
    // booking-independent notices.
    let (events, mut notices) = match session.ensure_channel().await {
        Ok(channel) => (channel.subscribe(), Some(channel.subscribe())),
        Err(error) => {
            tracing::warn!(%error, "no realtime channel, tracking will poll");
            let (_tx, rx) = broadcast::channel(1);
            (rx, None)
        }
    };

    let worker = TrackingWorker::spawn(
        booking_id,
        session.api().clone(),
        events,
        notifier,
        config.into(),
    );
    let mut snapshots = worker.snapshot();

    println!("Watching booking {booking_id}; Ctrl-C stops.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("Stopped watching.");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = snapshots.borrow_and_update().clone();
                print_update(&view);
                if view.display() == DisplayStatus::Ended {
                    break;
                }
            }
            line = next_notice(&mut notices) => {
                if let Some(line) = line {
                    println!("{line}");
                }
            }
        }
    }

    worker.stop().await;
    Ok(())
}

/// The next printable notice from the channel, pending forever once the
/// channel is gone so the select leans on its other arms.
async fn next_notice(events: &mut Option<broadcast::Receiver<ServerEvent>>) -> Option<String> {
    loop {
        let outcome = match events {
            Some(receiver) => receiver.recv().await,
            None => return std::future::pending().await,
        };
        match outcome {
            Ok(event) => {
                if let Some(line) = notice_line(&event) {
                    return Some(line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => {
                *events = None;
                return None;
            }
        }
    }
}

/// Notices the tracking session does not own: calls and emergencies.
fn notice_line(event: &ServerEvent) -> Option<String> {
    match event {
        ServerEvent::IncomingVideoCall { user_name, .. } => {
            Some(format!("Incoming video call from {user_name}"))
        }
        ServerEvent::VideoCallAccepted { .. } => Some("Video call accepted!".to_string()),
        ServerEvent::EmergencyNotification { message } => Some(
            message
                .clone()
                .unwrap_or_else(|| "Emergency alert received!".to_string()),
        ),
        _ => None,
    }
}

fn print_update(view: &TrackingSession) {
    let position = view.current().map_or_else(
        || "no position yet".to_string(),
        |sample| format!("{:.4},{:.4} ({})", sample.lat, sample.lng, sample.status.label()),
    );
    let eta = view.eta().map_or_else(
        || "\u{2014}".to_string(),
        |eta| eta.with_timezone(&Local).format("%H:%M").to_string(),
    );
    println!("{:<22}{:<28}ETA {}", view.display().label(), position, eta);
}
