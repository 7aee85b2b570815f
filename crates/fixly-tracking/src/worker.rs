use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use fixly_api::{ApiClient, NotificationSink};
use fixly_core::AppConfig;
use fixly_realtime::ServerEvent;

use crate::session::{SessionEffect, TrackingSession};

/// How often the worker wakes, and how stale the push stream must be
/// before a wake turns into a reconciliation pull.
#[derive(Debug, Clone, Copy)]
pub struct PullCadence {
    pub poll_interval: Duration,
    pub idle_refetch: Duration,
}

impl From<&AppConfig> for PullCadence {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            idle_refetch: Duration::from_secs(config.idle_refetch_secs),
        }
    }
}

/// Drives a [`TrackingSession`] for one booking: applies pushed events,
/// performs the effects the session asks for, and falls back to periodic
/// history pulls when the push stream goes quiet.
///
/// The maintained session is published through a watch channel; render
/// loops hold a [`TrackingWorker::snapshot`] receiver and redraw on
/// change. Dropping the worker detaches it: the background task stops and
/// any in-flight response is discarded unread.
#[derive(Debug)]
pub struct TrackingWorker {
    snapshot: watch::Receiver<TrackingSession>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TrackingWorker {
    /// Starts the worker. The initial population happens on the spawned
    /// task: a booking read for the status, then, while the booking is
    /// active, a history pull.
    #[must_use]
    pub fn spawn(
        booking_id: impl Into<String>,
        api: ApiClient,
        events: broadcast::Receiver<ServerEvent>,
        notifier: Arc<dyn NotificationSink>,
        cadence: PullCadence,
    ) -> Self {
        let session = TrackingSession::new(booking_id);
        let (snapshot_tx, snapshot) = watch::channel(session.clone());
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run(
            session,
            api,
            events,
            notifier,
            cadence,
            snapshot_tx,
            stop_rx,
        ));
        Self {
            snapshot,
            stop,
            task,
        }
    }

    /// Watch the session as the worker maintains it.
    #[must_use]
    pub fn snapshot(&self) -> watch::Receiver<TrackingSession> {
        self.snapshot.clone()
    }

    /// The session as of the latest update.
    #[must_use]
    pub fn session(&self) -> TrackingSession {
        self.snapshot.borrow().clone()
    }

    /// Stops the worker and waits for the background task to wind down.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

async fn run(
    mut session: TrackingSession,
    api: ApiClient,
    mut events: broadcast::Receiver<ServerEvent>,
    notifier: Arc<dyn NotificationSink>,
    cadence: PullCadence,
    snapshot: watch::Sender<TrackingSession>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ended = perform(
        vec![SessionEffect::RefetchStatus],
        &mut session,
        &api,
        &notifier,
    )
    .await;
    if !ended {
        perform(
            vec![SessionEffect::RefetchHistory],
            &mut session,
            &api,
            &notifier,
        )
        .await;
    }
    let _ = snapshot.send(session.clone());

    let mut last_push = Instant::now();
    let mut tick = tokio::time::interval(cadence.poll_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events_open = true;

    while !ended {
        tokio::select! {
            _ = stop.changed() => break,
            event = events.recv(), if events_open => match event {
                Ok(event) => {
                    let relevant = is_tracking_push(&event, session.booking_id());
                    if relevant {
                        last_push = Instant::now();
                    }
                    let effects = session.apply_event(&event);
                    ended = perform(effects, &mut session, &api, &notifier).await;
                    if relevant {
                        let _ = snapshot.send(session.clone());
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "missed pushed events, reconciling by pull");
                    let effects = vec![SessionEffect::RefetchStatus, SessionEffect::RefetchHistory];
                    ended = perform(effects, &mut session, &api, &notifier).await;
                    let _ = snapshot.send(session.clone());
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("realtime stream closed, tracking continues on pulls alone");
                    events_open = false;
                }
            },
            _ = tick.tick() => {
                if last_push.elapsed() >= cadence.idle_refetch {
                    perform(
                        vec![SessionEffect::RefetchHistory],
                        &mut session,
                        &api,
                        &notifier,
                    )
                    .await;
                    let _ = snapshot.send(session.clone());
                }
            }
        }
    }
}

/// The three pushes that feed this session, as opposed to traffic for
/// other bookings or non-tracking events.
fn is_tracking_push(event: &ServerEvent, booking_id: &str) -> bool {
    matches!(
        event,
        ServerEvent::ExpertLocationUpdate { .. }
            | ServerEvent::ExpertArrived { .. }
            | ServerEvent::TrackingStarted { .. }
    ) && event.booking_id() == Some(booking_id)
}

/// Works through one round of effects, including the ones a refetch
/// produces in turn. Failed refetches are logged and skipped; the next
/// push or idle pull retries. Returns whether the session ended.
async fn perform(
    effects: Vec<SessionEffect>,
    session: &mut TrackingSession,
    api: &ApiClient,
    notifier: &Arc<dyn NotificationSink>,
) -> bool {
    let mut queue = VecDeque::from(effects);
    while let Some(effect) = queue.pop_front() {
        match effect {
            SessionEffect::Notify(notice) => notifier.notify(notice),
            SessionEffect::RefetchStatus => {
                match api.get_booking(session.booking_id()).await {
                    Ok(booking) => queue.extend(session.apply_booking_status(booking.status)),
                    Err(error) => tracing::warn!(%error, "booking status refetch failed"),
                }
            }
            SessionEffect::RefetchHistory => {
                match api.tracking_history(session.booking_id()).await {
                    Ok(tracking) => queue.extend(
                        session.apply_history(tracking.history, tracking.estimated_arrival),
                    ),
                    Err(error) => tracing::warn!(%error, "tracking history pull failed"),
                }
            }
            SessionEffect::End => return true,
        }
    }
    false
}
