//! Emergency alert: REST delivery first, then a realtime broadcast to
//! nearby experts when a channel is up.

use std::time::Duration;

use fixly_api::EmergencyAlertRequest;
use fixly_core::{AppConfig, EmergencyType};
use fixly_realtime::ClientEvent;
use fixly_session::SessionManager;

use crate::auth::require_session;
use crate::location::LocationSource;
use crate::notify::pending;

/// Acquire a location within the configured wait, send the alert, then
/// broadcast it over the live channel. The broadcast is best effort; the
/// REST alert is the one that must land.
///
/// # Errors
///
/// Returns an error when no session can be restored, no location fix
/// arrives in time, or the REST alert is rejected.
pub(crate) async fn run_emergency(
    session: &mut SessionManager,
    config: &AppConfig,
    source: &impl LocationSource,
    sos: bool,
    description: &str,
) -> anyhow::Result<()> {
    let me = require_session(session).await?;

    pending("Waiting for a location fix");
    let location = source
        .acquire(Duration::from_secs(config.geolocation_timeout_secs))
        .await?;

    let kind = if sos {
        EmergencyType::Sos
    } else {
        EmergencyType::General
    };
    let alert = EmergencyAlertRequest {
        kind,
        description,
        location: location.into(),
        user_id: &me.id,
    };
    session.api().send_emergency_alert(&alert).await?;
    println!(
        "Emergency alert sent from {:.4},{:.4}.",
        location.lat, location.lng
    );

    match session.ensure_channel().await {
        Ok(channel) => {
            channel
                .emit(ClientEvent::EmergencyAlert {
                    location,
                    emergency_type: kind,
                    description: description.to_string(),
                })
                .await?;
            println!("Nearby experts notified over the live channel.");
        }
        Err(error) => tracing::warn!(%error, "realtime emergency broadcast skipped"),
    }
    Ok(())
}
