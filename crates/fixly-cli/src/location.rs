//! Geolocation with a bounded wait.
//!
//! Every acquisition resolves or fails within the caller's timeout;
//! nothing downstream waits on a fix for longer than that.

use std::time::Duration;

use thiserror::Error;

use fixly_core::{AppConfig, GeoPoint};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no location fix within {0:?}")]
pub(crate) struct LocationTimeout(pub(crate) Duration);

/// Source of the user's current position.
pub(crate) trait LocationSource {
    async fn acquire(&self, timeout: Duration) -> Result<GeoPoint, LocationTimeout>;
}

/// The default source. A terminal has no GPS, so a configured fallback
/// position answers immediately; without one the wait runs out the same
/// way a fixless receiver would.
pub(crate) struct FallbackLocation {
    fallback: Option<GeoPoint>,
}

impl FallbackLocation {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        Self {
            fallback: config.fallback_location,
        }
    }
}

impl LocationSource for FallbackLocation {
    async fn acquire(&self, timeout: Duration) -> Result<GeoPoint, LocationTimeout> {
        match self.fallback {
            Some(point) => Ok(point),
            None => {
                tokio::time::sleep(timeout).await;
                Err(LocationTimeout(timeout))
            }
        }
    }
}
