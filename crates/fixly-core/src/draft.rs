use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::booking::{Pricing, Schedule, ServiceDetails, ServiceLocation, TimeWindow};
use crate::categories::{ServiceCategory, Urgency};
use crate::experts::ExpertRef;
use crate::tracking::GeoPoint;

/// Bookings may start no earlier than tomorrow and no later than this many
/// days out.
pub const BOOKING_HORIZON_DAYS: u64 = 30;

/// A booking being assembled, one wizard step at a time.
///
/// The draft is an immutable value: the `with_*` operations validate their
/// own slice and return a new draft, leaving every other field untouched.
/// A failed operation returns the error and the caller still holds the
/// previous value, so invalid input can never end up inside a draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingDraft {
    category: Option<ServiceCategory>,
    subcategory: Option<String>,
    description: Option<String>,
    urgency: Urgency,
    address: Option<String>,
    coordinates: Option<GeoPoint>,
    landmark: Option<String>,
    access_instructions: Option<String>,
    preferred_date: Option<NaiveDate>,
    preferred_time: Option<TimeWindow>,
    flexible: bool,
    expert: Option<ExpertRef>,
    pricing: Pricing,
}

/// Why a draft operation or submission check was rejected. Messages are
/// user-facing; they end up verbatim in validation notices.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DraftError {
    #[error("select a service category")]
    MissingCategory,
    #[error("describe what needs to be done")]
    EmptyDescription,
    #[error("enter the service address")]
    EmptyAddress,
    #[error("pick a preferred date")]
    MissingDate,
    #[error("{date} is too soon, the earliest bookable day is {earliest}")]
    DateTooSoon { date: NaiveDate, earliest: NaiveDate },
    #[error("{date} is past the booking horizon, the latest bookable day is {latest}")]
    DateTooFar { date: NaiveDate, latest: NaiveDate },
    #[error("pick a time window or mark the schedule as flexible")]
    MissingTimeWindow,
    #[error("choose an expert")]
    MissingExpert,
    #[error("{field} cannot be negative")]
    NegativeAmount { field: &'static str },
}

impl BookingDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the category alone, used when an expert shortcut seeds the
    /// draft. The description stays unset, so the service step still gates.
    #[must_use]
    pub fn with_category(&self, category: ServiceCategory) -> Self {
        let mut next = self.clone();
        next.category = Some(category);
        next
    }

    /// Records the service step.
    ///
    /// # Errors
    ///
    /// [`DraftError::EmptyDescription`] when the description is blank.
    pub fn with_service(
        &self,
        category: ServiceCategory,
        subcategory: Option<&str>,
        description: &str,
        urgency: Urgency,
    ) -> Result<Self, DraftError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(DraftError::EmptyDescription);
        }
        let mut next = self.clone();
        next.category = Some(category);
        next.subcategory = clean_optional(subcategory);
        next.description = Some(description.to_string());
        next.urgency = urgency;
        Ok(next)
    }

    /// Records the location step.
    ///
    /// # Errors
    ///
    /// [`DraftError::EmptyAddress`] when the address is blank.
    pub fn with_location(
        &self,
        address: &str,
        coordinates: Option<GeoPoint>,
        landmark: Option<&str>,
        access_instructions: Option<&str>,
    ) -> Result<Self, DraftError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(DraftError::EmptyAddress);
        }
        let mut next = self.clone();
        next.address = Some(address.to_string());
        next.coordinates = coordinates;
        next.landmark = clean_optional(landmark);
        next.access_instructions = clean_optional(access_instructions);
        Ok(next)
    }

    /// Records the scheduling step. `today` anchors the bookable range:
    /// tomorrow through [`BOOKING_HORIZON_DAYS`] days out.
    ///
    /// # Errors
    ///
    /// [`DraftError::DateTooSoon`], [`DraftError::DateTooFar`], or
    /// [`DraftError::MissingTimeWindow`] when the window is absent and the
    /// schedule is not flexible.
    pub fn with_schedule(
        &self,
        preferred_date: NaiveDate,
        preferred_time: Option<TimeWindow>,
        flexible: bool,
        today: NaiveDate,
    ) -> Result<Self, DraftError> {
        check_date_in_range(preferred_date, today)?;
        if !flexible && preferred_time.is_none() {
            return Err(DraftError::MissingTimeWindow);
        }
        let mut next = self.clone();
        next.preferred_date = Some(preferred_date);
        next.preferred_time = preferred_time;
        next.flexible = flexible;
        Ok(next)
    }

    /// Records the chosen expert.
    #[must_use]
    pub fn with_expert(&self, expert: ExpertRef) -> Self {
        let mut next = self.clone();
        next.expert = Some(expert);
        next
    }

    /// Records price components.
    ///
    /// # Errors
    ///
    /// [`DraftError::NegativeAmount`] when any component is below zero.
    pub fn with_pricing(&self, pricing: Pricing) -> Result<Self, DraftError> {
        if pricing.base_price < 0.0 {
            return Err(DraftError::NegativeAmount {
                field: "base price",
            });
        }
        if pricing.materials_cost < 0.0 {
            return Err(DraftError::NegativeAmount {
                field: "materials cost",
            });
        }
        if pricing.discount < 0.0 {
            return Err(DraftError::NegativeAmount { field: "discount" });
        }
        let mut next = self.clone();
        next.pricing = pricing;
        Ok(next)
    }

    /// Service-step slice check: category chosen and problem described.
    ///
    /// # Errors
    ///
    /// See [`DraftError`].
    pub fn validate_service(&self) -> Result<(), DraftError> {
        if self.category.is_none() {
            return Err(DraftError::MissingCategory);
        }
        match self.description.as_deref() {
            Some(d) if !d.trim().is_empty() => Ok(()),
            _ => Err(DraftError::EmptyDescription),
        }
    }

    /// Location-step slice check: an address is present.
    ///
    /// # Errors
    ///
    /// See [`DraftError`].
    pub fn validate_location(&self) -> Result<(), DraftError> {
        match self.address.as_deref() {
            Some(a) if !a.trim().is_empty() => Ok(()),
            _ => Err(DraftError::EmptyAddress),
        }
    }

    /// Scheduling-step slice check, re-anchored to `today` so a draft set
    /// up yesterday is re-checked against the current range.
    ///
    /// # Errors
    ///
    /// See [`DraftError`].
    pub fn validate_schedule(&self, today: NaiveDate) -> Result<(), DraftError> {
        let date = self.preferred_date.ok_or(DraftError::MissingDate)?;
        check_date_in_range(date, today)?;
        if !self.flexible && self.preferred_time.is_none() {
            return Err(DraftError::MissingTimeWindow);
        }
        Ok(())
    }

    /// Expert-step slice check: an expert has been chosen.
    ///
    /// # Errors
    ///
    /// See [`DraftError`].
    pub fn validate_expert(&self) -> Result<(), DraftError> {
        if self.expert.is_none() {
            return Err(DraftError::MissingExpert);
        }
        Ok(())
    }

    /// The submission invariant: category, description, address, date,
    /// window-or-flexible, and expert are all present.
    ///
    /// # Errors
    ///
    /// The first [`DraftError`] encountered, in step order.
    pub fn submission_ready(&self, today: NaiveDate) -> Result<(), DraftError> {
        self.validate_service()?;
        self.validate_location()?;
        self.validate_schedule(today)?;
        self.validate_expert()
    }

    /// Packages the draft into the create-booking body.
    ///
    /// # Errors
    ///
    /// Any [`DraftError`] from [`BookingDraft::submission_ready`].
    pub fn into_request(self, today: NaiveDate) -> Result<BookingRequest, DraftError> {
        self.submission_ready(today)?;
        let category = self.category.ok_or(DraftError::MissingCategory)?;
        let description = self.description.ok_or(DraftError::EmptyDescription)?;
        let address = self.address.ok_or(DraftError::EmptyAddress)?;
        let preferred_date = self.preferred_date.ok_or(DraftError::MissingDate)?;
        let expert = self.expert.ok_or(DraftError::MissingExpert)?;
        Ok(BookingRequest {
            service: ServiceDetails {
                category,
                subcategory: self.subcategory,
                description,
                urgency: self.urgency,
                estimated_duration: None,
            },
            location: ServiceLocation {
                address,
                coordinates: self.coordinates,
                landmark: self.landmark,
                access_instructions: self.access_instructions,
            },
            scheduling: Schedule::new(preferred_date, self.preferred_time, self.flexible),
            expert: expert.id,
            pricing: self.pricing,
        })
    }

    #[must_use]
    pub fn category(&self) -> Option<ServiceCategory> {
        self.category
    }

    #[must_use]
    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.coordinates
    }

    #[must_use]
    pub fn landmark(&self) -> Option<&str> {
        self.landmark.as_deref()
    }

    #[must_use]
    pub fn access_instructions(&self) -> Option<&str> {
        self.access_instructions.as_deref()
    }

    #[must_use]
    pub fn preferred_date(&self) -> Option<NaiveDate> {
        self.preferred_date
    }

    #[must_use]
    pub fn preferred_time(&self) -> Option<TimeWindow> {
        self.preferred_time
    }

    #[must_use]
    pub fn flexible(&self) -> bool {
        self.flexible
    }

    #[must_use]
    pub fn expert(&self) -> Option<&ExpertRef> {
        self.expert.as_ref()
    }

    #[must_use]
    pub fn pricing(&self) -> Pricing {
        self.pricing
    }
}

fn check_date_in_range(date: NaiveDate, today: NaiveDate) -> Result<(), DraftError> {
    let earliest = today + Days::new(1);
    let latest = today + Days::new(BOOKING_HORIZON_DAYS);
    if date < earliest {
        return Err(DraftError::DateTooSoon { date, earliest });
    }
    if date > latest {
        return Err(DraftError::DateTooFar { date, latest });
    }
    Ok(())
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Body of `POST /bookings`. The expert travels as a bare id; the server
/// joins the profile back in on reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service: ServiceDetails,
    pub location: ServiceLocation,
    pub scheduling: Schedule,
    pub expert: String,
    pub pricing: Pricing,
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
