use chrono::NaiveDate;
use thiserror::Error;

use fixly_api::{ApiClient, ApiError};
use fixly_core::{
    Booking, BookingDraft, DraftError, ExpertProfile, ExpertRef, GeoPoint, Pricing,
    ServiceCategory, TimeWindow, Urgency,
};

/// How many directory entries the expert step shows per page.
const EXPERT_PAGE_SIZE: u32 = 20;

/// The five stations of the booking flow, walked strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Service,
    Location,
    Schedule,
    Expert,
    Review,
}

impl WizardStep {
    /// Every step in walking order, for progress displays.
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Service,
        WizardStep::Location,
        WizardStep::Schedule,
        WizardStep::Expert,
        WizardStep::Review,
    ];

    /// One-based position shown in the progress header.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Service => 1,
            WizardStep::Location => 2,
            WizardStep::Schedule => 3,
            WizardStep::Expert => 4,
            WizardStep::Review => 5,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Service => "Service",
            WizardStep::Location => "Location",
            WizardStep::Schedule => "Date & Time",
            WizardStep::Expert => "Expert",
            WizardStep::Review => "Review",
        }
    }

    /// Short prompt shown under the title.
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            WizardStep::Service => "Choose service type",
            WizardStep::Location => "Where do you need service?",
            WizardStep::Schedule => "When should we come?",
            WizardStep::Expert => "Choose your expert",
            WizardStep::Review => "Confirm and pay",
        }
    }

    fn forward(self) -> Option<Self> {
        match self {
            WizardStep::Service => Some(WizardStep::Location),
            WizardStep::Location => Some(WizardStep::Schedule),
            WizardStep::Schedule => Some(WizardStep::Expert),
            WizardStep::Expert => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    fn backward(self) -> Option<Self> {
        match self {
            WizardStep::Service => None,
            WizardStep::Location => Some(WizardStep::Service),
            WizardStep::Schedule => Some(WizardStep::Location),
            WizardStep::Expert => Some(WizardStep::Schedule),
            WizardStep::Review => Some(WizardStep::Expert),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// What stopped the wizard.
#[derive(Debug, Error)]
pub enum WizardError {
    /// The current step's rules rejected the draft; nothing moved.
    #[error(transparent)]
    Validation(#[from] DraftError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("the review step is the last one")]
    AtReview,
    #[error("submission is only available from the review step, not {step}")]
    NotAtReview { step: WizardStep },
}

/// A rejected submission. The wizard rides back with the error so the
/// caller can fix whatever went wrong and retry without re-entering the
/// earlier steps.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SubmitFailure {
    pub wizard: BookingWizard,
    #[source]
    pub error: WizardError,
}

/// Drives a [`BookingDraft`] through the five booking steps.
///
/// Setters record data for their step and `next` gates the walk: it
/// checks only the current step's rules and on failure moves nothing,
/// so the wizard never holds a position its draft has not earned.
/// Everything before [`BookingWizard::submit`] is local; the expert
/// lookup on step four is the only other network call and it is
/// read-only.
#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: WizardStep,
    draft: BookingDraft,
}

impl Default for BookingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingWizard {
    /// Opens the flow at the service step with an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: WizardStep::Service,
            draft: BookingDraft::new(),
        }
    }

    /// Shortcut for booking straight from an expert's profile page: the
    /// expert and their trade are already decided, so the flow opens at
    /// the location step with both seeded.
    ///
    /// # Errors
    ///
    /// [`WizardError::Validation`] when the profile cannot price the
    /// draft, see [`BookingWizard::choose_expert`].
    pub fn for_expert(profile: &ExpertProfile) -> Result<Self, WizardError> {
        let mut wizard = Self::new();
        if let Some(service) = profile.primary_service() {
            wizard.draft = wizard.draft.with_category(service.category);
        }
        wizard.choose_expert(profile)?;
        wizard.step = WizardStep::Location;
        Ok(wizard)
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Records the service step.
    ///
    /// # Errors
    ///
    /// [`WizardError::Validation`] when the description is blank; the
    /// draft keeps its previous value.
    pub fn set_service(
        &mut self,
        category: ServiceCategory,
        subcategory: Option<&str>,
        description: &str,
        urgency: Urgency,
    ) -> Result<(), WizardError> {
        self.draft = self
            .draft
            .with_service(category, subcategory, description, urgency)?;
        Ok(())
    }

    /// Records the location step.
    ///
    /// # Errors
    ///
    /// [`WizardError::Validation`] when the address is blank.
    pub fn set_location(
        &mut self,
        address: &str,
        coordinates: Option<GeoPoint>,
        landmark: Option<&str>,
        access_instructions: Option<&str>,
    ) -> Result<(), WizardError> {
        self.draft = self
            .draft
            .with_location(address, coordinates, landmark, access_instructions)?;
        Ok(())
    }

    /// Records the scheduling step, anchored to `today`.
    ///
    /// # Errors
    ///
    /// [`WizardError::Validation`] when the date falls outside the
    /// bookable range or the window is incomplete.
    pub fn set_schedule(
        &mut self,
        preferred_date: NaiveDate,
        preferred_time: Option<TimeWindow>,
        flexible: bool,
        today: NaiveDate,
    ) -> Result<(), WizardError> {
        self.draft = self
            .draft
            .with_schedule(preferred_date, preferred_time, flexible, today)?;
        Ok(())
    }

    /// Records the chosen expert and prices the draft off their published
    /// hourly rate, zero when the profile lists none. The id is what gets
    /// submitted; the rest of the profile is display data.
    ///
    /// # Errors
    ///
    /// [`WizardError::Validation`] when the published rate is negative.
    pub fn choose_expert(&mut self, profile: &ExpertProfile) -> Result<(), WizardError> {
        let expert = ExpertRef::from_profile(profile);
        let pricing = Pricing {
            base_price: expert.summary.hourly_rate.unwrap_or(0.0),
            materials_cost: 0.0,
            discount: 0.0,
        };
        self.draft = self.draft.with_expert(expert).with_pricing(pricing)?;
        Ok(())
    }

    /// Fetches the expert directory for the draft's trade, filtered by the
    /// service coordinates when the location step captured any. Display
    /// data only, in whatever order the backend chose.
    ///
    /// # Errors
    ///
    /// [`WizardError::Validation`] before the service step has named a
    /// category, otherwise any [`WizardError::Api`] from the lookup.
    pub async fn load_experts(&self, api: &ApiClient) -> Result<Vec<ExpertProfile>, WizardError> {
        let category = self.draft.category().ok_or(DraftError::MissingCategory)?;
        let experts = api
            .experts(category, self.draft.coordinates(), 1, EXPERT_PAGE_SIZE)
            .await?;
        Ok(experts)
    }

    /// Advances one step after checking only the current step's rules.
    /// On failure neither the step nor the draft changes.
    ///
    /// # Errors
    ///
    /// [`WizardError::Validation`] with the first rule the step breaks,
    /// or [`WizardError::AtReview`] when there is nowhere left to go.
    pub fn next(&mut self, today: NaiveDate) -> Result<WizardStep, WizardError> {
        match self.step {
            WizardStep::Service => self.draft.validate_service()?,
            WizardStep::Location => self.draft.validate_location()?,
            WizardStep::Schedule => self.draft.validate_schedule(today)?,
            WizardStep::Expert => self.draft.validate_expert()?,
            WizardStep::Review => return Err(WizardError::AtReview),
        }
        if let Some(step) = self.step.forward() {
            self.step = step;
        }
        Ok(self.step)
    }

    /// Steps backward without validation. Nothing entered so far is lost;
    /// at the first step this is a no-op.
    pub fn back(&mut self) -> WizardStep {
        if let Some(step) = self.step.backward() {
            self.step = step;
        }
        self.step
    }

    /// Submits the draft, the only write in the whole flow. Success
    /// consumes the wizard and returns the created booking; failure hands
    /// the wizard back still on the review step with the draft intact.
    ///
    /// # Errors
    ///
    /// [`SubmitFailure`] carrying [`WizardError::NotAtReview`] when called
    /// early, a [`WizardError::Validation`] when the re-checked draft is
    /// incomplete, or the [`WizardError::Api`] from the backend.
    pub async fn submit(self, api: &ApiClient, today: NaiveDate) -> Result<Booking, SubmitFailure> {
        if self.step != WizardStep::Review {
            let step = self.step;
            return Err(SubmitFailure {
                wizard: self,
                error: WizardError::NotAtReview { step },
            });
        }
        let request = match self.draft.clone().into_request(today) {
            Ok(request) => request,
            Err(error) => {
                return Err(SubmitFailure {
                    wizard: self,
                    error: error.into(),
                });
            }
        };
        match api.create_booking(&request).await {
            Ok(booking) => {
                tracing::info!(booking_id = %booking.id, "booking created");
                Ok(booking)
            }
            Err(error) => Err(SubmitFailure {
                wizard: self,
                error: error.into(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "wizard_test.rs"]
mod tests;
