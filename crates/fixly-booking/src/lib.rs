//! The five-step booking flow: a linear wizard that walks a
//! [`fixly_core::BookingDraft`] through service, location, schedule,
//! expert, and review, then submits it through the API client.

pub mod wizard;

pub use wizard::{BookingWizard, SubmitFailure, WizardError, WizardStep};
