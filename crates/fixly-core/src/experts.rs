use serde::{Deserialize, Serialize};

use crate::categories::ServiceCategory;

/// Public account details attached to an expert profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertUser {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// One trade an expert offers, with their pitch and rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertService {
    pub category: ServiceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Years of experience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpertRating {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl ExpertRating {
    /// Average stars shown in listings, `0.0` for unrated experts.
    #[must_use]
    pub fn stars(self) -> f64 {
        self.average.unwrap_or(0.0)
    }

    /// Number of reviews behind the average.
    #[must_use]
    pub fn reviews(self) -> u32 {
        self.count.unwrap_or(0)
    }
}

/// An expert directory entry as the backend returns it. Display data only;
/// availability and pricing are re-checked server-side at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: ExpertUser,
    #[serde(default)]
    pub services: Vec<ExpertService>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<ExpertRating>,
    #[serde(default)]
    pub is_online: bool,
}

impl ExpertProfile {
    /// The first listed service, treated as the expert's main trade.
    #[must_use]
    pub fn primary_service(&self) -> Option<&ExpertService> {
        self.services.first()
    }
}

/// A booking's `expert` field: the bare id on freshly created bookings,
/// the populated profile once the server joins it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpertField {
    Id(String),
    Profile(Box<ExpertProfile>),
}

impl ExpertField {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            ExpertField::Id(id) => id,
            ExpertField::Profile(profile) => &profile.id,
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<&ExpertProfile> {
        match self {
            ExpertField::Id(_) => None,
            ExpertField::Profile(profile) => Some(profile),
        }
    }
}

/// Denormalized display snapshot carried in a draft next to the expert id.
/// Never authoritative; the server re-reads the profile at submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpertSummary {
    pub name: String,
    pub phone: Option<String>,
    pub category: Option<ServiceCategory>,
    pub hourly_rate: Option<f64>,
    pub rating: f64,
    pub rating_count: u32,
}

/// Weak reference to a chosen expert: the id is what gets submitted, the
/// summary is what gets shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpertRef {
    pub id: String,
    pub summary: ExpertSummary,
}

impl ExpertRef {
    #[must_use]
    pub fn from_profile(profile: &ExpertProfile) -> Self {
        let primary = profile.primary_service();
        let rating = profile.rating.unwrap_or_default();
        Self {
            id: profile.id.clone(),
            summary: ExpertSummary {
                name: profile.user.name.clone(),
                phone: profile.user.phone.clone(),
                category: primary.map(|s| s.category),
                hourly_rate: primary.and_then(|s| s.hourly_rate),
                rating: rating.stars(),
                rating_count: rating.reviews(),
            },
        }
    }
}
