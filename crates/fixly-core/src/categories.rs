use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of service categories the marketplace offers.
///
/// The backend identifies categories by their lowercase wire slug (e.g.
/// `"plumber"`). Display metadata lives here as exhaustive matches so that
/// adding a variant is a compile error until every lookup handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Plumber,
    Electrician,
    Carpenter,
    Painter,
    Cleaner,
    Mechanic,
    Technician,
    Cook,
    Gardener,
    Other,
}

impl ServiceCategory {
    /// Every category, in storefront display order.
    pub const ALL: [ServiceCategory; 10] = [
        ServiceCategory::Plumber,
        ServiceCategory::Electrician,
        ServiceCategory::Carpenter,
        ServiceCategory::Painter,
        ServiceCategory::Cleaner,
        ServiceCategory::Mechanic,
        ServiceCategory::Technician,
        ServiceCategory::Cook,
        ServiceCategory::Gardener,
        ServiceCategory::Other,
    ];

    /// Human-readable trade name shown in pickers and summaries.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ServiceCategory::Plumber => "Plumbing",
            ServiceCategory::Electrician => "Electrical",
            ServiceCategory::Carpenter => "Carpentry",
            ServiceCategory::Painter => "Painting",
            ServiceCategory::Cleaner => "Cleaning",
            ServiceCategory::Mechanic => "Mechanic",
            ServiceCategory::Technician => "Technician",
            ServiceCategory::Cook => "Cooking",
            ServiceCategory::Gardener => "Gardening",
            ServiceCategory::Other => "Other",
        }
    }

    /// Emoji marker used next to the label in terminal output.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            ServiceCategory::Plumber => "🚰",
            ServiceCategory::Electrician => "⚡",
            ServiceCategory::Carpenter => "🔨",
            ServiceCategory::Painter => "🎨",
            ServiceCategory::Cleaner => "🧹",
            ServiceCategory::Mechanic => "🔧",
            ServiceCategory::Technician => "💻",
            ServiceCategory::Cook => "👨‍🍳",
            ServiceCategory::Gardener => "🌱",
            ServiceCategory::Other => "🛠️",
        }
    }

    /// Lowercase identifier used on the wire and in query parameters.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            ServiceCategory::Plumber => "plumber",
            ServiceCategory::Electrician => "electrician",
            ServiceCategory::Carpenter => "carpenter",
            ServiceCategory::Painter => "painter",
            ServiceCategory::Cleaner => "cleaner",
            ServiceCategory::Mechanic => "mechanic",
            ServiceCategory::Technician => "technician",
            ServiceCategory::Cook => "cook",
            ServiceCategory::Gardener => "gardener",
            ServiceCategory::Other => "other",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error returned when a string does not name a known category.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown service category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ServiceCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// How soon the customer needs the work done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Emergency,
}

impl Urgency {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Urgency::Low => "Low Priority",
            Urgency::Medium => "Medium Priority",
            Urgency::High => "High Priority",
            Urgency::Emergency => "Emergency",
        }
    }

    /// Expectation text shown under the label in the urgency picker.
    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            Urgency::Low => "Schedule at your convenience",
            Urgency::Medium => "Within a few days",
            Urgency::High => "As soon as possible",
            Urgency::Emergency => "Immediate attention needed",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => f.write_str("low"),
            Urgency::Medium => f.write_str("medium"),
            Urgency::High => f.write_str("high"),
            Urgency::Emergency => f.write_str("emergency"),
        }
    }
}

impl FromStr for Urgency {
    type Err = UnknownUrgency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "emergency" => Ok(Urgency::Emergency),
            other => Err(UnknownUrgency(other.to_string())),
        }
    }
}

/// Error returned when a string does not name a known urgency level.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown urgency level: {0}")]
pub struct UnknownUrgency(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_round_trips_through_its_slug() {
        for category in ServiceCategory::ALL {
            let parsed: ServiceCategory = category.slug().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<&str> = ServiceCategory::ALL.iter().map(|c| c.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), ServiceCategory::ALL.len());
    }

    #[test]
    fn unknown_slug_is_rejected() {
        let err = "locksmith".parse::<ServiceCategory>().unwrap_err();
        assert_eq!(err, UnknownCategory("locksmith".to_string()));
    }

    #[test]
    fn category_serializes_as_lowercase_slug() {
        let json = serde_json::to_string(&ServiceCategory::Electrician).unwrap();
        assert_eq!(json, "\"electrician\"");
    }

    #[test]
    fn category_deserializes_from_wire_slug() {
        let category: ServiceCategory = serde_json::from_str("\"cook\"").unwrap();
        assert_eq!(category, ServiceCategory::Cook);
    }

    #[test]
    fn every_category_has_display_metadata() {
        for category in ServiceCategory::ALL {
            assert!(!category.label().is_empty());
            assert!(!category.glyph().is_empty());
        }
    }

    #[test]
    fn urgency_defaults_to_medium() {
        assert_eq!(Urgency::default(), Urgency::Medium);
    }

    #[test]
    fn urgency_round_trips_through_display() {
        for urgency in [
            Urgency::Low,
            Urgency::Medium,
            Urgency::High,
            Urgency::Emergency,
        ] {
            let parsed: Urgency = urgency.to_string().parse().unwrap();
            assert_eq!(parsed, urgency);
        }
    }

    #[test]
    fn urgency_serializes_as_lowercase() {
        let json = serde_json::to_string(&Urgency::Emergency).unwrap();
        assert_eq!(json, "\"emergency\"");
    }
}
