use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How severe an emergency alert is.
///
/// `Sos` reaches every nearby expert immediately; `General` files a
/// normal-priority assistance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyType {
    Sos,
    General,
}

impl EmergencyType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EmergencyType::Sos => "sos",
            EmergencyType::General => "general",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EmergencyType::Sos => "SOS",
            EmergencyType::General => "General assistance",
        }
    }
}

impl fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown emergency type '{0}', expected 'sos' or 'general'")]
pub struct UnknownEmergencyType(pub String);

impl FromStr for EmergencyType {
    type Err = UnknownEmergencyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sos" => Ok(EmergencyType::Sos),
            "general" => Ok(EmergencyType::General),
            other => Err(UnknownEmergencyType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EmergencyType::Sos).unwrap(),
            "\"sos\""
        );
        assert_eq!(
            serde_json::to_string(&EmergencyType::General).unwrap(),
            "\"general\""
        );
    }

    #[test]
    fn parses_from_str_and_rejects_unknown() {
        assert_eq!("sos".parse::<EmergencyType>().unwrap(), EmergencyType::Sos);
        assert_eq!(
            "panic".parse::<EmergencyType>().unwrap_err(),
            UnknownEmergencyType("panic".to_string())
        );
    }
}
