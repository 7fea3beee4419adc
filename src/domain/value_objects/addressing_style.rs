use crate::domain::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Where the bucket name appears in object URLs.
///
/// `Domain` puts it in the host (`https://bucket.host/key`), `Path` in the
/// first path segment (`https://host/bucket/key`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingStyle {
    Domain,
    Path,
}

impl Default for AddressingStyle {
    fn default() -> Self {
        AddressingStyle::Domain
    }
}

impl std::fmt::Display for AddressingStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressingStyle::Domain => f.write_str("domain"),
            AddressingStyle::Path => f.write_str("path"),
        }
    }
}

impl std::str::FromStr for AddressingStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domain" => Ok(AddressingStyle::Domain),
            "path" => Ok(AddressingStyle::Path),
            _ => Err(ValidationError::UnknownAddressingStyle(s.to_string())),
        }
    }
}
