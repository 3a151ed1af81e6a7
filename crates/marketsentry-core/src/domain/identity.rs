use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

use crate::ValidationError;

const MAX_IDENTITY_LEN: usize = 64;

/// Lowercase key correlating an asset row with price-feed updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetIdentity(String);

impl AssetIdentity {
    /// Parse and normalize an identity to lowercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField { field: "identity" });
        }

        let normalized = trimmed.to_lowercase();
        let len = normalized.chars().count();
        if len > MAX_IDENTITY_LEN {
            return Err(ValidationError::IdentityTooLong {
                len,
                max: MAX_IDENTITY_LEN,
            });
        }

        for (index, ch) in normalized.chars().enumerate() {
            if ch.is_whitespace() || ch.is_control() {
                return Err(ValidationError::IdentityInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    /// Trims and lowercases without rejecting anything. Used for identities
    /// the server already owns, which must not fail a whole page.
    pub fn normalize(input: &str) -> Self {
        Self(input.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `deserialize_with` helper for server records.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<AssetIdentity, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|raw| AssetIdentity::normalize(&raw))
}

impl Display for AssetIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Borrow<str> for AssetIdentity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AssetIdentity {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for AssetIdentity {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AssetIdentity> for String {
    fn from(value: AssetIdentity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_lowercases_identity() {
        let parsed = AssetIdentity::parse(" BTC ").expect("identity should parse");
        assert_eq!(parsed.as_str(), "btc");
    }

    #[test]
    fn rejects_embedded_whitespace() {
        let err = AssetIdentity::parse("bit coin").expect_err("must fail");
        assert!(matches!(err, ValidationError::IdentityInvalidChar { ch: ' ', index: 3 }));
    }

    #[test]
    fn normalize_keeps_what_parse_would_reject() {
        let identity = AssetIdentity::normalize(" Bit Coin ");
        assert_eq!(identity.as_str(), "bit coin");
    }

    #[test]
    fn rejects_empty_identity() {
        let err = AssetIdentity::parse("  ").expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptyField { field: "identity" }));
    }
}
