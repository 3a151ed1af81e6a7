use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// Instant held in UTC; input with another offset is converted on parse.
///
/// Serialized as RFC3339 with a `Z` suffix, the form the alert endpoints
/// expect for `expiration_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Accepts any RFC3339 offset, so `2026-06-01T09:00:00+07:00` becomes
    /// `2026-06-01T02:00:00Z`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        OffsetDateTime::parse(input.trim(), &Rfc3339)
            .map(|at| Self(at.to_offset(UtcOffset::UTC)))
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: input.to_owned(),
            })
    }

    /// Out-of-range epochs yield `None`.
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds).ok().map(Self)
    }

    pub const fn unix_seconds(self) -> i64 {
        self.0.unix_timestamp()
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl TryFrom<String> for UtcDateTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UtcDateTime> for String {
    fn from(value: UtcDateTime) -> Self {
        value.format_rfc3339()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_normalized_to_utc() {
        let at = UtcDateTime::parse("2026-06-01T09:00:00+07:00").expect("offset input");
        assert_eq!(at.to_string(), "2026-06-01T02:00:00Z");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = UtcDateTime::parse("next tuesday").expect_err("not a timestamp");
        assert!(matches!(err, ValidationError::InvalidTimestamp { .. }));
    }

    #[test]
    fn epoch_seconds_round_out_to_the_same_instant() {
        let at = UtcDateTime::from_unix_seconds(1_735_689_600).expect("in range");
        assert_eq!(at.format_rfc3339(), "2025-01-01T00:00:00Z");
        assert_eq!(at.unix_seconds(), 1_735_689_600);
    }

    #[test]
    fn serializes_with_z_suffix() {
        let at = UtcDateTime::parse("2030-01-01T00:00:00Z").expect("utc");
        assert_eq!(
            serde_json::to_string(&at).expect("serializes"),
            "\"2030-01-01T00:00:00Z\""
        );
    }
}
