use std::fmt::{Display, Formatter};

use marketsentry_core::{PaginationControls, UtcDateTime};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Request identifier (UUID v4) stamped on every command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Metadata printed alongside every command result.
///
/// Field order is fixed to keep JSON output stable between runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub generated_at: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationControls>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(latency_ms: u64) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            generated_at: UtcDateTime::now().format_rfc3339(),
            latency_ms,
            pagination: None,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// What the CLI prints: metadata plus the command's data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub meta: Metadata,
    pub data: Value,
    /// Column keys for table output; not part of the JSON document.
    #[serde(skip)]
    pub columns: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        let request_id = RequestId::new_v4();
        assert_eq!(request_id.0.get_version_num(), 4);
    }

    #[test]
    fn empty_optional_meta_is_left_out_of_json() {
        let envelope = Envelope {
            meta: Metadata::new(12),
            data: json!({ "count": 3 }),
            columns: &[],
        };

        let rendered = serde_json::to_value(&envelope).expect("serializes");

        assert_eq!(rendered["meta"]["latency_ms"], 12);
        assert!(rendered["meta"].get("pagination").is_none());
        assert!(rendered["meta"].get("warnings").is_none());
        assert!(rendered.get("columns").is_none());
        assert_eq!(rendered["data"]["count"], 3);
    }
}
