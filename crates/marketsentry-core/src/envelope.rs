use serde::{Deserialize, Serialize};

/// Standard `{ status, data, meta? }` body returned by every API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub status: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub prev_page: Option<u32>,
    pub total_pages: u32,
    pub total_count: u64,
}

impl PageMeta {
    pub const fn is_first(&self) -> bool {
        self.current_page <= 1
    }

    pub const fn is_last(&self) -> bool {
        self.current_page >= self.total_pages
    }
}

/// Error body; servers disagree on field names so every known alias is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "error_code")]
    pub code: Option<String>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Lenient parse; anything that is not a JSON object yields an empty body.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_list_envelope_with_meta() {
        let response: ApiResponse<Vec<u32>> = serde_json::from_str(
            r#"{"status":"success","data":[1,2],
                "meta":{"current_page":1,"next_page":2,"prev_page":null,"total_pages":3,"total_count":42}}"#,
        )
        .expect("envelope should decode");

        let meta = response.meta.expect("meta present");
        assert!(meta.is_first());
        assert!(!meta.is_last());
        assert_eq!(meta.next_page, Some(2));
        assert_eq!(meta.prev_page, None);
    }

    #[test]
    fn error_body_accepts_aliases() {
        let body = ErrorBody::parse(r#"{"error_code":"token_expired","error":"jwt expired"}"#);
        assert!(body.has_code("TOKEN_EXPIRED"));
        assert_eq!(body.message.as_deref(), Some("jwt expired"));
    }

    #[test]
    fn error_body_tolerates_non_json() {
        let body = ErrorBody::parse("<html>bad gateway</html>");
        assert_eq!(body, ErrorBody::default());
    }
}
