use serde::{Deserialize, Serialize};

/// Notification record served by `/v1/notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub created_at: i64,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
}

/// Payload of `/v1/notifications/count-unread`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "total", alias = "count_unread")]
    pub count: u64,
}
