use super::ApiClient;
use crate::domain::{Notification, UnreadCount};
use crate::pagination::{Page, PageFuture, PageQuery, PageSource, PagedQuery};
use crate::ApiError;

/// Read-only `/v1/notifications` endpoints.
pub struct NotificationsApi {
    client: ApiClient,
}

impl NotificationsApi {
    pub(super) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<Notification>, ApiError> {
        self.client
            .get_page("/v1/notifications", &query.to_pairs())
            .await
    }

    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        let response = self
            .client
            .get::<UnreadCount>("/v1/notifications/count-unread", &Vec::new())
            .await?;
        Ok(response.data.count)
    }
}

impl PageSource for NotificationsApi {
    type Query = PageQuery;
    type Item = Notification;

    fn fetch_page<'a>(&'a self, query: &'a PageQuery) -> PageFuture<'a, Notification> {
        Box::pin(self.list(query))
    }
}
