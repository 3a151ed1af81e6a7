use super::{segment, ApiClient};
use crate::domain::{Alert, AlertRequest};
use crate::pagination::{Page, PageFuture, PageQuery, PageSource, PagedQuery};
use crate::ApiError;

const ALERTS: &str = "/v1/alerts";

/// `/v1/alerts` endpoints. Alerts are created through
/// [`super::AssetsApi::create_alert`].
pub struct AlertsApi {
    client: ApiClient,
}

impl AlertsApi {
    pub(super) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<Alert>, ApiError> {
        self.client.get_page(ALERTS, &query.to_pairs()).await
    }

    pub async fn get(&self, alert_id: &str) -> Result<Alert, ApiError> {
        let path = format!("{ALERTS}/{}", segment(alert_id));
        Ok(self.client.get(&path, &Vec::new()).await?.data)
    }

    pub async fn update(&self, alert_id: &str, request: &AlertRequest) -> Result<Alert, ApiError> {
        let path = format!("{ALERTS}/{}", segment(alert_id));
        Ok(self.client.put(&path, request).await?.data)
    }

    pub async fn delete(&self, alert_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{ALERTS}/{}", segment(alert_id)))
            .await
    }
}

impl PageSource for AlertsApi {
    type Query = PageQuery;
    type Item = Alert;

    fn fetch_page<'a>(&'a self, query: &'a PageQuery) -> PageFuture<'a, Alert> {
        Box::pin(self.list(query))
    }
}
