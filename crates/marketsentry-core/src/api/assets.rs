use super::{segment, ApiClient};
use crate::domain::{Alert, AlertRequest, Asset, AssetRequest};
use crate::pagination::{AssetQuery, Page, PageFuture, PageQuery, PageSource, PagedQuery};
use crate::ApiError;

const ASSETS: &str = "/v1/assets";

/// `/v1/assets` endpoints, including the per-asset alert collection.
#[derive(Clone)]
pub struct AssetsApi {
    client: ApiClient,
}

impl AssetsApi {
    pub(super) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &AssetQuery) -> Result<Page<Asset>, ApiError> {
        self.client.get_page(ASSETS, &query.to_pairs()).await
    }

    pub async fn get(&self, asset_id: &str) -> Result<Asset, ApiError> {
        let path = format!("{ASSETS}/{}", segment(asset_id));
        Ok(self.client.get(&path, &Vec::new()).await?.data)
    }

    pub async fn create(&self, request: &AssetRequest) -> Result<Asset, ApiError> {
        Ok(self.client.post(ASSETS, request).await?.data)
    }

    pub async fn update(&self, asset_id: &str, request: &AssetRequest) -> Result<Asset, ApiError> {
        let path = format!("{ASSETS}/{}", segment(asset_id));
        Ok(self.client.put(&path, request).await?.data)
    }

    pub async fn delete(&self, asset_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{ASSETS}/{}", segment(asset_id)))
            .await
    }

    pub async fn alerts(&self, asset_id: &str, query: &PageQuery) -> Result<Page<Alert>, ApiError> {
        let path = format!("{ASSETS}/{}/alerts", segment(asset_id));
        self.client.get_page(&path, &query.to_pairs()).await
    }

    pub async fn create_alert(
        &self,
        asset_id: &str,
        request: &AlertRequest,
    ) -> Result<Alert, ApiError> {
        let path = format!("{ASSETS}/{}/alerts", segment(asset_id));
        Ok(self.client.post(&path, request).await?.data)
    }

    /// Page source over one asset's alerts.
    pub fn alerts_of(&self, asset_id: impl Into<String>) -> AssetAlerts {
        AssetAlerts {
            assets: self.clone(),
            asset_id: asset_id.into(),
        }
    }
}

impl PageSource for AssetsApi {
    type Query = AssetQuery;
    type Item = Asset;

    fn fetch_page<'a>(&'a self, query: &'a AssetQuery) -> PageFuture<'a, Asset> {
        Box::pin(self.list(query))
    }
}

/// Alerts attached to a single asset.
pub struct AssetAlerts {
    assets: AssetsApi,
    asset_id: String,
}

impl PageSource for AssetAlerts {
    type Query = PageQuery;
    type Item = Alert;

    fn fetch_page<'a>(&'a self, query: &'a PageQuery) -> PageFuture<'a, Alert> {
        Box::pin(self.assets.alerts(&self.asset_id, query))
    }
}
