use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::ApiClient;
use crate::session::{RefreshOutcome, REFRESH_PATH};
use crate::token_store::TokenPair;
use crate::{ApiError, CoreError};

/// Sign-in payload.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up payload.
#[derive(Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// `/v1/auth/*` endpoints.
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub(super) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Creates an account; the response carries no tokens.
    pub async fn register(&self, registration: &Registration) -> Result<Value, ApiError> {
        let response = self.client.post("/v1/auth/sign-up", registration).await?;
        info!("account registered");
        Ok(response.data)
    }

    /// Signs in and installs the issued tokens as the current session.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), CoreError> {
        let response = self
            .client
            .post::<_, TokenPair>("/v1/auth/sign-in", credentials)
            .await?;

        if !response.data.is_usable() {
            return Err(ApiError::decode("sign-in response carried an empty access token").into());
        }

        self.client.session().establish(response.data).await?;
        Ok(())
    }

    /// Renews the access token with the stored refresh token.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        match self.client.session().force_refresh().await {
            RefreshOutcome::Refreshed(_) => Ok(()),
            RefreshOutcome::Expired => Err(ApiError::session_expired(format!(
                "{REFRESH_PATH} did not issue a new token, please log in again"
            ))),
        }
    }

    pub async fn logout(&self) {
        self.client.session().logout().await;
    }
}
