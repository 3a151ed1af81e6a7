//! # REST API Client
//!
//! [`ApiClient`] is the single path for outbound REST calls. It attaches the
//! bearer token, recognises the refresh-eligible error code, asks the
//! [`SessionManager`] for a newer token and replays the request once.
//!
//! | Response | Action |
//! |----------|--------|
//! | 2xx | decode `{ status, data, meta? }` |
//! | error body with the expiry code | refresh (single-flight), replay once |
//! | expiry code on the replay | end session, `SessionExpired` |
//! | 401 without the expiry code | end session, `Unauthorized` |
//! | anything else | `Rejected`/`NotFound` with server message or fallback |

mod alerts;
mod assets;
mod auth;
mod notifications;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::envelope::{ApiResponse, ErrorBody};
use crate::http_client::{
    append_query, HttpAuth, HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
use crate::pagination::{Page, QueryPairs};
use crate::session::{LogoutReason, RefreshOutcome, SessionManager};
use crate::token_store::FileTokenStore;
use crate::{ApiError, StoreError};

pub use alerts::AlertsApi;
pub use assets::AssetsApi;
pub use auth::{AuthApi, Credentials, Registration};
pub use notifications::NotificationsApi;

/// Replays allowed after a silent refresh.
const MAX_AUTH_RETRIES: u8 = 1;

const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again";

/// How a response relates to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthSignal {
    Expired,
    Unauthorized(Option<String>),
    Clear,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    session: Arc<SessionManager>,
    base_url: String,
    timeout_ms: u64,
    expired_code: String,
}

impl ApiClient {
    pub fn new(http: Arc<dyn HttpClient>, session: Arc<SessionManager>, settings: &Settings) -> Self {
        Self {
            http,
            session,
            base_url: settings.api_url.trim_end_matches('/').to_owned(),
            timeout_ms: settings.timeout_ms,
            expired_code: settings.expired_code.clone(),
        }
    }

    /// Reqwest transport with the session file named in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, StoreError> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
        let store = Arc::new(FileTokenStore::new(&settings.session_file));
        let session = SessionManager::new(
            Arc::clone(&http),
            store,
            &settings.api_url,
            settings.timeout_ms,
        )?;
        Ok(Self::new(http, Arc::new(session), settings))
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn assets(&self) -> AssetsApi {
        AssetsApi::new(self.clone())
    }

    pub fn alerts(&self) -> AlertsApi {
        AlertsApi::new(self.clone())
    }

    pub fn notifications(&self) -> NotificationsApi {
        NotificationsApi::new(self.clone())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryPairs,
    ) -> Result<ApiResponse<T>, ApiError> {
        let url = append_query(&self.url(path), query);
        let response = self.send(HttpMethod::Get, url, None).await?;
        decode(&response)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        let body = encode(body)?;
        let response = self.send(HttpMethod::Post, self.url(path), Some(body)).await?;
        decode(&response)
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        let body = encode(body)?;
        let response = self.send(HttpMethod::Put, self.url(path), Some(body)).await?;
        decode(&response)
    }

    /// Deletes a resource; whatever `data` the server returns is discarded.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(HttpMethod::Delete, self.url(path), None).await?;
        Ok(())
    }

    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryPairs,
    ) -> Result<Page<T>, ApiError> {
        let response: ApiResponse<Vec<T>> = self.get(path, query).await?;
        Ok(Page {
            items: response.data,
            meta: response.meta,
        })
    }

    /// Sends one logical request, replaying it at most once after a refresh.
    async fn send(
        &self,
        method: HttpMethod,
        url: String,
        body: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let mut token = self.session.access_token().await;
        let mut replays = 0u8;

        loop {
            let request = self.build(method, &url, body.as_deref(), token.as_deref());
            debug!(method = method.as_str(), url = %url, replay = replays, "sending request");

            let response = self
                .http
                .execute(request)
                .await
                .map_err(|error| ApiError::transport(error.message(), error.retryable()))?;

            match self.classify(&response) {
                AuthSignal::Clear => return into_result(response),
                AuthSignal::Unauthorized(message) => {
                    warn!(status = response.status, "request unauthorized; ending session");
                    self.session.end(LogoutReason::Unauthorized).await;
                    return Err(ApiError::unauthorized(
                        message.unwrap_or_else(|| String::from("Unauthorized")),
                    ));
                }
                AuthSignal::Expired if replays >= MAX_AUTH_RETRIES => {
                    warn!("token rejected again after refresh; ending session");
                    self.session.end(LogoutReason::RefreshFailed).await;
                    return Err(ApiError::session_expired(SESSION_EXPIRED_MESSAGE));
                }
                AuthSignal::Expired => {
                    replays += 1;
                    match self.session.refresh_after(token.as_deref()).await {
                        RefreshOutcome::Refreshed(fresh) => token = Some(fresh),
                        RefreshOutcome::Expired => {
                            return Err(ApiError::session_expired(SESSION_EXPIRED_MESSAGE));
                        }
                    }
                }
            }
        }
    }

    fn build(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
        token: Option<&str>,
    ) -> HttpRequest {
        let auth = match token {
            Some(token) => HttpAuth::BearerToken(token.to_owned()),
            None => HttpAuth::None,
        };
        let mut request = HttpRequest::new(method, url)
            .with_header("accept", "application/json")
            .with_auth(&auth)
            .with_timeout_ms(self.timeout_ms);
        if let Some(body) = body {
            request = request.with_json_body(body);
        }
        request
    }

    fn classify(&self, response: &HttpResponse) -> AuthSignal {
        if response.is_success() {
            return AuthSignal::Clear;
        }

        let body = ErrorBody::parse(&response.body);
        if body.has_code(&self.expired_code) {
            AuthSignal::Expired
        } else if response.status == 401 {
            AuthSignal::Unauthorized(body.message)
        } else {
            AuthSignal::Clear
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn into_result(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    let body = ErrorBody::parse(&response.body);
    Err(ApiError::rejected(response.status, body.message))
}

fn encode<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|error| ApiError::invalid_request(error.to_string()))
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<ApiResponse<T>, ApiError> {
    serde_json::from_str(&response.body)
        .map_err(|error| ApiError::decode(format!("unexpected response body: {error}")))
}

/// Percent-encodes a path segment such as a resource id.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id.trim()).into_owned()
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::HttpError;
    use crate::token_store::{MemoryTokenStore, TokenPair};

    struct Recorder {
        responses: Mutex<Vec<HttpResponse>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl HttpClient for Recorder {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.seen.lock().expect("lock").push(request);
            let next = self.responses.lock().expect("lock").remove(0);
            Box::pin(async move { Ok(next) })
        }
    }

    fn client(responses: Vec<HttpResponse>) -> (ApiClient, Arc<Recorder>) {
        let http = Arc::new(Recorder {
            responses: Mutex::new(responses),
            seen: Mutex::new(Vec::new()),
        });
        let settings = Settings::default();
        let store = MemoryTokenStore::with_tokens(TokenPair::new("a1", Some(String::from("r1"))));
        let session = SessionManager::new(
            http.clone(),
            Arc::new(store),
            &settings.api_url,
            settings.timeout_ms,
        )
        .expect("session");
        (ApiClient::new(http.clone(), Arc::new(session), &settings), http)
    }

    #[tokio::test]
    async fn attaches_bearer_token_and_builds_url() {
        let (api, http) = client(vec![HttpResponse::ok_json(r#"{"status":"success","data":1}"#)]);

        let response: ApiResponse<u32> = api
            .get("/v1/assets", &vec![("page", Some(String::from("1")))])
            .await
            .expect("success");

        assert_eq!(response.data, 1);
        let seen = http.seen.lock().expect("lock");
        assert_eq!(seen[0].bearer_token(), Some("a1"));
        assert_eq!(seen[0].url, format!("{}/v1/assets?page=1", Settings::default().api_url));
    }

    #[tokio::test]
    async fn server_error_message_is_surfaced() {
        let (api, _) = client(vec![HttpResponse::new(
            422,
            r#"{"status":"error","message":"value must be positive"}"#,
        )]);

        let error = api
            .get::<u32>("/v1/alerts", &Vec::new())
            .await
            .expect_err("rejected");

        assert_eq!(error.message(), "value must be positive");
        assert_eq!(error.status(), Some(422));
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_decode_error() {
        let (api, _) = client(vec![HttpResponse::ok_json("not json")]);

        let error = api
            .get::<u32>("/v1/alerts", &Vec::new())
            .await
            .expect_err("decode");

        assert_eq!(error.kind(), crate::ApiErrorKind::Decode);
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(segment(" a/b "), "a%2Fb");
    }
}
