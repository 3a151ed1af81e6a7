//! Session ownership and single-flight token refresh.
//!
//! [`SessionManager`] holds the token pair in memory, persists it through a
//! [`TokenStore`], and serializes refreshes behind one async gate: callers
//! that hit an expired token while another refresh is running wait on the
//! gate and reuse the token it produced instead of refreshing again.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::envelope::{ApiResponse, ErrorBody};
use crate::http_client::{HttpClient, HttpRequest};
use crate::token_store::{TokenPair, TokenStore};
use crate::{ApiError, StoreError};

pub const REFRESH_PATH: &str = "/v1/auth/refresh-token";

/// Result of asking the session for a token newer than the one that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(String),
    Expired,
}

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The refresh call failed or the replayed request was rejected again.
    RefreshFailed,
    /// The server answered with a hard 401.
    Unauthorized,
    /// The stored session had no refresh token to renew with.
    NoRefreshToken,
    UserRequested,
}

impl LogoutReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RefreshFailed => "refresh_failed",
            Self::Unauthorized => "unauthorized",
            Self::NoRefreshToken => "no_refresh_token",
            Self::UserRequested => "user_requested",
        }
    }
}

/// Lifecycle notifications; a `LoggedOut` event is where a front-end sends the
/// user back to login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    LoggedOut(LogoutReason),
}

#[derive(Debug, Serialize)]
struct RefreshTokenRequest<'a> {
    refresh_token: &'a str,
}

/// Owns the token pair and the refresh gate.
pub struct SessionManager {
    http: Arc<dyn HttpClient>,
    store: Arc<dyn TokenStore>,
    refresh_url: String,
    timeout_ms: u64,
    tokens: RwLock<Option<TokenPair>>,
    refresh_gate: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Loads any persisted tokens from `store`.
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn TokenStore>,
        api_base_url: &str,
        timeout_ms: u64,
    ) -> Result<Self, StoreError> {
        let tokens = store.load()?;
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            http,
            store,
            refresh_url: format!("{}{REFRESH_PATH}", api_base_url.trim_end_matches('/')),
            timeout_ms,
            tokens: RwLock::new(tokens),
            refresh_gate: Mutex::new(()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    pub async fn has_refresh_token(&self) -> bool {
        self.tokens
            .read()
            .await
            .as_ref()
            .is_some_and(|tokens| tokens.refresh_token.is_some())
    }

    /// Installs the tokens issued by a successful sign-in.
    pub async fn establish(&self, tokens: TokenPair) -> Result<(), StoreError> {
        self.store.save(&tokens)?;
        *self.tokens.write().await = Some(tokens);
        info!("session established");
        let _ = self.events.send(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Returns a token newer than `stale`, refreshing at most once across
    /// concurrent callers.
    ///
    /// `stale` is the token the failed request carried. If the held token
    /// already differs, another caller refreshed while this one waited and
    /// its token is returned without a new refresh call.
    pub async fn refresh_after(&self, stale: Option<&str>) -> RefreshOutcome {
        let _gate = self.refresh_gate.lock().await;

        let current = self.tokens.read().await.clone();
        let Some(current) = current else {
            debug!("refresh requested without a session");
            return RefreshOutcome::Expired;
        };

        if stale != Some(current.access_token.as_str()) {
            debug!("token already refreshed by a concurrent request");
            return RefreshOutcome::Refreshed(current.access_token);
        }

        let Some(refresh_token) = current.refresh_token.clone() else {
            warn!("access token expired and no refresh token is stored");
            self.end(LogoutReason::NoRefreshToken).await;
            return RefreshOutcome::Expired;
        };

        match self.request_refresh(&refresh_token).await {
            Ok(issued) => {
                let renewed = TokenPair::new(
                    issued.access_token,
                    issued.refresh_token.or(Some(refresh_token)),
                );
                if let Err(error) = self.store.save(&renewed) {
                    warn!(%error, "refreshed tokens could not be persisted");
                }
                let access_token = renewed.access_token.clone();
                *self.tokens.write().await = Some(renewed);
                info!("access token refreshed");
                let _ = self.events.send(SessionEvent::Refreshed);
                RefreshOutcome::Refreshed(access_token)
            }
            Err(error) => {
                warn!(%error, "token refresh failed; ending session");
                self.end(LogoutReason::RefreshFailed).await;
                RefreshOutcome::Expired
            }
        }
    }

    /// Refreshes the currently held token regardless of its age.
    pub async fn force_refresh(&self) -> RefreshOutcome {
        let current = self.access_token().await;
        self.refresh_after(current.as_deref()).await
    }

    /// Drops the tokens from memory and storage and announces the logout.
    pub async fn end(&self, reason: LogoutReason) {
        let had_session = self.tokens.write().await.take().is_some();
        if let Err(error) = self.store.clear() {
            warn!(%error, "stored tokens could not be cleared");
        }
        if had_session {
            info!(reason = reason.as_str(), "session ended");
        }
        let _ = self.events.send(SessionEvent::LoggedOut(reason));
    }

    pub async fn logout(&self) {
        self.end(LogoutReason::UserRequested).await;
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let body = serde_json::to_string(&RefreshTokenRequest { refresh_token })
            .map_err(|error| ApiError::invalid_request(error.to_string()))?;
        let request = HttpRequest::post(&self.refresh_url)
            .with_json_body(body)
            .with_timeout_ms(self.timeout_ms);

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|error| ApiError::transport(error.message(), error.retryable()))?;

        if !response.is_success() {
            let body = ErrorBody::parse(&response.body);
            return Err(ApiError::rejected(response.status, body.message));
        }

        let envelope: ApiResponse<TokenPair> = serde_json::from_str(&response.body)
            .map_err(|error| ApiError::decode(format!("refresh response: {error}")))?;

        if !envelope.data.is_usable() {
            return Err(ApiError::decode("refresh response carried an empty access token"));
        }

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::token_store::MemoryTokenStore;

    struct FixedResponse {
        status: u16,
        body: &'static str,
        calls: AtomicUsize,
    }

    impl HttpClient for FixedResponse {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(HttpResponse::new(self.status, self.body)) })
        }
    }

    fn manager(http: Arc<FixedResponse>, tokens: Option<TokenPair>) -> SessionManager {
        let store = match tokens {
            Some(tokens) => MemoryTokenStore::with_tokens(tokens),
            None => MemoryTokenStore::new(),
        };
        SessionManager::new(http, Arc::new(store), "https://api.test/api/", 1_000)
            .expect("memory store loads")
    }

    #[tokio::test]
    async fn refresh_keeps_old_refresh_token_when_server_omits_it() {
        let http = Arc::new(FixedResponse {
            status: 200,
            body: r#"{"status":"success","data":{"access_token":"a2"}}"#,
            calls: AtomicUsize::new(0),
        });
        let session = manager(
            Arc::clone(&http),
            Some(TokenPair::new("a1", Some(String::from("r1")))),
        );

        let outcome = session.refresh_after(Some("a1")).await;

        assert_eq!(outcome, RefreshOutcome::Refreshed(String::from("a2")));
        assert!(session.has_refresh_token().await);
        assert_eq!(http.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_token_mismatch_reuses_current_token() {
        let http = Arc::new(FixedResponse {
            status: 500,
            body: "",
            calls: AtomicUsize::new(0),
        });
        let session = manager(
            Arc::clone(&http),
            Some(TokenPair::new("a2", Some(String::from("r1")))),
        );

        let outcome = session.refresh_after(Some("a1")).await;

        assert_eq!(outcome, RefreshOutcome::Refreshed(String::from("a2")));
        assert_eq!(http.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_refresh_token_ends_session_without_calling_server() {
        let http = Arc::new(FixedResponse {
            status: 200,
            body: "{}",
            calls: AtomicUsize::new(0),
        });
        let session = manager(Arc::clone(&http), Some(TokenPair::new("a1", None)));
        let mut events = session.subscribe();

        let outcome = session.refresh_after(Some("a1")).await;

        assert_eq!(outcome, RefreshOutcome::Expired);
        assert!(!session.is_authenticated().await);
        assert_eq!(http.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            events.recv().await.expect("event"),
            SessionEvent::LoggedOut(LogoutReason::NoRefreshToken)
        );
    }

    #[tokio::test]
    async fn no_session_means_expired() {
        let http = Arc::new(FixedResponse {
            status: 200,
            body: "{}",
            calls: AtomicUsize::new(0),
        });
        let session = manager(Arc::clone(&http), None);

        assert_eq!(session.force_refresh().await, RefreshOutcome::Expired);
        assert_eq!(http.calls.load(Ordering::SeqCst), 0);
    }
}
