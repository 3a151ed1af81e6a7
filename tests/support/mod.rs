//! Scripted in-process transport shared by the behaviour tests.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use marketsentry_core::{
    ApiClient, HttpClient, HttpError, HttpRequest, HttpResponse, MemoryTokenStore,
    SessionManager, Settings, TokenPair, TokenStore,
};
use serde_json::{json, Value};

type Responder = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// Answers every request with a closure and records what it saw.
pub struct ScriptedHttp {
    responder: Box<Responder>,
    refresh_delay: Duration,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    pub fn new(responder: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static) -> Arc<Self> {
        Self::with_refresh_delay(Duration::ZERO, responder)
    }

    /// Holds refresh-token responses back so concurrent callers overlap.
    pub fn with_refresh_delay(
        refresh_delay: Duration,
        responder: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            refresh_delay,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request_path(request) == path)
            .count()
    }
}

impl HttpClient for ScriptedHttp {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            self.requests
                .lock()
                .expect("requests lock")
                .push(request.clone());
            let response = (self.responder)(&request);
            if is_refresh(&request) && !self.refresh_delay.is_zero() {
                tokio::time::sleep(self.refresh_delay).await;
            }
            Ok(response)
        })
    }
}

/// Path relative to the API base, without the query string.
pub fn request_path(request: &HttpRequest) -> &str {
    let base = Settings::default().api_url.len();
    let path = request.url.get(base..).unwrap_or_default();
    path.split('?').next().unwrap_or_default()
}

pub fn is_refresh(request: &HttpRequest) -> bool {
    request_path(request) == "/v1/auth/refresh-token"
}

pub fn ok(data: Value) -> HttpResponse {
    HttpResponse::ok_json(json!({ "status": "success", "data": data }).to_string())
}

pub fn page(data: Value, current_page: u32, total_pages: u32) -> HttpResponse {
    let next_page = (current_page < total_pages).then(|| current_page + 1);
    let prev_page = (current_page > 1).then(|| current_page - 1);
    HttpResponse::ok_json(
        json!({
            "status": "success",
            "data": data,
            "meta": {
                "current_page": current_page,
                "next_page": next_page,
                "prev_page": prev_page,
                "total_pages": total_pages,
                "total_count": total_pages * 2,
            }
        })
        .to_string(),
    )
}

pub fn expired() -> HttpResponse {
    HttpResponse::new(
        401,
        json!({ "status": "error", "code": "TOKEN_EXPIRED", "message": "jwt expired" }).to_string(),
    )
}

pub fn unauthorized() -> HttpResponse {
    HttpResponse::new(
        401,
        json!({ "status": "error", "message": "invalid signature" }).to_string(),
    )
}

pub fn issued(access: &str, refresh: &str) -> HttpResponse {
    ok(json!({ "access_token": access, "refresh_token": refresh }))
}

pub fn tokens(access: &str, refresh: &str) -> TokenPair {
    TokenPair::new(access, Some(refresh.to_owned()))
}

pub fn asset_json(identity: &str, price: f64) -> Value {
    json!({
        "id": format!("asset-{identity}"),
        "identity": identity,
        "symbol": identity.to_ascii_uppercase(),
        "name": identity,
        "explorer": "",
        "current_price_usd": price,
        "asset_type": "CRYPTO",
        "logo": "",
    })
}

/// Client over `http` with a memory store seeded with `seed`.
pub fn client(http: Arc<ScriptedHttp>, seed: Option<TokenPair>) -> (ApiClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(match seed {
        Some(tokens) => MemoryTokenStore::with_tokens(tokens),
        None => MemoryTokenStore::new(),
    });
    let settings = Settings::default();
    let transport: Arc<dyn HttpClient> = http;
    let session = SessionManager::new(
        Arc::clone(&transport),
        Arc::clone(&store) as Arc<dyn TokenStore>,
        &settings.api_url,
        settings.timeout_ms,
    )
    .expect("memory store loads");

    (ApiClient::new(transport, Arc::new(session), &settings), store)
}
