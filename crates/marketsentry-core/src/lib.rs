//! # Market Sentry Core
//!
//! Client library for the Market Sentry price-alert service.
//!
//! ## Overview
//!
//! - **REST client** with bearer tokens and a silent, single-flight token refresh
//! - **Session handling** backed by a pluggable token store
//! - **Paginated loaders** for assets, alerts and notifications
//! - **Price feed** task over one WebSocket connection
//! - **Live board** view-model with transient up/down marks
//! - **Form validation** for login, registration and alerts
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | REST client and resource endpoints |
//! | [`config`] | Environment-driven settings |
//! | [`domain`] | Assets, alerts, notifications |
//! | [`envelope`] | `{ status, data, meta }` response body |
//! | [`error`] | Core error types |
//! | [`forms`] | Per-field form validation |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`live_board`] | Live price table view-model |
//! | [`pagination`] | Page queries, controls and loader |
//! | [`price_feed`] | WebSocket price stream |
//! | [`session`] | Token ownership and refresh |
//! | [`token_store`] | Token persistence |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ CLI / caller │────▶│ ApiClient        │────▶│ HttpClient   │
//! └──────┬───────┘     │ (retry once)     │     │ (reqwest)    │
//!        │             └────────┬─────────┘     └──────────────┘
//!        │                      ▼
//!        │             ┌──────────────────┐     ┌──────────────┐
//!        │             │ SessionManager   │────▶│ TokenStore   │
//!        │             │ (refresh gate)   │     │ (file/memory)│
//!        │             └──────────────────┘     └──────────────┘
//!        ▼
//! ┌──────────────┐ mpsc ┌──────────────────┐ watch ┌──────────┐
//! │ PriceFeed    │─────▶│ LiveBoard driver │──────▶│ renderer │
//! └──────────────┘      └──────────────────┘       └──────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use marketsentry_core::{ApiError, ApiErrorKind};
//!
//! fn describe(error: &ApiError) -> &'static str {
//!     match error.kind() {
//!         ApiErrorKind::SessionExpired | ApiErrorKind::Unauthorized => "log in again",
//!         ApiErrorKind::NotFound => "gone",
//!         _ => "try again later",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - Tokens are never logged and are redacted from `Debug` output
//! - The session file is written with owner-only permissions on Unix

pub mod api;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod forms;
pub mod http_client;
pub mod live_board;
pub mod pagination;
pub mod price_feed;
pub mod session;
pub mod token_store;

pub use api::{AlertsApi, ApiClient, AssetsApi, AuthApi, Credentials, NotificationsApi, Registration};

pub use config::Settings;

pub use domain::{
    Alert, AlertChannel, AlertRequest, AlertStatus, Asset, AssetIdentity, AssetRequest, AssetType,
    ConditionType, Notification, TriggerType, UnreadCount, UtcDateTime,
};

pub use envelope::{ApiResponse, ErrorBody, PageMeta};

pub use error::{
    ApiError, ApiErrorKind, CoreError, StoreError, ValidationError, GENERIC_FAILURE_MESSAGE,
};

pub use forms::{AlertForm, FieldErrors, LoginForm, RegisterForm};

pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

pub use live_board::{spawn_board, BoardRow, BoardSnapshot, FeedStatus, LiveBoard, PriceMark};

pub use pagination::{
    AssetQuery, LoadState, Page, PageQuery, PageSource, PagedQuery, PagedResource,
    PaginationControls, SortOrder,
};

pub use price_feed::{parse_price_message, FeedError, FeedEvent, PriceFeed, PriceUpdate};

pub use session::{LogoutReason, RefreshOutcome, SessionEvent, SessionManager};

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
