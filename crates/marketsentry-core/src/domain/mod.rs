//! # Domain Models
//!
//! Wire-level records served by the Market Sentry API.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Asset`] | Tradable asset with its current USD price |
//! | [`Alert`] | Server-evaluated price alert |
//! | [`Notification`] | Message produced when an alert fires |
//! | [`AssetIdentity`] | Lowercase key matching rows to feed updates |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! The client never evaluates alerts or computes prices; these types only
//! validate what is sent and decode what comes back.

mod alert;
mod asset;
mod identity;
mod notification;
mod timestamp;

pub use alert::{
    Alert, AlertChannel, AlertRequest, AlertStatus, ConditionType, TriggerType,
    DEFAULT_ALERT_TYPE,
};
pub use asset::{Asset, AssetRequest, AssetType};
pub use identity::AssetIdentity;
pub use notification::{Notification, UnreadCount};
pub use timestamp::UtcDateTime;
