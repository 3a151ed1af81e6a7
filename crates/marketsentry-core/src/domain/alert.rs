use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// Price comparison the server evaluates for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    GreaterThan,
    LessThan,
    #[serde(other)]
    Unknown,
}

impl ConditionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::GreaterThan => "above",
            Self::LessThan => "below",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for ConditionType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gt" | "above" | "greater_than" => Ok(Self::GreaterThan),
            "lt" | "below" | "less_than" => Ok(Self::LessThan),
            _ => Err(ValidationError::InvalidCondition {
                value: value.to_owned(),
            }),
        }
    }
}

/// Whether an alert fires once or on every crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    Once,
    EveryTime,
    #[serde(other)]
    Unknown,
}

impl TriggerType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Once => "ONCE",
            Self::EveryTime => "EVERY_TIME",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for TriggerType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "once" => Ok(Self::Once),
            "every-time" | "repeat" => Ok(Self::EveryTime),
            _ => Err(ValidationError::InvalidTrigger {
                value: value.to_owned(),
            }),
        }
    }
}

/// Delivery channel for a fired alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertChannel {
    Email,
    Telegram,
    Push,
    #[serde(other)]
    Unknown,
}

impl AlertChannel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Telegram => "TELEGRAM",
            Self::Push => "PUSH",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for AlertChannel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "telegram" => Ok(Self::Telegram),
            "push" => Ok(Self::Push),
            _ => Err(ValidationError::InvalidChannel {
                value: value.to_owned(),
            }),
        }
    }
}

/// Server-side lifecycle of an alert.
///
/// Every enum here decodes unfamiliar server labels as `Unknown`, so one odd
/// record never fails a page. `FromStr` stays strict and never yields it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Triggered,
    Expired,
    #[serde(other)]
    Unknown,
}

impl AlertStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Triggered => "TRIGGERED",
            Self::Expired => "EXPIRED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Display for AlertStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert record served by `/v1/alerts` and `/v1/assets/:id/alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub alert_type: String,
    pub alert_condition_type: ConditionType,
    pub value: f64,
    pub trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_at: Option<UtcDateTime>,
    #[serde(default)]
    pub alert_method_types: Vec<AlertChannel>,
    pub alert_status: AlertStatus,
}

impl Alert {
    /// One-line summary such as `above 63600`.
    pub fn describe(&self) -> String {
        format!("{} {}", self.alert_condition_type.label(), self.value)
    }
}

pub const DEFAULT_ALERT_TYPE: &str = "PRICE";

/// Body shared by alert creation and update. Creation always carries an
/// expiration; an update may leave it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub alert_type: String,
    pub alert_condition_type: ConditionType,
    pub value: f64,
    pub trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_at: Option<UtcDateTime>,
    pub alert_method_types: Vec<AlertChannel>,
}

impl AlertRequest {
    pub fn new(
        alert_condition_type: ConditionType,
        value: f64,
        trigger_type: TriggerType,
        expiration_at: Option<UtcDateTime>,
        mut alert_method_types: Vec<AlertChannel>,
    ) -> Result<Self, ValidationError> {
        if alert_condition_type == ConditionType::Unknown {
            return Err(ValidationError::InvalidCondition {
                value: String::from(alert_condition_type.as_str()),
            });
        }
        if trigger_type == TriggerType::Unknown {
            return Err(ValidationError::InvalidTrigger {
                value: String::from(trigger_type.as_str()),
            });
        }
        if alert_method_types.contains(&AlertChannel::Unknown) {
            return Err(ValidationError::InvalidChannel {
                value: String::from(AlertChannel::Unknown.as_str()),
            });
        }

        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }
        if value <= 0.0 {
            return Err(ValidationError::NonPositiveValue { field: "value" });
        }

        alert_method_types.sort();
        alert_method_types.dedup();
        if alert_method_types.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "alert_method_types",
            });
        }

        Ok(Self {
            alert_type: String::from(DEFAULT_ALERT_TYPE),
            alert_condition_type,
            value,
            trigger_type,
            expiration_at,
            alert_method_types,
        })
    }

    /// Request that reproduces an existing alert, used as the base for edits.
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            alert_type: alert.alert_type.clone(),
            alert_condition_type: alert.alert_condition_type,
            value: alert.value,
            trigger_type: alert.trigger_type,
            expiration_at: alert.expiration_at,
            alert_method_types: alert.alert_method_types.clone(),
        }
    }
}
