//! Inline form validation. Each form reports every failing field at once and
//! nothing is sent until it validates.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::LazyLock;

use regex::Regex;

use crate::api::{Credentials, Registration};
use crate::domain::{AlertChannel, AlertRequest, ConditionType, TriggerType, UtcDateTime};

/// Field name to message; `_form` holds errors not tied to one field.
pub type FieldErrors = BTreeMap<&'static str, String>;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.insert("email", String::from("Email is required"));
    } else if !is_valid_email(email) {
        errors.insert("email", String::from("Invalid email format"));
    }
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    if password.is_empty() {
        errors.insert("password", String::from("Password is required"));
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
}

#[derive(Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl Debug for LoginForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let email = self.email.trim();
        let mut errors = FieldErrors::new();
        check_email(email, &mut errors);
        check_password(&self.password, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Credentials {
            email: email.to_owned(),
            password: self.password.clone(),
        })
    }
}

#[derive(Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Debug for RegisterForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .finish()
    }
}

impl RegisterForm {
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let email = self.email.trim();
        let mut errors = FieldErrors::new();
        check_email(email, &mut errors);
        check_password(&self.password, &mut errors);

        if self.confirm_password.is_empty() {
            errors.insert("confirm_password", String::from("Please confirm your password"));
        } else if self.confirm_password != self.password {
            errors.insert("confirm_password", String::from("Passwords do not match"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Registration {
            email: email.to_owned(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        })
    }
}

/// Raw alert form input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct AlertForm {
    pub condition: String,
    pub value: String,
    pub trigger: String,
    pub expiration: String,
    pub channels: Vec<String>,
}

impl AlertForm {
    /// Validates a new alert against `now`, which the expiration has to be
    /// after.
    pub fn validate(&self, now: UtcDateTime) -> Result<AlertRequest, FieldErrors> {
        self.check(now, Expiration::Required)
    }

    /// Validates an edit. A blank expiration keeps `current` unchecked, even
    /// when it is absent or already past; a typed one must be in the future.
    pub fn validate_edit(
        &self,
        now: UtcDateTime,
        current: Option<UtcDateTime>,
    ) -> Result<AlertRequest, FieldErrors> {
        self.check(now, Expiration::Keep(current))
    }

    fn check(&self, now: UtcDateTime, rule: Expiration) -> Result<AlertRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let condition = self
            .condition
            .parse::<ConditionType>()
            .map_err(|error| errors.insert("condition", error.to_string()))
            .ok();

        let value = match self.value.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Some(value),
            Ok(_) => {
                errors.insert("value", String::from("Target price must be greater than zero"));
                None
            }
            Err(_) if self.value.trim().is_empty() => {
                errors.insert("value", String::from("Target price is required"));
                None
            }
            Err(_) => {
                errors.insert("value", String::from("Target price must be a number"));
                None
            }
        };

        let trigger = self
            .trigger
            .parse::<TriggerType>()
            .map_err(|error| errors.insert("trigger", error.to_string()))
            .ok();

        let typed = self.expiration.trim();
        let expiration = match (rule, UtcDateTime::parse(typed)) {
            (Expiration::Keep(current), _) if typed.is_empty() => Some(current),
            (_, Ok(at)) if at > now => Some(Some(at)),
            (_, Ok(_)) => {
                errors.insert("expiration", String::from("Expiration must be in the future"));
                None
            }
            (_, Err(error)) => {
                errors.insert("expiration", error.to_string());
                None
            }
        };

        let mut channels = Vec::with_capacity(self.channels.len());
        for raw in &self.channels {
            match raw.parse::<AlertChannel>() {
                Ok(channel) => channels.push(channel),
                Err(error) => {
                    errors.insert("channels", error.to_string());
                }
            }
        }
        if self.channels.is_empty() {
            errors.insert("channels", String::from("Select at least one notification channel"));
        }

        let (Some(condition), Some(value), Some(trigger), Some(expiration)) =
            (condition, value, trigger, expiration)
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        AlertRequest::new(condition, value, trigger, expiration, channels).map_err(|error| {
            let mut errors = FieldErrors::new();
            errors.insert("_form", error.to_string());
            errors
        })
    }
}

#[derive(Clone, Copy)]
enum Expiration {
    Required,
    Keep(Option<UtcDateTime>),
}
