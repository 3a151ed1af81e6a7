use marketsentry_core::{ApiError, ApiErrorKind, CoreError, FieldErrors, StoreError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", render_fields(.0))]
    Form(FieldErrors),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("price feed error: {0}")]
    Feed(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Form(_) => 2,
            Self::Api(error) => match error.kind() {
                ApiErrorKind::SessionExpired | ApiErrorKind::Unauthorized => 5,
                ApiErrorKind::Transport => 6,
                ApiErrorKind::Decode => 4,
                ApiErrorKind::InvalidRequest => 2,
                ApiErrorKind::Rejected | ApiErrorKind::NotFound => 3,
            },
            Self::Serialization(_) => 4,
            Self::Feed(_) => 7,
            Self::Store(_) | Self::Io(_) => 10,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Api(error) => Self::Api(error),
            CoreError::Store(error) => Self::Store(error),
            CoreError::Serialization(error) => Self::Serialization(error),
        }
    }
}

fn render_fields(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_failures_exit_with_five() {
        let error = CliError::from(ApiError::session_expired("gone"));
        assert_eq!(error.exit_code(), 5);
    }

    #[test]
    fn form_errors_list_every_field() {
        let mut fields = FieldErrors::new();
        fields.insert("email", String::from("Email is required"));
        fields.insert("password", String::from("Password is required"));

        let error = CliError::Form(fields);

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.to_string(),
            "email: Email is required; password: Password is required"
        );
    }

    #[test]
    fn not_found_is_a_rejection() {
        let error = CliError::from(ApiError::rejected(404, None));
        assert_eq!(error.exit_code(), 3);
    }
}
