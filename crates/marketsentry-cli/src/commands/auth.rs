use marketsentry_core::{ApiClient, LoginForm, RegisterForm};
use serde_json::json;

use crate::cli::AuthCommand;
use crate::error::CliError;

use super::{secret_or_stdin, CommandResult};

pub async fn run(command: &AuthCommand, api: &ApiClient) -> Result<CommandResult, CliError> {
    match command {
        AuthCommand::Register(args) => {
            let password = secret_or_stdin(args.password.as_deref())?;
            let confirm_password = args
                .confirm_password
                .clone()
                .unwrap_or_else(|| password.clone());
            let registration = RegisterForm {
                email: args.email.clone(),
                password,
                confirm_password,
            }
            .validate()
            .map_err(CliError::Form)?;

            let data = api.auth().register(&registration).await?;
            Ok(CommandResult::ok(json!({
                "registered": registration.email,
                "response": data,
            }))
            .with_warning("account created; run 'marketsentry auth login' to sign in"))
        }
        AuthCommand::Login(args) => {
            let credentials = LoginForm {
                email: args.email.clone(),
                password: secret_or_stdin(args.password.as_deref())?,
            }
            .validate()
            .map_err(CliError::Form)?;

            api.auth().login(&credentials).await?;
            Ok(CommandResult::ok(json!({
                "authenticated": true,
                "email": credentials.email,
            })))
        }
        AuthCommand::Refresh => {
            api.auth().refresh().await?;
            Ok(CommandResult::ok(json!({ "refreshed": true })))
        }
        AuthCommand::Logout => {
            api.auth().logout().await;
            Ok(CommandResult::ok(json!({ "authenticated": false })))
        }
        AuthCommand::Status => {
            let session = api.session();
            Ok(CommandResult::ok(json!({
                "authenticated": session.is_authenticated().await,
                "refresh_token": session.has_refresh_token().await,
            })))
        }
    }
}
