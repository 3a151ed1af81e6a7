use marketsentry_core::ApiClient;
use serde_json::json;

use crate::cli::NotificationsCommand;
use crate::error::CliError;

use super::{page_query, CommandResult};

const NOTIFICATION_COLUMNS: &[&str] = &["id", "created_at", "is_read", "content"];

pub async fn run(
    command: &NotificationsCommand,
    api: &ApiClient,
) -> Result<CommandResult, CliError> {
    let notifications = api.notifications();

    match command {
        NotificationsCommand::List(args) => {
            let page = notifications.list(&page_query(args)?).await?;
            CommandResult::page(&page, NOTIFICATION_COLUMNS)
        }
        NotificationsCommand::Unread => {
            let count = notifications.unread_count().await?;
            Ok(CommandResult::ok(json!({ "unread": count })))
        }
    }
}
