use marketsentry_core::{Alert, AlertChannel, AlertForm, ApiClient, UtcDateTime};
use serde_json::json;

use crate::cli::{AlertUpdateArgs, AlertsCommand};
use crate::error::CliError;

use super::assets::ALERT_COLUMNS;
use super::{page_query, CommandResult};

pub async fn run(command: &AlertsCommand, api: &ApiClient) -> Result<CommandResult, CliError> {
    let alerts = api.alerts();

    match command {
        AlertsCommand::Create(args) => {
            let request = AlertForm {
                condition: args.condition.clone(),
                value: args.value.clone(),
                trigger: args.trigger.clone(),
                expiration: args.expires.clone(),
                channels: args.channels.clone(),
            }
            .validate(UtcDateTime::now())
            .map_err(CliError::Form)?;

            let alert = api.assets().create_alert(&args.asset_id, &request).await?;
            Ok(CommandResult::ok(serde_json::to_value(&alert)?)
                .with_warning(format!("alert set: {}", alert.describe())))
        }
        AlertsCommand::List(args) => {
            let page = alerts.list(&page_query(args)?).await?;
            CommandResult::page(&page, ALERT_COLUMNS)
        }
        AlertsCommand::Show(args) => {
            let alert = alerts.get(&args.id).await?;
            Ok(CommandResult::ok(serde_json::to_value(alert)?))
        }
        AlertsCommand::Update(args) => {
            let existing = alerts.get(&args.id).await?;
            let request = edit_form(&existing, args)
                .validate_edit(UtcDateTime::now(), existing.expiration_at)
                .map_err(CliError::Form)?;

            let alert = alerts.update(&args.id, &request).await?;
            Ok(CommandResult::ok(serde_json::to_value(alert)?))
        }
        AlertsCommand::Delete(args) => {
            alerts.delete(&args.id).await?;
            Ok(CommandResult::ok(json!({ "deleted": args.id })))
        }
    }
}

/// Pre-fills the form from `existing`; flags replace individual fields.
/// The expiration is left blank unless `--expires` is given, so the current
/// one is kept as is. Channels this client does not know are dropped.
fn edit_form(existing: &Alert, args: &AlertUpdateArgs) -> AlertForm {
    let channels = if args.channels.is_empty() {
        existing
            .alert_method_types
            .iter()
            .filter(|channel| **channel != AlertChannel::Unknown)
            .map(|channel| channel.as_str().to_owned())
            .collect()
    } else {
        args.channels.clone()
    };

    AlertForm {
        condition: args
            .condition
            .clone()
            .unwrap_or_else(|| existing.alert_condition_type.label().to_owned()),
        value: args
            .value
            .clone()
            .unwrap_or_else(|| existing.value.to_string()),
        trigger: args
            .trigger
            .clone()
            .unwrap_or_else(|| existing.trigger_type.as_str().to_owned()),
        expiration: args.expires.clone().unwrap_or_default(),
        channels,
    }
}
