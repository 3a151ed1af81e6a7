use marketsentry_core::{ApiClient, AssetIdentity, AssetQuery, AssetRequest, AssetType};
use serde_json::json;

use crate::cli::{AssetWriteArgs, AssetsCommand};
use crate::error::CliError;

use super::{page_query, CommandResult};

pub const ASSET_COLUMNS: &[&str] = &["id", "symbol", "name", "current_price_usd", "asset_type"];
pub const ALERT_COLUMNS: &[&str] = &[
    "id",
    "alert_condition_type",
    "value",
    "trigger_type",
    "expiration_at",
    "alert_method_types",
    "alert_status",
];

pub async fn run(command: &AssetsCommand, api: &ApiClient) -> Result<CommandResult, CliError> {
    let assets = api.assets();

    match command {
        AssetsCommand::List(args) => {
            let mut query = AssetQuery::new(page_query(&args.page)?);
            if let Some(asset_type) = args.asset_type {
                query = query.with_type(AssetType::from(asset_type));
            }
            if let Some(q) = args.q.as_deref().filter(|q| !q.trim().is_empty()) {
                query = query.with_search(q);
            }
            if let Some(category) = &args.category {
                query = query.with_category(category.clone());
            }

            let page = assets.list(&query).await?;
            CommandResult::page(&page, ASSET_COLUMNS)
        }
        AssetsCommand::Show(args) => {
            let asset = assets.get(&args.id).await?;
            let mut data = serde_json::to_value(&asset)?;
            data["icon_url"] = json!(asset.icon_url());
            Ok(CommandResult::ok(data))
        }
        AssetsCommand::Create(args) => {
            let asset = assets.create(&asset_request(args)?).await?;
            Ok(CommandResult::ok(serde_json::to_value(asset)?))
        }
        AssetsCommand::Update(args) => {
            let asset = assets.update(&args.id, &asset_request(&args.asset)?).await?;
            Ok(CommandResult::ok(serde_json::to_value(asset)?))
        }
        AssetsCommand::Delete(args) => {
            assets.delete(&args.id).await?;
            Ok(CommandResult::ok(json!({ "deleted": args.id })))
        }
        AssetsCommand::Alerts(args) => {
            let page = assets.alerts(&args.id, &page_query(&args.page)?).await?;
            CommandResult::page(&page, ALERT_COLUMNS)
        }
    }
}

fn asset_request(args: &AssetWriteArgs) -> Result<AssetRequest, CliError> {
    let identity = AssetIdentity::parse(&args.identity)?;
    let mut request = AssetRequest::new(
        identity,
        args.symbol.as_str(),
        args.name.as_str(),
        AssetType::from(args.asset_type),
    )?;
    if let Some(explorer) = &args.explorer {
        request = request.with_explorer(explorer.as_str());
    }
    if let Some(logo) = &args.logo {
        request = request.with_logo(logo.as_str());
    }
    Ok(request)
}
