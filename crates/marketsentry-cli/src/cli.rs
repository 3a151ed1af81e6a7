//! CLI argument definitions for Market Sentry.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `auth` | Register, log in, refresh, log out, show session |
//! | `assets` | Browse and manage assets and their alerts |
//! | `alerts` | Create, list, edit and delete price alerts |
//! | `notifications` | List notifications and the unread count |
//! | `market watch` | Live price board fed by the price stream |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--verbose` | `false` | Debug logging on stderr |
//! | `--api-url` | `MARKETSENTRY_API_URL` | REST base URL |
//! | `--ws-url` | `MARKETSENTRY_WS_URL` | Price stream URL |
//! | `--timeout-ms` | `MARKETSENTRY_TIMEOUT_MS` | HTTP timeout |
//! | `--session-file` | `MARKETSENTRY_SESSION_FILE` | Token file |
//!
//! # Examples
//!
//! ```bash
//! marketsentry auth login --email trader@example.com
//! marketsentry assets list --type crypto --format table
//! marketsentry alerts create 6f1c --condition above --value 63600 \
//!     --trigger once --expires 2026-12-31T00:00:00Z --channel email
//! marketsentry market watch --seconds 30
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use marketsentry_core::{AssetType, Settings, SortOrder};

/// Market Sentry - price alerts from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "marketsentry",
    author,
    version,
    about = "Price alerts, notifications and live market prices",
    long_about = "Market Sentry client. Browse asset prices, manage price alerts, read \
notifications and watch a live price board.\n\
\n\
Use 'marketsentry <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log debug detail to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// REST API base URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Price stream WebSocket URL.
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Where the session tokens are kept.
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies command-line overrides on top of environment settings.
    pub fn settings(&self, mut settings: Settings) -> Settings {
        if let Some(api_url) = &self.api_url {
            settings.api_url = api_url.trim_end_matches('/').to_owned();
        }
        if let Some(ws_url) = &self.ws_url {
            settings.ws_url = ws_url.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms.filter(|value| *value > 0) {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(session_file) = &self.session_file {
            settings.session_file = session_file.clone();
        }
        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Account and session management.
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Browse and manage assets.
    #[command(subcommand)]
    Assets(AssetsCommand),

    /// Manage price alerts.
    #[command(subcommand)]
    Alerts(AlertsCommand),

    /// Read notifications.
    #[command(subcommand)]
    Notifications(NotificationsCommand),

    /// Live market views.
    #[command(subcommand)]
    Market(MarketCommand),
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Create an account.
    Register(RegisterArgs),
    /// Sign in and store the session.
    Login(LoginArgs),
    /// Renew the access token now.
    Refresh,
    /// Forget the stored session.
    Logout,
    /// Show whether a session is stored.
    Status,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    /// Read from stdin when omitted.
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,

    /// Read from stdin when omitted.
    #[arg(long)]
    pub password: Option<String>,

    /// Defaults to the password when omitted.
    #[arg(long)]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Page size.
    #[arg(long, default_value_t = 20)]
    pub paging: u32,

    /// Field to sort by.
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long, value_enum, default_value_t = OrderArg::Asc)]
    pub order: OrderArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Asc => Self::Asc,
            OrderArg::Desc => Self::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AssetTypeArg {
    Crypto,
    Stock,
}

impl From<AssetTypeArg> for AssetType {
    fn from(value: AssetTypeArg) -> Self {
        match value {
            AssetTypeArg::Crypto => Self::Crypto,
            AssetTypeArg::Stock => Self::Stock,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum AssetsCommand {
    /// List assets with optional filters.
    List(AssetListArgs),
    /// Show one asset.
    Show(IdArgs),
    /// Create an asset.
    Create(AssetWriteArgs),
    /// Replace an asset's details.
    Update(AssetUpdateArgs),
    /// Delete an asset.
    Delete(IdArgs),
    /// List alerts set on an asset.
    Alerts(AssetAlertsArgs),
}

#[derive(Debug, Args)]
pub struct AssetListArgs {
    #[command(flatten)]
    pub page: PageArgs,

    #[arg(long = "type", value_enum)]
    pub asset_type: Option<AssetTypeArg>,

    /// Free-text search.
    #[arg(long)]
    pub q: Option<String>,

    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct AssetWriteArgs {
    /// Feed identity, e.g. `bitcoin`.
    #[arg(long)]
    pub identity: String,

    #[arg(long)]
    pub symbol: String,

    #[arg(long)]
    pub name: String,

    #[arg(long = "type", value_enum, default_value_t = AssetTypeArg::Crypto)]
    pub asset_type: AssetTypeArg,

    #[arg(long)]
    pub explorer: Option<String>,

    #[arg(long)]
    pub logo: Option<String>,
}

#[derive(Debug, Args)]
pub struct AssetUpdateArgs {
    pub id: String,

    #[command(flatten)]
    pub asset: AssetWriteArgs,
}

#[derive(Debug, Args)]
pub struct AssetAlertsArgs {
    pub id: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// Create an alert on an asset.
    Create(AlertCreateArgs),
    /// List alerts.
    List(PageArgs),
    /// Show one alert.
    Show(IdArgs),
    /// Edit an alert; unspecified fields keep their current values.
    Update(AlertUpdateArgs),
    /// Delete an alert.
    Delete(IdArgs),
}

#[derive(Debug, Args)]
pub struct AlertCreateArgs {
    pub asset_id: String,

    /// `above`/`gt` or `below`/`lt`.
    #[arg(long)]
    pub condition: String,

    /// Target price in USD.
    #[arg(long)]
    pub value: String,

    /// `once` or `every-time`.
    #[arg(long, default_value = "once")]
    pub trigger: String,

    /// RFC3339 UTC expiration, e.g. 2026-12-31T00:00:00Z.
    #[arg(long)]
    pub expires: String,

    /// Repeat for several channels: email, telegram, push.
    #[arg(long = "channel")]
    pub channels: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AlertUpdateArgs {
    pub id: String,

    #[arg(long)]
    pub condition: Option<String>,

    #[arg(long)]
    pub value: Option<String>,

    #[arg(long)]
    pub trigger: Option<String>,

    #[arg(long)]
    pub expires: Option<String>,

    #[arg(long = "channel")]
    pub channels: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum NotificationsCommand {
    /// List notifications.
    List(PageArgs),
    /// Show the unread count.
    Unread,
}

#[derive(Debug, Subcommand)]
pub enum MarketCommand {
    /// Watch live prices until Ctrl-C.
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[arg(long = "type", value_enum, default_value_t = AssetTypeArg::Crypto)]
    pub asset_type: AssetTypeArg,

    /// Number of rows to watch.
    #[arg(long, default_value_t = 20)]
    pub paging: u32,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    pub seconds: Option<u64>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_environment_settings() {
        let cli = Cli::parse_from([
            "marketsentry",
            "--api-url",
            "https://api.example.test/api/",
            "--timeout-ms",
            "2500",
            "notifications",
            "unread",
        ]);

        let settings = cli.settings(Settings::default());

        assert_eq!(settings.api_url, "https://api.example.test/api");
        assert_eq!(settings.timeout_ms, 2_500);
        assert_eq!(settings.ws_url, marketsentry_core::config::DEFAULT_WS_URL);
    }

    #[test]
    fn alert_create_collects_repeated_channels() {
        let cli = Cli::parse_from([
            "marketsentry",
            "alerts",
            "create",
            "asset-1",
            "--condition",
            "above",
            "--value",
            "100",
            "--expires",
            "2030-01-01T00:00:00Z",
            "--channel",
            "email",
            "--channel",
            "push",
        ]);

        let Command::Alerts(AlertsCommand::Create(args)) = cli.command else {
            panic!("expected alerts create");
        };
        assert_eq!(args.channels, vec!["email", "push"]);
        assert_eq!(args.trigger, "once");
    }
}
