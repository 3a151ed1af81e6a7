mod alerts;
mod assets;
mod auth;
mod market;
mod notifications;

use std::io::BufRead;
use std::time::Instant;

use marketsentry_core::{ApiClient, Page, PageQuery, PaginationControls, Settings, SortOrder};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Cli, Command, PageArgs};
use crate::error::CliError;
use crate::metadata::{Envelope, Metadata};

pub struct CommandResult {
    pub data: Value,
    pub columns: &'static [&'static str],
    pub pagination: Option<PaginationControls>,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            columns: &[],
            pagination: None,
            warnings: Vec::new(),
        }
    }

    /// List result with its previous/next state.
    pub fn page<T: Serialize>(
        page: &Page<T>,
        columns: &'static [&'static str],
    ) -> Result<Self, CliError> {
        Ok(Self {
            data: serde_json::to_value(&page.items)?,
            columns,
            pagination: Some(page.controls()),
            warnings: Vec::new(),
        })
    }

    pub fn with_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

pub async fn run(cli: &Cli, settings: &Settings) -> Result<Envelope, CliError> {
    let started = Instant::now();
    let api = ApiClient::from_settings(settings)?;

    let command_result = match &cli.command {
        Command::Auth(command) => auth::run(command, &api).await?,
        Command::Assets(command) => assets::run(command, &api).await?,
        Command::Alerts(command) => alerts::run(command, &api).await?,
        Command::Notifications(command) => notifications::run(command, &api).await?,
        Command::Market(command) => market::run(command, &api, settings).await?,
    };

    let CommandResult {
        data,
        columns,
        pagination,
        warnings,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = Metadata::new(latency_ms);
    meta.pagination = pagination;
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope {
        meta,
        data,
        columns,
    })
}

fn page_query(args: &PageArgs) -> Result<PageQuery, CliError> {
    let query = PageQuery::new(args.page, args.paging)?;
    Ok(match &args.sort {
        Some(field) => query.sorted_by(field.clone(), SortOrder::from(args.order)),
        None => query,
    })
}

/// Uses `provided` or reads one line from stdin, so secrets can be piped in.
fn secret_or_stdin(provided: Option<&str>) -> Result<String, CliError> {
    if let Some(value) = provided {
        return Ok(value.to_owned());
    }

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
