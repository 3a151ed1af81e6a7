use std::io::{self, IsTerminal, Stderr, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use marketsentry_core::{
    spawn_board, ApiClient, AssetQuery, AssetType, BoardRow, BoardSnapshot, FeedStatus, LiveBoard,
    PageQuery, PriceFeed, PriceMark, Settings, SortOrder,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::cli::{MarketCommand, WatchArgs};
use crate::error::CliError;

use super::CommandResult;

const BOARD_COLUMNS: &[&str] = &["symbol", "name", "identity", "current_price_usd"];
const FEED_BUFFER: usize = 64;

pub async fn run(
    command: &MarketCommand,
    api: &ApiClient,
    settings: &Settings,
) -> Result<CommandResult, CliError> {
    match command {
        MarketCommand::Watch(args) => watch(args, api, settings).await,
    }
}

async fn watch(
    args: &WatchArgs,
    api: &ApiClient,
    settings: &Settings,
) -> Result<CommandResult, CliError> {
    let query = AssetQuery::new(
        PageQuery::new(1, args.paging)?.sorted_by("createdAt", SortOrder::Asc),
    )
    .with_type(AssetType::from(args.asset_type));
    let page = api.assets().list(&query).await?;
    info!(rows = page.items.len(), "watching live prices");

    let (events, receiver) = mpsc::channel(FEED_BUFFER);
    let feed = PriceFeed::spawn(settings.ws_url.clone(), events);
    let (mut snapshots, board_task) =
        spawn_board(LiveBoard::new(page.items, settings.flash_window()), receiver);

    let stop_at = args
        .seconds
        .map(|seconds| Instant::now() + Duration::from_secs(seconds));
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let mut screen = Screen::open()?;
    screen.draw(&snapshots.borrow().clone())?;
    let mut last_feed = FeedStatus::Connecting;

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                debug!("interrupted");
                break;
            }
            _ = sleep_until(stop_at.unwrap_or_else(Instant::now)), if stop_at.is_some() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                last_feed = snapshot.feed;
                screen.draw(&snapshot)?;
            }
        }
    }

    screen.close()?;
    feed.shutdown().await;
    let board = board_task
        .await
        .map_err(|error| CliError::Feed(error.to_string()))?;

    let rows: Vec<Value> = board.rows().iter().map(row_json).collect();
    let result = CommandResult::ok(Value::Array(rows)).with_columns(BOARD_COLUMNS);
    Ok(if last_feed == FeedStatus::Disconnected {
        result.with_warning("price feed disconnected; prices may be stale")
    } else {
        result
    })
}

fn row_json(row: &BoardRow) -> Value {
    json!({
        "id": row.asset.id,
        "identity": row.asset.identity,
        "symbol": row.asset.symbol,
        "name": row.asset.name,
        "current_price_usd": row.price(),
    })
}

fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("{price:.2}")
    } else {
        format!("{price:.6}")
    }
}

fn row_line(row: &BoardRow) -> String {
    let arrow = match row.mark {
        PriceMark::Up => "▲",
        PriceMark::Down => "▼",
        PriceMark::Neutral => " ",
    };
    format!(
        "{:<8} {:<20} {:>16} {arrow}",
        row.asset.symbol,
        row.asset.name,
        format_price(row.price()),
    )
}

const fn mark_color(mark: PriceMark) -> Option<Color> {
    match mark {
        PriceMark::Up => Some(Color::Green),
        PriceMark::Down => Some(Color::Red),
        PriceMark::Neutral => None,
    }
}

/// Redraws the board on stderr's alternate screen; inert when stderr is
/// not a terminal so piped output stays clean.
struct Screen {
    out: Option<Stderr>,
}

impl Screen {
    fn open() -> io::Result<Self> {
        let mut stderr = io::stderr();
        if !stderr.is_terminal() {
            return Ok(Self { out: None });
        }
        execute!(stderr, EnterAlternateScreen, Hide)?;
        Ok(Self { out: Some(stderr) })
    }

    fn draw(&mut self, snapshot: &BoardSnapshot) -> io::Result<()> {
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };

        let status = match snapshot.feed {
            FeedStatus::Connecting => "connecting",
            FeedStatus::Live => "live",
            FeedStatus::Disconnected => "disconnected",
        };
        queue!(
            out,
            Clear(ClearType::All),
            MoveTo(0, 0),
            Print(format!("Market Sentry  [{status}]  Ctrl-C to quit")),
            MoveTo(0, 1),
            Print(format!(
                "{:<8} {:<20} {:>16}",
                "SYMBOL", "NAME", "PRICE (USD)"
            )),
        )?;

        for (index, row) in snapshot.rows.iter().enumerate() {
            let line = u16::try_from(index + 2).unwrap_or(u16::MAX);
            queue!(out, MoveTo(0, line))?;
            match mark_color(row.mark) {
                Some(color) => queue!(out, SetForegroundColor(color), Print(row_line(row)), ResetColor)?,
                None => queue!(out, Print(row_line(row)))?,
            }
        }

        out.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.out.take() {
            Some(mut out) => execute!(out, Show, LeaveAlternateScreen),
            None => Ok(()),
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
