//! # Live Price Board
//!
//! View-model for the market table. Rows come from the first asset page;
//! feed frames update prices in place and set a transient [`PriceMark`] that
//! clears itself after the flash window.
//!
//! ```text
//! Neutral --up--> Up --window elapsed--> Neutral
//! Neutral --down--> Down --window elapsed--> Neutral
//! Up <--reverse within window--> Down   (window restarts)
//! ```
//!
//! [`spawn_board`] owns a board on a task, feeds it [`FeedEvent`]s, wakes at
//! the nearest mark deadline and publishes [`BoardSnapshot`]s over `watch`.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::domain::{Asset, AssetIdentity};
use crate::price_feed::{FeedEvent, PriceUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMark {
    Neutral,
    Up,
    Down,
}

impl PriceMark {
    fn between(old: f64, new: f64) -> Self {
        if new > old {
            Self::Up
        } else if new < old {
            Self::Down
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow {
    pub asset: Asset,
    pub mark: PriceMark,
    mark_until: Option<Instant>,
}

impl BoardRow {
    fn new(asset: Asset) -> Self {
        Self {
            asset,
            mark: PriceMark::Neutral,
            mark_until: None,
        }
    }

    pub fn price(&self) -> f64 {
        self.asset.current_price_usd
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Connecting,
    Live,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub rows: Vec<BoardRow>,
    pub feed: FeedStatus,
}

pub struct LiveBoard {
    rows: Vec<BoardRow>,
    by_identity: HashMap<AssetIdentity, Vec<usize>>,
    flash: Duration,
}

impl LiveBoard {
    pub fn new(assets: Vec<Asset>, flash: Duration) -> Self {
        let rows: Vec<BoardRow> = assets.into_iter().map(BoardRow::new).collect();
        let mut by_identity: HashMap<AssetIdentity, Vec<usize>> = HashMap::new();
        for (position, row) in rows.iter().enumerate() {
            by_identity
                .entry(row.asset.identity.clone())
                .or_default()
                .push(position);
        }

        Self {
            rows,
            by_identity,
            flash,
        }
    }

    pub fn rows(&self) -> &[BoardRow] {
        &self.rows
    }

    pub fn row(&self, identity: &str) -> Option<&BoardRow> {
        let position = *self.by_identity.get(identity)?.first()?;
        self.rows.get(position)
    }

    /// Applies one frame; returns how many rows changed price.
    ///
    /// Identities with no row are ignored. An equal price leaves the row and
    /// any running mark untouched.
    pub fn apply(&mut self, update: &PriceUpdate, now: Instant) -> usize {
        let mut changed = 0;
        for (identity, price) in update.iter() {
            let Some(positions) = self.by_identity.get(identity) else {
                continue;
            };
            for &position in positions {
                let row = &mut self.rows[position];
                let mark = PriceMark::between(row.asset.current_price_usd, price);
                if mark == PriceMark::Neutral {
                    continue;
                }
                row.asset.current_price_usd = price;
                row.mark = mark;
                row.mark_until = Some(now + self.flash);
                changed += 1;
            }
        }
        changed
    }

    /// Clears marks whose window has elapsed; returns how many were cleared.
    pub fn expire_marks(&mut self, now: Instant) -> usize {
        let mut cleared = 0;
        for row in &mut self.rows {
            if row.mark_until.is_some_and(|until| until <= now) {
                row.mark = PriceMark::Neutral;
                row.mark_until = None;
                cleared += 1;
            }
        }
        cleared
    }

    pub fn clear_marks(&mut self) {
        for row in &mut self.rows {
            row.mark = PriceMark::Neutral;
            row.mark_until = None;
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.rows.iter().filter_map(|row| row.mark_until).min()
    }

    pub fn snapshot(&self, feed: FeedStatus) -> BoardSnapshot {
        BoardSnapshot {
            rows: self.rows.clone(),
            feed,
        }
    }
}

/// Runs `board` on a task until `events` closes.
///
/// The task returns the board so callers can inspect the final prices.
pub fn spawn_board(
    board: LiveBoard,
    events: mpsc::Receiver<FeedEvent>,
) -> (watch::Receiver<BoardSnapshot>, JoinHandle<LiveBoard>) {
    let (snapshots, receiver) = watch::channel(board.snapshot(FeedStatus::Connecting));
    let task = tokio::spawn(drive(board, events, snapshots));
    (receiver, task)
}

async fn drive(
    mut board: LiveBoard,
    mut events: mpsc::Receiver<FeedEvent>,
    snapshots: watch::Sender<BoardSnapshot>,
) -> LiveBoard {
    let mut feed = FeedStatus::Connecting;

    loop {
        let deadline = board.next_deadline();
        tokio::select! {
            event = events.recv() => match event {
                Some(FeedEvent::Prices(update)) => {
                    let changed = board.apply(&update, Instant::now());
                    debug!(changed, "price frame applied");
                    if changed == 0 {
                        continue;
                    }
                }
                Some(FeedEvent::Connected) => feed = FeedStatus::Live,
                Some(FeedEvent::Disconnected) => feed = FeedStatus::Disconnected,
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                board.expire_marks(Instant::now());
            }
        }
        snapshots.send_replace(board.snapshot(feed));
    }

    board.clear_marks();
    snapshots.send_replace(board.snapshot(FeedStatus::Disconnected));
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssetType;

    fn asset(identity: &str, price: f64) -> Asset {
        Asset {
            id: format!("id-{identity}"),
            identity: AssetIdentity::parse(identity).expect("identity"),
            symbol: identity.to_ascii_uppercase(),
            name: identity.to_owned(),
            explorer: String::new(),
            current_price_usd: price,
            asset_type: AssetType::Crypto,
            logo: String::new(),
        }
    }

    fn update(entries: &[(&str, f64)]) -> PriceUpdate {
        entries
            .iter()
            .map(|(identity, price)| (AssetIdentity::parse(identity).expect("identity"), *price))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn reversal_inside_window_restarts_it() {
        let mut board = LiveBoard::new(vec![asset("btc", 100.0)], Duration::from_millis(500));
        let start = Instant::now();

        board.apply(&update(&[("btc", 110.0)]), start);
        board.apply(&update(&[("btc", 105.0)]), start + Duration::from_millis(300));

        assert_eq!(board.row("btc").expect("row").mark, PriceMark::Down);
        assert_eq!(board.expire_marks(start + Duration::from_millis(600)), 0);
        assert_eq!(board.expire_marks(start + Duration::from_millis(800)), 1);
        assert_eq!(board.row("btc").expect("row").mark, PriceMark::Neutral);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_identities_all_update() {
        let mut board = LiveBoard::new(
            vec![asset("btc", 1.0), asset("btc", 2.0)],
            Duration::from_millis(500),
        );

        let changed = board.apply(&update(&[("btc", 1.5)]), Instant::now());

        assert_eq!(changed, 2);
        assert_eq!(board.rows()[0].mark, PriceMark::Up);
        assert_eq!(board.rows()[1].mark, PriceMark::Down);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_price_is_applied() {
        let mut board = LiveBoard::new(vec![asset("luna", 0.2)], Duration::from_millis(500));

        board.apply(&update(&[("luna", 0.0)]), Instant::now());

        let row = board.row("luna").expect("row");
        assert_eq!(row.price(), 0.0);
        assert_eq!(row.mark, PriceMark::Down);
    }
}
