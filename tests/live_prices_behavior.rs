//! Behavior-driven tests for the live price board.
//!
//! These tests verify how pushed price frames change rows, how the transient
//! up/down marks expire on their own, and how the board task follows the
//! feed lifecycle.

mod support;

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream;
use marketsentry_core::price_feed::pump;
use marketsentry_core::{
    parse_price_message, spawn_board, AssetQuery, FeedEvent, FeedStatus, LiveBoard, PageQuery,
    PriceMark,
};
use serde_json::json;
use support::{asset_json, client, page, tokens, ScriptedHttp};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{advance, Instant};
use tokio_tungstenite::tungstenite::Message;

const FLASH: Duration = Duration::from_millis(500);

async fn loaded_board() -> LiveBoard {
    let http = ScriptedHttp::new(|_| {
        page(
            json!([asset_json("btc", 49_000.0), asset_json("eth", 3_000.0)]),
            1,
            1,
        )
    });
    let (api, _) = client(Arc::clone(&http), Some(tokens("a1", "r1")));
    let first_page = api
        .assets()
        .list(&AssetQuery::new(PageQuery::default()))
        .await
        .expect("asset page");
    LiveBoard::new(first_page.items, FLASH)
}

// =============================================================================
// Price diffs
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_price_rises_row_updates_and_is_marked_up() {
    // Given: btc at 49000 and eth at 3000
    let mut board = loaded_board().await;

    // When: the feed pushes btc 50000 and an unchanged eth
    let update = parse_price_message(r#"{"btc": 50000, "eth": 3000}"#).expect("frame");
    let changed = board.apply(&update, Instant::now());

    // Then: only btc changes
    assert_eq!(changed, 1);
    let btc = board.row("btc").expect("btc row");
    assert_eq!(btc.price(), 50_000.0);
    assert_eq!(btc.mark, PriceMark::Up);
    let eth = board.row("eth").expect("eth row");
    assert_eq!(eth.price(), 3_000.0);
    assert_eq!(eth.mark, PriceMark::Neutral);
}

#[tokio::test(start_paused = true)]
async fn when_price_falls_row_is_marked_down() {
    let mut board = loaded_board().await;

    board.apply(&parse_price_message(r#"{"eth": 2950.5}"#).expect("frame"), Instant::now());

    assert_eq!(board.row("eth").expect("eth").mark, PriceMark::Down);
    assert_eq!(board.row("eth").expect("eth").price(), 2_950.5);
}

#[tokio::test(start_paused = true)]
async fn when_frame_names_unknown_asset_nothing_changes() {
    let mut board = loaded_board().await;
    let before = board.rows().to_vec();

    let changed = board.apply(
        &parse_price_message(r#"{"doge": 0.1, "btc": null}"#).expect("frame"),
        Instant::now(),
    );

    assert_eq!(changed, 0);
    assert_eq!(board.rows(), before.as_slice());
}

#[tokio::test(start_paused = true)]
async fn when_frame_uses_uppercase_keys_rows_still_match() {
    let mut board = loaded_board().await;

    board.apply(&parse_price_message(r#"{"BTC": 48000}"#).expect("frame"), Instant::now());

    assert_eq!(board.row("btc").expect("btc").mark, PriceMark::Down);
}

// =============================================================================
// Transient marks
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_window_elapses_mark_returns_to_neutral() {
    // Given: a fresh up mark
    let mut board = loaded_board().await;
    let start = Instant::now();
    board.apply(&parse_price_message(r#"{"btc": 50000}"#).expect("frame"), start);

    // When: just before and then at the end of the window
    assert_eq!(board.expire_marks(start + FLASH - Duration::from_millis(1)), 0);
    assert_eq!(board.row("btc").expect("btc").mark, PriceMark::Up);
    assert_eq!(board.expire_marks(start + FLASH), 1);

    // Then: the mark is gone and the price stays
    let btc = board.row("btc").expect("btc");
    assert_eq!(btc.mark, PriceMark::Neutral);
    assert_eq!(btc.price(), 50_000.0);
    assert!(board.next_deadline().is_none());
}

#[tokio::test(start_paused = true)]
async fn when_board_task_runs_marks_clear_without_further_messages() {
    // Given: a board task fed by a channel
    let board = loaded_board().await;
    let (events, receiver) = mpsc::channel(8);
    let (mut snapshots, task) = spawn_board(board, receiver);

    // When: the feed connects and pushes one frame
    events.send(FeedEvent::Connected).await.expect("send");
    events
        .send(FeedEvent::Prices(
            parse_price_message(r#"{"btc": 50000}"#).expect("frame"),
        ))
        .await
        .expect("send");

    snapshots
        .wait_for(|snapshot| {
            snapshot.rows.iter().any(|row| row.mark == PriceMark::Up)
        })
        .await
        .expect("up mark published");
    assert_eq!(snapshots.borrow().feed, FeedStatus::Live);

    // Then: after the window passes the mark clears on its own
    advance(FLASH + Duration::from_millis(10)).await;
    snapshots
        .wait_for(|snapshot| {
            snapshot.rows.iter().all(|row| row.mark == PriceMark::Neutral)
        })
        .await
        .expect("mark cleared");

    // And: closing the feed ends the task with the last prices kept
    drop(events);
    let board = task.await.expect("board task");
    assert_eq!(board.row("btc").expect("btc").price(), 50_000.0);
    assert_eq!(snapshots.borrow().feed, FeedStatus::Disconnected);
}

// =============================================================================
// Feed pump into the board
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_socket_delivers_frames_board_reflects_them_in_order() {
    // Given: a socket that sends two btc prices then closes
    let frames = stream::iter(vec![
        Ok(Message::Text(String::from(r#"{"btc": 50000}"#))),
        Ok(Message::Text(String::from("not json"))),
        Ok(Message::Text(String::from(r#"{"btc": 49500}"#))),
        Ok(Message::Close(None)),
    ]);
    let (events, receiver) = mpsc::channel(8);
    let (_keep_open, mut shutdown) = oneshot::channel();

    // When: the pump forwards into the board task
    let (snapshots, task) = spawn_board(loaded_board().await, receiver);
    pump(frames, &events, &mut shutdown).await;
    drop(events);
    let board = task.await.expect("board task");

    // Then: the last frame wins and the malformed one was skipped
    assert_eq!(board.row("btc").expect("btc").price(), 49_500.0);
    assert!(board
        .rows()
        .iter()
        .all(|row| row.mark == PriceMark::Neutral));
    assert_eq!(snapshots.borrow().feed, FeedStatus::Disconnected);
}
