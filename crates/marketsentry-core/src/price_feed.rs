//! # Price Feed
//!
//! One WebSocket connection pushing `{ "<identity>": <price>, ... }` frames.
//! [`PriceFeed::spawn`] runs the socket on a background task and forwards
//! parsed frames as [`FeedEvent`]s over an mpsc channel. Shutting the handle
//! down (or dropping it) closes the socket. A dropped connection is reported
//! once as [`FeedEvent::Disconnected`] and never reopened.

use std::collections::BTreeMap;

use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, warn};

use crate::domain::AssetIdentity;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("price feed connection failed: {0}")]
    Connect(#[source] tungstenite::Error),

    #[error("price feed transport error: {0}")]
    Transport(#[source] tungstenite::Error),

    #[error("price frame is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("price frame must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// Prices carried by one frame, keyed by lowercase identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceUpdate {
    prices: BTreeMap<AssetIdentity, f64>,
}

impl PriceUpdate {
    pub fn get(&self, identity: &str) -> Option<f64> {
        self.prices.get(identity).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetIdentity, f64)> {
        self.prices.iter().map(|(identity, price)| (identity, *price))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(AssetIdentity, f64)> for PriceUpdate {
    fn from_iter<I: IntoIterator<Item = (AssetIdentity, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

/// Parses one text frame.
///
/// Entries whose key is not a valid identity, or whose price is not a finite
/// non-negative number (numeric strings included), are dropped. Zero is kept.
pub fn parse_price_message(text: &str) -> Result<PriceUpdate, FeedError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(entries) = value else {
        return Err(FeedError::NotAnObject {
            kind: json_kind(&value),
        });
    };

    let mut prices = BTreeMap::new();
    for (key, raw) in entries {
        let Ok(identity) = AssetIdentity::parse(&key) else {
            debug!(key = %key, "ignoring price for malformed identity");
            continue;
        };
        match price_value(&raw) {
            Some(price) => {
                prices.insert(identity, price);
            }
            None => debug!(identity = %identity, "ignoring non-numeric price"),
        }
    }

    Ok(PriceUpdate { prices })
}

fn price_value(raw: &Value) -> Option<f64> {
    let price = match raw {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price >= 0.0).then_some(price)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connected,
    Prices(PriceUpdate),
    Disconnected,
}

/// Why [`pump`] stopped reading.
#[derive(Debug)]
pub enum PumpEnd {
    Shutdown,
    RemoteClosed,
    ReceiverGone,
    Failed(FeedError),
}

/// Forwards frames from `stream` to `events` until the socket ends, the
/// receiver goes away, or `shutdown` resolves.
///
/// Frames that fail to parse are logged and skipped.
pub async fn pump<S>(
    mut stream: S,
    events: &mpsc::Sender<FeedEvent>,
    shutdown: &mut oneshot::Receiver<()>,
) -> PumpEnd
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = &mut *shutdown => return PumpEnd::Shutdown,
            frame = stream.next() => frame,
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!("ignoring non-UTF-8 binary price frame");
                    continue;
                }
            },
            Some(Ok(Message::Close(_))) | None => return PumpEnd::RemoteClosed,
            Some(Ok(_)) => continue,
            Some(Err(error)) => return PumpEnd::Failed(FeedError::Transport(error)),
        };

        match parse_price_message(&text) {
            Ok(update) if update.is_empty() => debug!("price frame carried no usable prices"),
            Ok(update) => {
                if events.send(FeedEvent::Prices(update)).await.is_err() {
                    return PumpEnd::ReceiverGone;
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable price frame"),
        }
    }
}

/// Handle to the background socket task.
pub struct PriceFeed {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PriceFeed {
    pub fn spawn(url: impl Into<String>, events: mpsc::Sender<FeedEvent>) -> Self {
        let url = url.into();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(url, events, shutdown_rx));

        Self {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Closes the socket and waits for the task to exit.
    pub async fn shutdown(mut self) {
        if let Some(signal) = self.shutdown.take() {
            let _ = signal.send(());
        }
        if let Err(error) = (&mut self.task).await {
            error!(%error, "price feed task did not exit cleanly");
        }
    }
}

async fn run(url: String, events: mpsc::Sender<FeedEvent>, mut shutdown: oneshot::Receiver<()>) {
    info!(url = %url, "connecting to price feed");

    let connected = tokio::select! {
        _ = &mut shutdown => None,
        result = connect_async(url.as_str()) => Some(result),
    };

    let socket = match connected {
        None => return,
        Some(Ok((socket, _response))) => socket,
        Some(Err(error)) => {
            error!(error = %FeedError::Connect(error), "price feed unavailable");
            let _ = events.send(FeedEvent::Disconnected).await;
            return;
        }
    };

    info!("price feed connected");
    if events.send(FeedEvent::Connected).await.is_err() {
        return;
    }

    let (mut sink, stream) = socket.split();
    match pump(stream, &events, &mut shutdown).await {
        PumpEnd::Shutdown | PumpEnd::ReceiverGone => {
            if let Err(error) = sink.send(Message::Close(None)).await {
                debug!(%error, "price feed close frame not delivered");
            }
            info!("price feed closed");
        }
        PumpEnd::RemoteClosed => info!("price feed closed by server"),
        PumpEnd::Failed(error) => error!(%error, "price feed dropped"),
    }

    let _ = events.send(FeedEvent::Disconnected).await;
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    #[test]
    fn parses_prices_and_lowercases_keys() {
        let update = parse_price_message(r#"{"BTC": 50000, "eth": "3000.5"}"#).expect("object");

        assert_eq!(update.get("btc"), Some(50_000.0));
        assert_eq!(update.get("eth"), Some(3_000.5));
        assert_eq!(update.len(), 2);
    }

    #[test]
    fn drops_null_negative_and_text_prices_but_keeps_zero() {
        let update = parse_price_message(
            r#"{"btc": null, "eth": -1, "sol": "n/a", "doge": 0, "ada": true}"#,
        )
        .expect("object");

        assert_eq!(update.len(), 1);
        assert_eq!(update.get("doge"), Some(0.0));
    }

    #[test]
    fn non_object_frames_are_errors() {
        assert!(matches!(
            parse_price_message("[1,2]"),
            Err(FeedError::NotAnObject { kind: "array" })
        ));
        assert!(matches!(
            parse_price_message("nope"),
            Err(FeedError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn pump_forwards_usable_frames_and_skips_garbage() {
        let frames = stream::iter(vec![
            Ok(Message::Text(String::from("garbage"))),
            Ok(Message::Text(String::from(r#"{"btc": 50000}"#))),
            Ok(Message::Ping(Vec::new())),
            Ok(Message::Text(String::from(r#"{"btc": null}"#))),
            Ok(Message::Binary(br#"{"eth": 3000}"#.to_vec())),
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        let (_keep, mut shutdown) = oneshot::channel();

        let end = pump(frames, &tx, &mut shutdown).await;

        assert!(matches!(end, PumpEnd::RemoteClosed));
        let first = rx.recv().await.expect("first frame");
        let second = rx.recv().await.expect("second frame");
        assert!(matches!(first, FeedEvent::Prices(ref update) if update.get("btc") == Some(50_000.0)));
        assert!(matches!(second, FeedEvent::Prices(ref update) if update.get("eth") == Some(3_000.0)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn pump_stops_on_shutdown() {
        let frames = stream::pending::<Result<Message, tungstenite::Error>>();
        let (tx, _rx) = mpsc::channel(1);
        let (signal, mut shutdown) = oneshot::channel();
        signal.send(()).expect("receiver alive");

        let end = pump(frames, &tx, &mut shutdown).await;

        assert!(matches!(end, PumpEnd::Shutdown));
    }

    #[tokio::test]
    async fn spawned_feed_reports_its_lifecycle_and_closes_the_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut socket = tokio_tungstenite::accept_async(stream).await.expect("handshake");
            socket
                .send(Message::Text(String::from(r#"{"BTC": 50000}"#)))
                .await
                .expect("push frame");
            loop {
                match socket.next().await {
                    Some(Ok(Message::Close(frame))) => return Some(frame),
                    Some(Ok(_)) => continue,
                    Some(Err(_)) | None => return None,
                }
            }
        });

        let (tx, mut rx) = mpsc::channel(8);
        let feed = PriceFeed::spawn(format!("ws://{addr}"), tx);

        assert_eq!(rx.recv().await, Some(FeedEvent::Connected));
        let prices = rx.recv().await.expect("prices");
        assert!(matches!(prices, FeedEvent::Prices(ref update) if update.get("btc") == Some(50_000.0)));

        feed.shutdown().await;

        assert_eq!(rx.recv().await, Some(FeedEvent::Disconnected));
        let close = server.await.expect("server task");
        assert_eq!(close, Some(None));
    }
}
