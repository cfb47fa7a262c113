//! WebSocket transport to the assistant broker.
//!
//! One socket carries classification RPCs and the trade and price push
//! channels. [`BrokerClient`] is a cheap, cloneable handle implementing the
//! service traits; the socket itself is owned by a background
//! [`ConnectionManager`] task.
//!
//! - [`subscription`] - outgoing subscribe/unsubscribe/classify messages
//! - [`handler`] - incoming message parsing
//! - [`connection`] - connection lifecycle and routing

mod connection;
mod handler;
mod subscription;

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::stream::{self, SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use tungstenite::Message;

use crate::models::{Intent, PingRequest, PriceTick, TradeUpdateBatch};
use crate::service::{FeedStream, IntentClassifier, PriceFeed, TradeFeed};
use crate::{LookoutError, Result};
pub use connection::{BrokerCommand, ConnectionManager, ConnectionStatus};
pub use handler::{Inbound, parse_message};

/// Write half of a broker WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a broker WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`LookoutError`](crate::LookoutError) if the connection or TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Sends a ping message to test connection liveness.
///
/// # Errors
///
/// Returns a [`LookoutError`](crate::LookoutError) if sending the message fails.
pub async fn ping(write: &mut WsWriter) -> Result<()> {
    let request = PingRequest::new();
    let json = serde_json::to_string(&request)?;
    write.send(Message::Text(json.into())).await?;
    debug!("Sent ping");

    Ok(())
}

/// Handle to the broker connection. Clones share one socket.
#[derive(Clone)]
pub struct BrokerClient {
    cmd_tx: mpsc::UnboundedSender<BrokerCommand>,
    next_key: Arc<AtomicU64>,
    status: watch::Receiver<ConnectionStatus>,
}

impl BrokerClient {
    /// Spawns the connection manager for `url` on the current runtime.
    ///
    /// The manager stops once every clone of the client has been dropped.
    pub fn spawn(url: impl Into<String>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let manager = ConnectionManager::new(url.into(), cmd_rx, status_tx);
        tokio::spawn(manager.run());

        Self {
            cmd_tx,
            next_key: Arc::new(AtomicU64::new(1)),
            status: status_rx,
        }
    }

    /// Current transport status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// A receiver that changes whenever the transport status does.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    fn key(&self) -> u64 {
        self.next_key.fetch_add(1, Ordering::Relaxed)
    }
}

impl IntentClassifier for BrokerClient {
    fn classify(&self, request: &str) -> FeedStream<Vec<Intent>> {
        let (reply, rx) = oneshot::channel();
        let cmd = BrokerCommand::Classify {
            request: request.to_string(),
            reply,
        };
        if self.cmd_tx.send(cmd).is_err() {
            return stream::once(async { Err(LookoutError::ServiceUnavailable("broker")) })
                .boxed();
        }

        stream::once(async move {
            rx.await.unwrap_or_else(|_| {
                Err(LookoutError::Transport(
                    "connection manager dropped the request".into(),
                ))
            })
        })
        .boxed()
    }
}

impl TradeFeed for BrokerClient {
    fn trade_updates(&self) -> FeedStream<TradeUpdateBatch> {
        let key = self.key();
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.cmd_tx.send(BrokerCommand::SubscribeTrades { key, tx });
        Feed::new(key, rx, self.cmd_tx.clone()).boxed()
    }
}

impl PriceFeed for BrokerClient {
    fn price_ticks(&self, symbol_pair: &str) -> FeedStream<PriceTick> {
        let key = self.key();
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.cmd_tx.send(BrokerCommand::SubscribePrices {
            key,
            symbol: symbol_pair.to_string(),
            tx,
        });
        Feed::new(key, rx, self.cmd_tx.clone()).boxed()
    }
}

/// Listener side of a push channel. Dropping it unsubscribes.
///
/// Ends when the connection manager goes away.
struct Feed<T> {
    key: u64,
    rx: mpsc::UnboundedReceiver<Result<T>>,
    cmd_tx: mpsc::UnboundedSender<BrokerCommand>,
}

impl<T> Feed<T> {
    fn new(
        key: u64,
        rx: mpsc::UnboundedReceiver<Result<T>>,
        cmd_tx: mpsc::UnboundedSender<BrokerCommand>,
    ) -> Self {
        Self { key, rx, cmd_tx }
    }
}

impl<T> Stream for Feed<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for Feed<T> {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(BrokerCommand::Unsubscribe { key: self.key });
    }
}
