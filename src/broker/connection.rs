//! WebSocket connection lifecycle management.
//!
//! [`ConnectionManager`] owns the socket. It handles connecting, reading
//! messages, automatic reconnection with exponential backoff, and
//! re-subscription to every channel that still has a listener after each
//! reconnect. Call sites talk to it only through [`BrokerCommand`]s.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use tungstenite::Message as WsMessage;

use super::handler::{Inbound, parse_message};
use super::{WsReader, WsWriter, connect, ping, subscription};
use crate::models::{Channel, Intent, PriceTick, TradeUpdateBatch};
use crate::{LookoutError, Result};

/// Initial backoff duration between reconnection attempts.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff duration between reconnection attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Transport connection status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
}

impl ConnectionStatus {
    /// Returns a display string for the status.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Online",
            ConnectionStatus::Disconnected => "Offline",
            ConnectionStatus::Reconnecting => "Reconnecting...",
        }
    }
}

/// Commands sent from call sites to the connection manager.
pub enum BrokerCommand {
    /// Classify a request; the reply goes to `reply`.
    Classify {
        request: String,
        reply: oneshot::Sender<Result<Vec<Intent>>>,
    },
    /// Start forwarding trade batches to `tx`.
    SubscribeTrades {
        key: u64,
        tx: mpsc::UnboundedSender<Result<TradeUpdateBatch>>,
    },
    /// Start forwarding ticks for `symbol` to `tx`.
    SubscribePrices {
        key: u64,
        symbol: String,
        tx: mpsc::UnboundedSender<Result<PriceTick>>,
    },
    /// The listener registered under `key` went away.
    Unsubscribe { key: u64 },
}

/// Why the reader loop exited.
enum DisconnectReason {
    /// The connection was lost or errored.
    ConnectionError,
    /// Every client handle was dropped.
    Shutdown,
}

/// Manages the WebSocket connection and routes traffic to listeners.
pub struct ConnectionManager {
    url: String,
    cmd_rx: mpsc::UnboundedReceiver<BrokerCommand>,
    status: watch::Sender<ConnectionStatus>,
    next_req_id: u64,
    pending: HashMap<u64, oneshot::Sender<Result<Vec<Intent>>>>,
    trade_listeners: HashMap<u64, mpsc::UnboundedSender<Result<TradeUpdateBatch>>>,
    price_listeners: HashMap<u64, (String, mpsc::UnboundedSender<Result<PriceTick>>)>,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    #[must_use]
    pub fn new(
        url: String,
        cmd_rx: mpsc::UnboundedReceiver<BrokerCommand>,
        status: watch::Sender<ConnectionStatus>,
    ) -> Self {
        Self {
            url,
            cmd_rx,
            status,
            next_req_id: 1,
            pending: HashMap::new(),
            trade_listeners: HashMap::new(),
            price_listeners: HashMap::new(),
        }
    }

    /// Runs the connection manager loop until every client handle is
    /// dropped.
    ///
    /// Connects to the WebSocket, reads messages, and automatically
    /// reconnects with exponential backoff on disconnection.
    pub async fn run(mut self) {
        let mut backoff = INITIAL_BACKOFF;
        let mut first_attempt = true;

        loop {
            if !first_attempt {
                self.set_status(ConnectionStatus::Reconnecting);
            }
            first_attempt = false;

            info!(url = %self.url, "Connecting to WebSocket");
            let (mut write, read) = match connect(&self.url).await {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Connection failed: {e}");
                    self.set_status(ConnectionStatus::Disconnected);
                    if !self.back_off(backoff).await {
                        return;
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };

            if let Err(e) = ping(&mut write).await {
                warn!("Ping failed: {e}");
                self.set_status(ConnectionStatus::Disconnected);
                if !self.back_off(backoff).await {
                    return;
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
                continue;
            }

            self.resubscribe_all(&mut write).await;
            self.set_status(ConnectionStatus::Connected);
            info!("WebSocket connected and subscribed");
            backoff = INITIAL_BACKOFF;

            let reason = self.read_loop(&mut write, read).await;
            self.fail_pending("connection lost");

            match reason {
                DisconnectReason::ConnectionError => {
                    self.set_status(ConnectionStatus::Disconnected);
                    info!(
                        backoff_secs = backoff.as_secs(),
                        "Connection lost, backing off"
                    );
                    if !self.back_off(backoff).await {
                        return;
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                DisconnectReason::Shutdown => {
                    info!("Connection manager shutting down");
                    return;
                }
            }
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }

    /// Sleeps for `backoff` while still serving commands offline. Returns
    /// `false` if the client side shut down meanwhile.
    async fn back_off(&mut self, backoff: Duration) -> bool {
        let sleep = tokio::time::sleep(backoff);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return true,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd, None).await,
                    None => return false,
                },
            }
        }
    }

    /// Subscribes to every channel that still has a listener.
    async fn resubscribe_all(&mut self, write: &mut WsWriter) {
        self.prune_listeners();

        if !self.trade_listeners.is_empty()
            && let Err(e) = subscription::subscribe(write, Channel::Trades, None).await
        {
            warn!("Failed to subscribe to trades: {e}");
        }

        let mut symbols: Vec<&str> = self
            .price_listeners
            .values()
            .map(|(symbol, _)| symbol.as_str())
            .collect();
        symbols.sort_unstable();
        symbols.dedup();
        for symbol in symbols {
            if let Err(e) = subscription::subscribe(write, Channel::Prices, Some(symbol)).await {
                warn!(symbol, "Failed to subscribe to prices: {e}");
            }
        }
    }

    /// Reads messages from the WebSocket until disconnection or shutdown.
    async fn read_loop(&mut self, write: &mut WsWriter, mut read: WsReader) -> DisconnectReason {
        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            match serde_json::from_str::<serde_json::Value>(&text) {
                                Ok(value) => {
                                    if let Some(inbound) = parse_message(value) {
                                        self.route(inbound);
                                    }
                                }
                                Err(e) => debug!("Ignoring malformed message: {e}"),
                            }
                        }
                        Some(Ok(_)) => {} // Binary/Ping/Pong/Close frames
                        Some(Err(e)) => {
                            warn!("WebSocket error: {e}");
                            return DisconnectReason::ConnectionError;
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return DisconnectReason::ConnectionError;
                        }
                    }
                }

                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd, Some(write)).await,
                        None => return DisconnectReason::Shutdown,
                    }
                }
            }
        }
    }

    /// Applies a command. `write` is `None` while offline.
    async fn handle_command(&mut self, cmd: BrokerCommand, write: Option<&mut WsWriter>) {
        match cmd {
            BrokerCommand::Classify { request, reply } => {
                let Some(write) = write else {
                    let _ = reply.send(Err(LookoutError::Transport("not connected".into())));
                    return;
                };
                self.pending.retain(|_, tx| !tx.is_closed());
                let req_id = self.next_req_id;
                self.next_req_id += 1;
                match subscription::classify(write, &request, req_id).await {
                    Ok(()) => {
                        self.pending.insert(req_id, reply);
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            BrokerCommand::SubscribeTrades { key, tx } => {
                let first = self.trade_listeners.is_empty();
                self.trade_listeners.insert(key, tx);
                if first && let Some(write) = write {
                    if let Err(e) = subscription::subscribe(write, Channel::Trades, None).await {
                        warn!("Failed to subscribe to trades: {e}");
                    }
                }
            }
            BrokerCommand::SubscribePrices { key, symbol, tx } => {
                let first = !self.price_listeners.values().any(|(s, _)| *s == symbol);
                if first && let Some(write) = write {
                    if let Err(e) = subscription::subscribe(write, Channel::Prices, Some(&symbol)).await {
                        warn!(%symbol, "Failed to subscribe to prices: {e}");
                    }
                }
                self.price_listeners.insert(key, (symbol, tx));
            }
            BrokerCommand::Unsubscribe { key } => {
                if self.trade_listeners.remove(&key).is_some() {
                    if self.trade_listeners.is_empty()
                        && let Some(write) = write
                        && let Err(e) = subscription::unsubscribe(write, Channel::Trades, None).await
                    {
                        warn!("Failed to unsubscribe from trades: {e}");
                    }
                } else if let Some((symbol, _)) = self.price_listeners.remove(&key) {
                    let last = !self.price_listeners.values().any(|(s, _)| *s == symbol);
                    if last
                        && let Some(write) = write
                        && let Err(e) =
                            subscription::unsubscribe(write, Channel::Prices, Some(&symbol)).await
                    {
                        warn!(%symbol, "Failed to unsubscribe from prices: {e}");
                    }
                }
            }
        }
    }

    /// Delivers an inbound message to its listeners.
    fn route(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Classified(reply) => {
                let Some(tx) = self.pending.remove(&reply.req_id) else {
                    debug!(req_id = reply.req_id, "Dropping reply for abandoned request");
                    return;
                };
                let result = if reply.success {
                    Ok(reply.result)
                } else {
                    Err(LookoutError::Transport(
                        reply.error.unwrap_or_else(|| "classification failed".into()),
                    ))
                };
                let _ = tx.send(result);
            }
            // Closed listeners stay registered until their `Unsubscribe`
            // arrives, so the last one out still unsubscribes on the wire.
            Inbound::Trades(batch) => {
                for tx in self.trade_listeners.values() {
                    let _ = tx.send(Ok(batch.clone()));
                }
            }
            Inbound::Prices(ticks) => {
                for tick in ticks {
                    for (symbol, tx) in self.price_listeners.values() {
                        if *symbol == tick.symbol {
                            let _ = tx.send(Ok(tick.clone()));
                        }
                    }
                }
            }
            Inbound::Heartbeat => debug!("Heartbeat"),
        }
    }

    /// Fails every outstanding classification.
    fn fail_pending(&mut self, reason: &str) {
        for (_, tx) in self.pending.drain() {
            let _ = tx.send(Err(LookoutError::Transport(reason.to_string())));
        }
    }

    fn prune_listeners(&mut self) {
        self.trade_listeners.retain(|_, tx| !tx.is_closed());
        self.price_listeners.retain(|_, (_, tx)| !tx.is_closed());
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn manager() -> ConnectionManager {
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(ConnectionStatus::default());
        ConnectionManager::new("ws://localhost:0".into(), cmd_rx, status)
    }

    #[tokio::test]
    async fn closed_trade_listener_waits_for_unsubscribe() {
        let mut manager = manager();
        let (tx, rx) = mpsc::unbounded_channel();
        manager
            .handle_command(BrokerCommand::SubscribeTrades { key: 1, tx }, None)
            .await;
        drop(rx);

        manager.route(Inbound::Trades(TradeUpdateBatch::default()));
        assert!(manager.trade_listeners.contains_key(&1));

        manager
            .handle_command(BrokerCommand::Unsubscribe { key: 1 }, None)
            .await;
        assert!(manager.trade_listeners.is_empty());
    }

    #[tokio::test]
    async fn closed_price_listener_waits_for_unsubscribe() {
        let mut manager = manager();
        let (tx, rx) = mpsc::unbounded_channel();
        manager
            .handle_command(
                BrokerCommand::SubscribePrices {
                    key: 7,
                    symbol: "EURUSD".into(),
                    tx,
                },
                None,
            )
            .await;
        drop(rx);

        manager.route(Inbound::Prices(vec![PriceTick {
            symbol: "EURUSD".into(),
            mid: dec!(1.0842),
        }]));
        assert!(manager.price_listeners.contains_key(&7));
    }

    #[tokio::test]
    async fn ticks_reach_only_their_symbol() {
        let mut manager = manager();
        let (eur_tx, mut eur_rx) = mpsc::unbounded_channel();
        let (gbp_tx, mut gbp_rx) = mpsc::unbounded_channel();
        for (key, symbol, tx) in [(1, "EURUSD", eur_tx), (2, "GBPUSD", gbp_tx)] {
            manager
                .handle_command(
                    BrokerCommand::SubscribePrices {
                        key,
                        symbol: symbol.into(),
                        tx,
                    },
                    None,
                )
                .await;
        }

        manager.route(Inbound::Prices(vec![PriceTick {
            symbol: "GBPUSD".into(),
            mid: dec!(1.2661),
        }]));

        assert_eq!(gbp_rx.try_recv().unwrap().unwrap().mid, dec!(1.2661));
        assert!(eur_rx.try_recv().is_err());
    }
}
