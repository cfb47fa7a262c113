//! Shared test utilities: in-memory collaborators and fixtures.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use rust_decimal_macros::dec;
use tokio::sync::{mpsc, oneshot};

use lookout::LookoutError;
use lookout::models::{Intent, IntentKind, IntentParameters, PriceTick, TradeRecord, TradeUpdateBatch};
use lookout::service::{FeedStream, IntentClassifier, IntentHandler, PriceFeed, TradeFeed};

type Reply = oneshot::Sender<lookout::Result<Vec<Intent>>>;

/// Classifier whose replies are sent by the test, one per call.
#[derive(Default)]
pub struct ManualClassifier {
    calls: Mutex<Vec<(String, Option<Reply>)>>,
}

impl ManualClassifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Request texts in call order.
    pub fn requests(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    /// Completes call `index`. Returns `false` if the caller already
    /// dropped the reply stream.
    pub fn reply(&self, index: usize, result: lookout::Result<Vec<Intent>>) -> bool {
        let reply = self.calls.lock().unwrap()[index].1.take();
        reply.is_some_and(|tx| tx.send(result).is_ok())
    }

    /// Whether the caller still waits on call `index`.
    pub fn is_waiting(&self, index: usize) -> bool {
        self.calls.lock().unwrap()[index]
            .1
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

impl IntentClassifier for ManualClassifier {
    fn classify(&self, request: &str) -> FeedStream<Vec<Intent>> {
        let (tx, rx) = oneshot::channel();
        self.calls
            .lock()
            .unwrap()
            .push((request.to_string(), Some(tx)));
        stream::once(async move {
            rx.await
                .unwrap_or_else(|_| Err(LookoutError::Transport("reply dropped".into())))
        })
        .boxed()
    }
}

fn receiver_stream<T: Send + 'static>(
    rx: mpsc::UnboundedReceiver<lookout::Result<T>>,
) -> FeedStream<T> {
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
}

/// Trade feed backed by one channel per subscription.
#[derive(Default)]
pub struct ChannelTradeFeed {
    senders: Mutex<Vec<mpsc::UnboundedSender<lookout::Result<TradeUpdateBatch>>>>,
}

impl ChannelTradeFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscriptions(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    /// Whether subscription `index` is still held by its caller.
    pub fn is_open(&self, index: usize) -> bool {
        !self.senders.lock().unwrap()[index].is_closed()
    }

    /// Pushes to the newest subscription.
    pub fn push(&self, trades: Vec<TradeRecord>) {
        let senders = self.senders.lock().unwrap();
        if let Some(tx) = senders.last() {
            let _ = tx.send(Ok(TradeUpdateBatch { trades }));
        }
    }

    pub fn fail(&self, message: &str) {
        let senders = self.senders.lock().unwrap();
        if let Some(tx) = senders.last() {
            let _ = tx.send(Err(LookoutError::Transport(message.to_string())));
        }
    }

    /// Ends every stream.
    pub fn close_all(&self) {
        self.senders.lock().unwrap().clear();
    }
}

impl TradeFeed for ChannelTradeFeed {
    fn trade_updates(&self) -> FeedStream<TradeUpdateBatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        receiver_stream(rx)
    }
}

/// Price feed backed by one channel per subscription.
#[derive(Default)]
pub struct ChannelPriceFeed {
    senders: Mutex<Vec<(String, mpsc::UnboundedSender<lookout::Result<PriceTick>>)>>,
}

impl ChannelPriceFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pairs requested, in subscription order.
    pub fn pairs(&self) -> Vec<String> {
        self.senders
            .lock()
            .unwrap()
            .iter()
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    pub fn is_open(&self, index: usize) -> bool {
        !self.senders.lock().unwrap()[index].1.is_closed()
    }

    /// Pushes a tick to every open subscription for `symbol`.
    pub fn tick(&self, symbol: &str, mid: rust_decimal::Decimal) {
        for (pair, tx) in self.senders.lock().unwrap().iter() {
            if pair == symbol {
                let _ = tx.send(Ok(PriceTick {
                    symbol: symbol.to_string(),
                    mid,
                }));
            }
        }
    }
}

impl PriceFeed for ChannelPriceFeed {
    fn price_ticks(&self, symbol_pair: &str) -> FeedStream<PriceTick> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders
            .lock()
            .unwrap()
            .push((symbol_pair.to_string(), tx));
        receiver_stream(rx)
    }
}

/// Intent handler that records what it was given.
#[derive(Default)]
pub struct RecordingHandler {
    pub handled: Mutex<Vec<Intent>>,
}

impl IntentHandler for RecordingHandler {
    fn handle_intent(&self, intent: &Intent) {
        self.handled.lock().unwrap().push(intent.clone());
    }
}

pub fn spot_quote(pair: &str) -> Intent {
    Intent::new(
        IntentKind::SpotQuote,
        IntentParameters {
            currency_pair: Some(pair.to_string()),
            ..Default::default()
        },
    )
}

pub fn trade_info(currency: Option<&str>, number: Option<usize>) -> Intent {
    Intent::new(
        IntentKind::TradeInfo,
        IntentParameters {
            currency: currency.map(String::from),
            number,
            ..Default::default()
        },
    )
}

pub fn trade(id: u64, symbol: &str, status: &str) -> TradeRecord {
    TradeRecord {
        trade_id: id,
        symbol: symbol.to_string(),
        dealt_currency: symbol[..3].to_string(),
        notional: dec!(1000000),
        trade_date: "2024-03-01".to_string(),
        status: status.to_string(),
    }
}

/// Generous wait for events that should arrive without time passing.
pub const SHORT: Duration = Duration::from_millis(10);
