//! Inline trade blotter.
//!
//! [`TradeAggregator`] folds cumulative trade batches into a map keyed by
//! trade id and derives a filtered, newest-first, capped [`TradeView`]
//! after every batch. [`LiveTrades`] binds an aggregator to one blotter
//! subscription for the lifetime of one intent's filter.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::models::{Intent, TradeRecord, TradeUpdateBatch};
use crate::service::{Subscription, TradeFeed};

/// Cap applied when the intent names no count.
pub const DEFAULT_MAX_TRADES: usize = 20;

/// Which trades an intent asked to see.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TradeFilter {
    pub dealt_currency: Option<String>,
    /// Currency pair, e.g. `"EURUSD"`.
    pub symbol: Option<String>,
    pub max_count: Option<usize>,
}

impl TradeFilter {
    /// Derives the filter from the intent's extracted parameters.
    pub fn from_intent(intent: &Intent) -> Self {
        let params = &intent.parameters;
        Self {
            dealt_currency: params.currency.clone(),
            symbol: params.currency_pair.clone(),
            max_count: params.number,
        }
    }

    /// Returns `true` if `trade` passes every constraint that is set.
    pub fn matches(&self, trade: &TradeRecord) -> bool {
        let currency_ok = self
            .dealt_currency
            .as_deref()
            .is_none_or(|ccy| trade.dealt_currency.eq_ignore_ascii_case(ccy));
        let symbol_ok = self
            .symbol
            .as_deref()
            .is_none_or(|pair| trade.symbol.eq_ignore_ascii_case(pair));
        currency_ok && symbol_ok
    }
}

/// Derived view: matching trades, newest first, capped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TradeView {
    pub trades: Vec<TradeRecord>,
    /// Matching trades before the cap was applied.
    pub total: usize,
}

impl TradeView {
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// "Showing N of M trades".
    pub fn summary(&self) -> String {
        format!("Showing {} of {} trades", self.trades.len(), self.total)
    }
}

/// Accumulates trades by id and derives the view for one filter.
pub struct TradeAggregator {
    filter: TradeFilter,
    default_cap: usize,
    /// trade id -> (arrival sequence of the latest update, record)
    trades: HashMap<u64, (u64, TradeRecord)>,
    sequence: u64,
}

impl TradeAggregator {
    pub fn new(filter: TradeFilter, default_cap: usize) -> Self {
        Self {
            filter,
            default_cap,
            trades: HashMap::new(),
            sequence: 0,
        }
    }

    pub fn filter(&self) -> &TradeFilter {
        &self.filter
    }

    /// Number of distinct trades seen so far, ignoring the filter.
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Merges a batch. Later records overwrite earlier ones with the same
    /// id and count as the newest arrival.
    pub fn apply(&mut self, batch: TradeUpdateBatch) {
        for trade in batch.trades {
            self.sequence += 1;
            self.trades.insert(trade.trade_id, (self.sequence, trade));
        }
    }

    /// Filters the full accumulated set, orders it newest first, then caps.
    pub fn view(&self) -> TradeView {
        let mut matching: Vec<&(u64, TradeRecord)> = self
            .trades
            .values()
            .filter(|(_, trade)| self.filter.matches(trade))
            .collect();
        matching.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        let total = matching.len();
        let cap = self.filter.max_count.unwrap_or(self.default_cap);
        let trades = matching
            .into_iter()
            .take(cap)
            .map(|(_, trade)| trade.clone())
            .collect();

        TradeView { trades, total }
    }
}

/// A trade view kept current by a live blotter subscription.
pub struct LiveTrades {
    feed: Option<Arc<dyn TradeFeed>>,
    aggregator: TradeAggregator,
    subscription: Subscription<TradeUpdateBatch>,
    view: TradeView,
}

impl LiveTrades {
    /// Subscribes to the blotter for `filter`. Without a feed the view
    /// stays empty.
    pub fn subscribe(
        feed: Option<Arc<dyn TradeFeed>>,
        filter: TradeFilter,
        default_cap: usize,
    ) -> Self {
        let subscription = open(feed.as_deref());
        Self {
            feed,
            aggregator: TradeAggregator::new(filter, default_cap),
            subscription,
            view: TradeView::default(),
        }
    }

    pub fn view(&self) -> &TradeView {
        &self.view
    }

    pub fn filter(&self) -> &TradeFilter {
        self.aggregator.filter()
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_active()
    }

    /// Switches to a new filter. The subscription is re-established and
    /// nothing accumulated under the old filter survives.
    pub fn set_filter(&mut self, filter: TradeFilter) {
        if &filter == self.aggregator.filter() {
            return;
        }
        self.subscription.cancel();
        let default_cap = self.aggregator.default_cap;
        self.aggregator = TradeAggregator::new(filter, default_cap);
        self.view = TradeView::default();
        self.subscription = open(self.feed.as_deref());
    }

    /// Unsubscribes and drops everything accumulated.
    pub fn close(&mut self) {
        self.subscription.cancel();
        let default_cap = self.aggregator.default_cap;
        self.aggregator = TradeAggregator::new(self.aggregator.filter.clone(), default_cap);
        self.view = TradeView::default();
    }

    /// Waits for the next batch and rebuilds the view.
    ///
    /// Never resolves once the stream has ended or failed. Cancel-safe.
    pub async fn next_update(&mut self) {
        loop {
            match self.subscription.next().await {
                Some(Ok(batch)) => {
                    self.aggregator.apply(batch);
                    self.view = self.aggregator.view();
                    debug!(
                        shown = self.view.trades.len(),
                        total = self.view.total,
                        "{}",
                        self.view.summary()
                    );
                    return;
                }
                Some(Err(e)) => {
                    error!("Error in trade blotter subscription: {e}");
                    self.subscription.cancel();
                }
                None => return std::future::pending().await,
            }
        }
    }
}

fn open(feed: Option<&dyn TradeFeed>) -> Subscription<TradeUpdateBatch> {
    match feed {
        Some(feed) => Subscription::new("trades", feed.trade_updates()),
        None => {
            info!("Trade feed not available, showing no trades");
            Subscription::closed("trades")
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{IntentKind, IntentParameters};

    fn trade(id: u64, symbol: &str, status: &str) -> TradeRecord {
        TradeRecord {
            trade_id: id,
            symbol: symbol.to_string(),
            dealt_currency: symbol[..3].to_string(),
            notional: dec!(1000000),
            trade_date: "2024-03-01".to_string(),
            status: status.to_string(),
        }
    }

    fn batch(trades: Vec<TradeRecord>) -> TradeUpdateBatch {
        TradeUpdateBatch { trades }
    }

    fn ids(view: &TradeView) -> Vec<u64> {
        view.trades.iter().map(|t| t.trade_id).collect()
    }

    #[test]
    fn later_batches_overwrite_and_reorder() {
        let mut aggregator = TradeAggregator::new(TradeFilter::default(), DEFAULT_MAX_TRADES);
        aggregator.apply(batch(vec![
            trade(1, "EURUSD", "pending"),
            trade(2, "GBPUSD", "done"),
        ]));
        aggregator.apply(batch(vec![
            trade(1, "EURUSD", "done"),
            trade(3, "USDJPY", "done"),
        ]));

        let view = aggregator.view();
        assert_eq!(ids(&view), vec![3, 1, 2]);
        assert_eq!(view.trades[1].status, "done");
        assert_eq!(view.total, 3);
    }

    #[test]
    fn cap_applies_after_filtering() {
        let filter = TradeFilter {
            max_count: Some(2),
            ..Default::default()
        };
        let mut aggregator = TradeAggregator::new(filter, DEFAULT_MAX_TRADES);
        aggregator.apply(batch(vec![
            trade(1, "EURUSD", "pending"),
            trade(2, "GBPUSD", "done"),
        ]));
        aggregator.apply(batch(vec![
            trade(1, "EURUSD", "done"),
            trade(3, "USDJPY", "done"),
        ]));

        let view = aggregator.view();
        assert_eq!(ids(&view), vec![3, 1]);
        assert_eq!(view.summary(), "Showing 2 of 3 trades");
    }

    #[test]
    fn filter_sees_trades_from_earlier_batches() {
        let filter = TradeFilter {
            symbol: Some("EURUSD".into()),
            ..Default::default()
        };
        let mut aggregator = TradeAggregator::new(filter, DEFAULT_MAX_TRADES);
        aggregator.apply(batch(vec![trade(1, "EURUSD", "done")]));
        aggregator.apply(batch(vec![trade(2, "GBPUSD", "done")]));

        let view = aggregator.view();
        assert_eq!(ids(&view), vec![1]);
        assert_eq!(view.total, 1);
        assert_eq!(aggregator.len(), 2);
    }

    #[test]
    fn default_cap_limits_view() {
        let mut aggregator = TradeAggregator::new(TradeFilter::default(), DEFAULT_MAX_TRADES);
        aggregator.apply(batch((1..=30).map(|id| trade(id, "EURUSD", "done")).collect()));

        let view = aggregator.view();
        assert_eq!(view.trades.len(), DEFAULT_MAX_TRADES);
        assert_eq!(view.total, 30);
        assert_eq!(view.trades[0].trade_id, 30);
    }

    #[test]
    fn empty_aggregator_yields_empty_view() {
        let aggregator = TradeAggregator::new(TradeFilter::default(), DEFAULT_MAX_TRADES);
        let view = aggregator.view();
        assert!(view.is_empty());
        assert_eq!(view.total, 0);
    }

    #[test]
    fn filter_from_intent_parameters() {
        let intent = Intent::new(
            IntentKind::TradeInfo,
            IntentParameters {
                currency: Some("EUR".into()),
                currency_pair: None,
                number: Some(5),
            },
        );
        let filter = TradeFilter::from_intent(&intent);

        assert_eq!(filter.dealt_currency.as_deref(), Some("EUR"));
        assert_eq!(filter.symbol, None);
        assert_eq!(filter.max_count, Some(5));
        assert!(filter.matches(&trade(1, "EURUSD", "done")));
        assert!(!filter.matches(&trade(2, "GBPUSD", "done")));
    }
}
