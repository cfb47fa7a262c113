//! Live inline results for the intent currently shown.
//!
//! - [`trades`] - bounded, deduplicated, newest-first trade list
//! - [`quote`] - latest spot quote for one currency pair
//!
//! The two feeds are independent: no ordering holds between a trade
//! update and a quote update for the same intent.

pub mod quote;
pub mod trades;

use tracing::debug;

use crate::models::Intent;
use crate::service::Services;
pub use quote::LiveQuote;
pub use trades::{DEFAULT_MAX_TRADES, LiveTrades, TradeAggregator, TradeFilter, TradeView};

/// Which view changed in [`LiveResults::next_update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveUpdate {
    Quote,
    Trades,
}

/// The live views an intent asks for, each with its own subscription.
pub struct LiveResults {
    services: Services,
    default_cap: usize,
    quote: Option<LiveQuote>,
    trades: Option<LiveTrades>,
}

impl LiveResults {
    pub fn new(services: Services, default_cap: usize) -> Self {
        Self {
            services,
            default_cap,
            quote: None,
            trades: None,
        }
    }

    pub fn quote(&self) -> Option<&LiveQuote> {
        self.quote.as_ref()
    }

    pub fn trades(&self) -> Option<&LiveTrades> {
        self.trades.as_ref()
    }

    /// Points the views at `intent`. Subscriptions whose parameters did
    /// not change are kept; the rest are torn down and re-established.
    pub fn show(&mut self, intent: Option<&Intent>) {
        match (intent.and_then(Intent::quote_pair), self.quote.as_mut()) {
            (Some(pair), Some(quote)) => quote.set_pair(pair),
            (Some(pair), None) => {
                self.quote = Some(LiveQuote::subscribe(self.services.prices.clone(), pair));
            }
            (None, _) => {
                if let Some(mut quote) = self.quote.take() {
                    quote.close();
                }
            }
        }

        let filter = intent
            .filter(|intent| intent.wants_trades())
            .map(TradeFilter::from_intent);
        match (filter, self.trades.as_mut()) {
            (Some(filter), Some(trades)) => trades.set_filter(filter),
            (Some(filter), None) => {
                self.trades = Some(LiveTrades::subscribe(
                    self.services.trades.clone(),
                    filter,
                    self.default_cap,
                ));
            }
            (None, _) => {
                if let Some(mut trades) = self.trades.take() {
                    trades.close();
                }
            }
        }
    }

    /// Tears down both views.
    pub fn close(&mut self) {
        debug!("Closing live results");
        self.show(None);
    }

    /// Waits for either view to change. Never resolves while neither view
    /// has a live subscription. Cancel-safe.
    pub async fn next_update(&mut self) -> LiveUpdate {
        let quote = self.quote.as_mut();
        let trades = self.trades.as_mut();

        let quote_update = async move {
            match quote {
                Some(quote) => quote.next_update().await,
                None => std::future::pending().await,
            }
        };
        let trades_update = async move {
            match trades {
                Some(trades) => trades.next_update().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            () = quote_update => LiveUpdate::Quote,
            () = trades_update => LiveUpdate::Trades,
        }
    }
}
