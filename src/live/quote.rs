//! Inline spot quote: last value wins, no history.

use std::sync::Arc;

use tracing::{error, info};

use crate::models::{PriceTick, QuoteView};
use crate::service::{PriceFeed, Subscription};

/// A quote cell kept current by a price-tick subscription for one pair.
pub struct LiveQuote {
    feed: Option<Arc<dyn PriceFeed>>,
    symbol_pair: String,
    subscription: Subscription<PriceTick>,
    quote: Option<QuoteView>,
}

impl LiveQuote {
    /// Subscribes to ticks for `symbol_pair`. Without a feed no quote is
    /// ever shown.
    pub fn subscribe(feed: Option<Arc<dyn PriceFeed>>, symbol_pair: impl Into<String>) -> Self {
        let symbol_pair = symbol_pair.into();
        let subscription = open(feed.as_deref(), &symbol_pair);
        Self {
            feed,
            symbol_pair,
            subscription,
            quote: None,
        }
    }

    pub fn symbol_pair(&self) -> &str {
        &self.symbol_pair
    }

    /// The latest tick, or `None` if none has arrived yet.
    pub fn quote(&self) -> Option<&QuoteView> {
        self.quote.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_active()
    }

    /// Re-subscribes if `symbol_pair` differs from the current pair.
    pub fn set_pair(&mut self, symbol_pair: &str) {
        if symbol_pair == self.symbol_pair {
            return;
        }
        self.subscription.cancel();
        self.symbol_pair = symbol_pair.to_string();
        self.quote = None;
        self.subscription = open(self.feed.as_deref(), &self.symbol_pair);
    }

    /// Unsubscribes and forgets the last quote.
    pub fn close(&mut self) {
        self.subscription.cancel();
        self.quote = None;
    }

    /// Waits for the next tick and replaces the quote with it.
    ///
    /// Never resolves once the stream has ended or failed. Cancel-safe.
    pub async fn next_update(&mut self) {
        loop {
            match self.subscription.next().await {
                Some(Ok(tick)) => {
                    self.quote = Some(QuoteView::from(tick));
                    return;
                }
                Some(Err(e)) => {
                    error!(pair = %self.symbol_pair, "Error in price subscription: {e}");
                    self.subscription.cancel();
                }
                None => return std::future::pending().await,
            }
        }
    }
}

fn open(feed: Option<&dyn PriceFeed>, symbol_pair: &str) -> Subscription<PriceTick> {
    match feed {
        Some(feed) => Subscription::new("prices", feed.price_ticks(symbol_pair)),
        None => {
            info!(pair = symbol_pair, "Price feed not available, showing no quote");
            Subscription::closed("prices")
        }
    }
}
