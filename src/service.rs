//! Collaborator contracts consumed by the search and live-feed cores.
//!
//! The transport behind these traits is shared read-only by every call
//! site; each call site owns its own [`Subscription`] and tears it down
//! independently.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tracing::{debug, info};

use crate::models::{Intent, PriceTick, TradeUpdateBatch};

/// A push stream from the backend. Items may carry transport errors.
pub type FeedStream<T> = BoxStream<'static, crate::Result<T>>;

/// NLP classification service.
pub trait IntentClassifier: Send + Sync {
    /// Classifies `request`. The stream emits at most one candidate list,
    /// then completes.
    fn classify(&self, request: &str) -> FeedStream<Vec<Intent>>;
}

/// Blotter service pushing cumulative trade batches until dropped.
pub trait TradeFeed: Send + Sync {
    fn trade_updates(&self) -> FeedStream<TradeUpdateBatch>;
}

/// Pricing service pushing spot ticks for one pair until dropped.
pub trait PriceFeed: Send + Sync {
    fn price_ticks(&self, symbol_pair: &str) -> FeedStream<PriceTick>;
}

/// Fire-and-forget action run when the user confirms a shown intent.
pub trait IntentHandler: Send + Sync {
    fn handle_intent(&self, intent: &Intent);
}

/// Service handles available to the cores. Any of them may be absent,
/// e.g. before the transport is initialized.
#[derive(Clone, Default)]
pub struct Services {
    pub classifier: Option<Arc<dyn IntentClassifier>>,
    pub trades: Option<Arc<dyn TradeFeed>>,
    pub prices: Option<Arc<dyn PriceFeed>>,
    pub intent_handler: Option<Arc<dyn IntentHandler>>,
}

impl Services {
    /// Creates an empty set of services.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    #[must_use]
    pub fn with_trades(mut self, trades: Arc<dyn TradeFeed>) -> Self {
        self.trades = Some(trades);
        self
    }

    #[must_use]
    pub fn with_prices(mut self, prices: Arc<dyn PriceFeed>) -> Self {
        self.prices = Some(prices);
        self
    }

    #[must_use]
    pub fn with_intent_handler(mut self, handler: Arc<dyn IntentHandler>) -> Self {
        self.intent_handler = Some(handler);
        self
    }
}

/// Handle to one live push-stream subscription.
///
/// Acquired when a view starts listening and released with
/// [`cancel`](Self::cancel) (or by dropping the handle). After release no
/// further items are yielded.
pub struct Subscription<T> {
    name: &'static str,
    stream: Option<FeedStream<T>>,
}

impl<T> Subscription<T> {
    /// Wraps an already-opened stream.
    pub fn new(name: &'static str, stream: FeedStream<T>) -> Self {
        info!(subscription = name, "Subscribed");
        Self {
            name,
            stream: Some(stream),
        }
    }

    /// A subscription that never yields, used when the service is absent.
    pub fn closed(name: &'static str) -> Self {
        Self { name, stream: None }
    }

    /// Returns `true` until the stream ends or is cancelled.
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Releases the stream. Safe to call more than once.
    pub fn cancel(&mut self) {
        if self.stream.take().is_some() {
            info!(subscription = self.name, "Unsubscribed");
        }
    }

    /// Receives the next item, or `None` once the stream has ended or been
    /// cancelled. Cancel-safe.
    pub async fn next(&mut self) -> Option<crate::Result<T>> {
        let stream = self.stream.as_mut()?;
        let item = stream.next().await;
        if item.is_none() {
            debug!(subscription = self.name, "Stream completed");
            self.stream = None;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn yields_items_then_none() {
        let mut sub = Subscription::new("test", stream::iter(vec![Ok(1), Ok(2)]).boxed());

        assert_eq!(sub.next().await.unwrap().unwrap(), 1);
        assert_eq!(sub.next().await.unwrap().unwrap(), 2);
        assert!(sub.next().await.is_none());
        assert!(!sub.is_active());
    }

    #[tokio::test]
    async fn cancelled_subscription_yields_nothing() {
        let mut sub = Subscription::new("test", stream::iter(vec![Ok(1)]).boxed());
        sub.cancel();
        sub.cancel();

        assert!(!sub.is_active());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn closed_subscription_is_inactive() {
        let mut sub: Subscription<u8> = Subscription::closed("test");
        assert!(!sub.is_active());
        assert!(sub.next().await.is_none());
    }
}
