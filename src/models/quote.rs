//! Spot price channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// An update message from the `prices` channel.
#[derive(Deserialize)]
pub struct PriceUpdateResponse {
    pub channel: String,
    #[serde(rename = "type")]
    pub tpe: String,
    pub data: Vec<PriceTick>,
}

/// A single spot price tick.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub mid: Decimal,
}

/// The latest quote for one currency pair. Replaced wholesale on every tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteView {
    pub symbol: String,
    pub mid: Decimal,
}

impl QuoteView {
    /// First three letters of the pair, e.g. `"EUR"` for `"EURUSD"`.
    pub fn base_currency(&self) -> &str {
        self.symbol.get(..3).unwrap_or(&self.symbol)
    }

    /// Remainder of the pair after the base currency.
    pub fn counter_currency(&self) -> &str {
        self.symbol.get(3..).unwrap_or("")
    }
}

impl From<PriceTick> for QuoteView {
    fn from(tick: PriceTick) -> Self {
        Self {
            symbol: tick.symbol,
            mid: tick.mid,
        }
    }
}
