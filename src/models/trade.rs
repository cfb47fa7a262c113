//! Trade blotter channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// An update message from the `trades` channel.
#[derive(Deserialize)]
pub struct TradeUpdateResponse {
    pub channel: String,
    #[serde(rename = "type")]
    pub tpe: String,
    pub data: TradeUpdateBatch,
}

/// A batch of trades pushed by the blotter service.
///
/// Batches are cumulative by `trade_id`: the same trade may appear again in
/// a later batch with a newer status.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TradeUpdateBatch {
    pub trades: Vec<TradeRecord>,
}

/// A single booked trade.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TradeRecord {
    pub trade_id: u64,
    /// Currency pair, e.g. `"EURUSD"`.
    pub symbol: String,
    pub dealt_currency: String,
    pub notional: Decimal,
    /// Trade date as `YYYY-MM-DD`.
    pub trade_date: String,
    /// Booking status (`"pending"`, `"done"`, `"rejected"`).
    pub status: String,
}
