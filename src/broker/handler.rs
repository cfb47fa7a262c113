//! Incoming message parsing.

use serde_json::Value;
use tracing::debug;

use crate::models::quote::PriceUpdateResponse;
use crate::models::trade::TradeUpdateResponse;
use crate::models::{ClassifyResponse, PriceTick, TradeUpdateBatch};

/// A routed message from the backend.
#[derive(Debug)]
pub enum Inbound {
    Classified(ClassifyResponse),
    Trades(TradeUpdateBatch),
    Prices(Vec<PriceTick>),
    Heartbeat,
}

/// Routes a parsed JSON message. Returns `None` for pongs, subscription
/// acknowledgements and anything unrecognized.
pub fn parse_message(value: Value) -> Option<Inbound> {
    let method = value.get("method").and_then(|m| m.as_str());
    let channel = value.get("channel").and_then(|c| c.as_str());

    // RPC replies are routed by method
    if let Some(method) = method {
        return match method {
            "classify" => serde_json::from_value(value).ok().map(Inbound::Classified),
            _ => None,
        };
    }

    let Some(channel) = channel else {
        debug!("Ignoring message without method or channel");
        return None;
    };

    match channel {
        "heartbeat" => Some(Inbound::Heartbeat),
        "trades" => serde_json::from_value::<TradeUpdateResponse>(value)
            .ok()
            .map(|response| Inbound::Trades(response.data)),
        "prices" => serde_json::from_value::<PriceUpdateResponse>(value)
            .ok()
            .map(|response| Inbound::Prices(response.data)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::models::IntentKind;

    #[test]
    fn parses_classify_reply() {
        let value = json!({
            "method": "classify",
            "req_id": 7,
            "success": true,
            "result": [
                {"intent": "spot_quote", "parameters": {"currency_pair": "EURUSD"}}
            ]
        });

        let Some(Inbound::Classified(reply)) = parse_message(value) else {
            panic!("expected classify reply");
        };
        assert_eq!(reply.req_id, 7);
        assert!(reply.success);
        assert_eq!(reply.result[0].kind, IntentKind::SpotQuote);
        assert_eq!(reply.result[0].quote_pair(), Some("EURUSD"));
    }

    #[test]
    fn parses_failed_classify_reply() {
        let value = json!({
            "method": "classify",
            "req_id": 8,
            "success": false,
            "error": "nlp backend unavailable"
        });

        let Some(Inbound::Classified(reply)) = parse_message(value) else {
            panic!("expected classify reply");
        };
        assert!(!reply.success);
        assert!(reply.result.is_empty());
        assert_eq!(reply.error.as_deref(), Some("nlp backend unavailable"));
    }

    #[test]
    fn parses_trade_batch() {
        let value = json!({
            "channel": "trades",
            "type": "update",
            "data": {"trades": [{
                "trade_id": 42,
                "symbol": "EURUSD",
                "dealt_currency": "EUR",
                "notional": "1000000",
                "trade_date": "2024-03-01",
                "status": "done"
            }]}
        });

        let Some(Inbound::Trades(batch)) = parse_message(value) else {
            panic!("expected trade batch");
        };
        assert_eq!(batch.trades.len(), 1);
        assert_eq!(batch.trades[0].trade_id, 42);
        assert_eq!(batch.trades[0].notional, dec!(1000000));
    }

    #[test]
    fn parses_price_ticks() {
        let value = json!({
            "channel": "prices",
            "type": "update",
            "data": [{"symbol": "EURUSD", "mid": "1.1043"}]
        });

        let Some(Inbound::Prices(ticks)) = parse_message(value) else {
            panic!("expected price ticks");
        };
        assert_eq!(ticks[0].symbol, "EURUSD");
        assert_eq!(ticks[0].mid, dec!(1.1043));
    }

    #[test]
    fn ignores_pongs_and_unknown_channels() {
        assert!(parse_message(json!({"method": "pong"})).is_none());
        assert!(parse_message(json!({"channel": "news", "data": []})).is_none());
        assert!(parse_message(json!({"hello": "world"})).is_none());
        assert!(matches!(
            parse_message(json!({"channel": "heartbeat"})),
            Some(Inbound::Heartbeat)
        ));
    }
}
