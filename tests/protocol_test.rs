//! Serialization tests for outgoing broker requests and the Channel enum.

use lookout::models::{Channel, ClassifyRequest, PingRequest, SubscribeRequest, UnsubscribeRequest};

fn to_value<T: serde::Serialize>(request: &T) -> serde_json::Value {
    let json = serde_json::to_string(request).expect("Failed to serialize request");
    serde_json::from_str(&json).expect("Failed to parse serialized JSON")
}

#[test]
fn test_channel_as_str_returns_correct_wire_names() {
    assert_eq!(Channel::Trades.as_str(), "trades");
    assert_eq!(Channel::Prices.as_str(), "prices");
    assert_eq!(Channel::Heartbeat.as_str(), "heartbeat");
}

#[test]
fn test_ping_request_serializes() {
    let value = to_value(&PingRequest::new());
    assert_eq!(value["method"], "ping");
}

#[test]
fn test_classify_request_serializes() {
    let value = to_value(&ClassifyRequest::new("last 5 eur trades", 7));

    assert_eq!(value["method"], "classify");
    assert_eq!(value["params"]["request"], "last 5 eur trades");
    assert_eq!(value["req_id"], 7);
}

#[test]
fn test_price_subscription_carries_symbol() {
    let value = to_value(&SubscribeRequest::new(Channel::Prices, Some("EURUSD")));

    assert_eq!(value["method"], "subscribe");
    assert_eq!(value["params"]["channel"], "prices");
    assert_eq!(value["params"]["symbol"], "EURUSD");
}

#[test]
fn test_trade_subscription_omits_symbol() {
    let value = to_value(&SubscribeRequest::new(Channel::Trades, None));

    assert_eq!(value["params"]["channel"], "trades");
    assert!(value["params"].get("symbol").is_none());
}

#[test]
fn test_unsubscribe_request_serializes() {
    let value = to_value(&UnsubscribeRequest::new(Channel::Prices, Some("GBPUSD")));

    assert_eq!(value["method"], "unsubscribe");
    assert_eq!(value["params"]["channel"], "prices");
    assert_eq!(value["params"]["symbol"], "GBPUSD");
}
