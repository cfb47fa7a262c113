//! Shared models for the lookout backend.
//!
//! Contains channel definitions, subscription and classification request
//! types, and the common protocol messages (ping/pong, heartbeat).

pub mod intent;
pub mod quote;
pub mod trade;

use serde::{Deserialize, Serialize};

pub use intent::{Intent, IntentKind, IntentParameters};
pub use quote::{PriceTick, QuoteView};
pub use trade::{TradeRecord, TradeUpdateBatch};

/// Push channels offered by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Cumulative trade blotter updates.
    Trades,
    /// Spot price ticks for one currency pair.
    Prices,
    Heartbeat,
}

impl Channel {
    /// Returns the wire-format channel name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Trades => "trades",
            Channel::Prices => "prices",
            Channel::Heartbeat => "heartbeat",
        }
    }
}

/// A `subscribe` request.
#[derive(Serialize)]
pub struct SubscribeRequest {
    pub method: String,
    pub params: Params,
}

/// An `unsubscribe` request.
#[derive(Serialize)]
pub struct UnsubscribeRequest {
    pub method: String,
    pub params: Params,
}

/// Channel and optional symbol used in subscribe/unsubscribe requests.
#[derive(Serialize)]
pub struct Params {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl SubscribeRequest {
    pub fn new(channel: Channel, symbol: Option<&str>) -> Self {
        Self {
            method: "subscribe".to_string(),
            params: Params {
                channel: channel.as_str().to_string(),
                symbol: symbol.map(String::from),
            },
        }
    }
}

impl UnsubscribeRequest {
    pub fn new(channel: Channel, symbol: Option<&str>) -> Self {
        Self {
            method: "unsubscribe".to_string(),
            params: Params {
                channel: channel.as_str().to_string(),
                symbol: symbol.map(String::from),
            },
        }
    }
}

/// A `classify` RPC asking the NLP service for intent candidates.
#[derive(Serialize)]
pub struct ClassifyRequest {
    pub method: String,
    pub params: ClassifyParams,
    pub req_id: u64,
}

#[derive(Serialize)]
pub struct ClassifyParams {
    pub request: String,
}

impl ClassifyRequest {
    pub fn new(request: &str, req_id: u64) -> Self {
        Self {
            method: "classify".to_string(),
            params: ClassifyParams {
                request: request.to_string(),
            },
            req_id,
        }
    }
}

/// Reply to a [`ClassifyRequest`], correlated by `req_id`.
#[derive(Debug, Deserialize)]
pub struct ClassifyResponse {
    pub method: String,
    pub req_id: u64,
    pub success: bool,
    #[serde(default)]
    pub result: Vec<Intent>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A `ping` request used to test connection liveness.
#[derive(Serialize)]
pub struct PingRequest {
    pub method: String,
}

impl PingRequest {
    pub fn new() -> Self {
        Self {
            method: "ping".to_string(),
        }
    }
}

impl Default for PingRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic heartbeat message indicating the connection is alive.
#[derive(Deserialize)]
pub struct HeartbeatResponse {
    pub channel: String,
}
