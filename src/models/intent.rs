//! Classification results returned by the NLP service.

use serde::Deserialize;

/// What the user is asking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// A live spot price for a currency pair.
    SpotQuote,
    /// Recent trades, optionally narrowed by currency or pair.
    TradeInfo,
    #[serde(other)]
    Other,
}

impl IntentKind {
    /// Returns the display label shown next to the inline result.
    pub fn label(&self) -> &'static str {
        match self {
            IntentKind::SpotQuote => "Spot Quote",
            IntentKind::TradeInfo => "Trades",
            IntentKind::Other => "No inline result",
        }
    }
}

/// Parameters the classifier extracted from the request text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IntentParameters {
    /// Dealt currency, e.g. `"EUR"`.
    #[serde(default)]
    pub currency: Option<String>,
    /// Six-letter currency pair, e.g. `"EURUSD"`.
    #[serde(default)]
    pub currency_pair: Option<String>,
    /// A count mentioned in the request ("last 5 trades").
    #[serde(default)]
    pub number: Option<usize>,
}

/// A single classification candidate. Immutable once received.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Intent {
    #[serde(rename = "intent")]
    pub kind: IntentKind,
    #[serde(default)]
    pub parameters: IntentParameters,
}

impl Intent {
    pub fn new(kind: IntentKind, parameters: IntentParameters) -> Self {
        Self { kind, parameters }
    }

    /// Currency pair to quote, if this intent asks for a spot quote.
    pub fn quote_pair(&self) -> Option<&str> {
        match self.kind {
            IntentKind::SpotQuote => self.parameters.currency_pair.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if this intent should show the inline trade list.
    pub fn wants_trades(&self) -> bool {
        self.kind == IntentKind::TradeInfo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_deserializes_as_other() {
        let intent: Intent = serde_json::from_str(r#"{"intent":"market_info"}"#).unwrap();
        assert_eq!(intent.kind, IntentKind::Other);
        assert_eq!(intent.parameters, IntentParameters::default());
    }

    #[test]
    fn quote_pair_only_for_spot_quotes() {
        let params = IntentParameters {
            currency_pair: Some("EURUSD".into()),
            ..Default::default()
        };
        let quote = Intent::new(IntentKind::SpotQuote, params.clone());
        let trades = Intent::new(IntentKind::TradeInfo, params);

        assert_eq!(quote.quote_pair(), Some("EURUSD"));
        assert_eq!(trades.quote_pair(), None);
        assert!(trades.wants_trades());
        assert!(!quote.wants_trades());
    }
}
