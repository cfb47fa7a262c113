//! Natural-language search assistant for an FX trading desk.
//!
//! Keystrokes go through a debounced/throttled search orchestrator that
//! keeps at most one classification request in flight. The classified
//! intent then drives live inline results: a spot quote for a currency
//! pair, or a bounded newest-first trade list.

pub mod broker;
pub mod config;
pub mod error;
pub mod live;
pub mod models;
pub mod search;
pub mod service;
pub mod timer;
pub mod tui;

pub use error::{LookoutError, RequestError, Result};
