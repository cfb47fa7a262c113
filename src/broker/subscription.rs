//! Outgoing channel subscription and RPC messages.

use futures_util::SinkExt;
use tracing::{debug, info};
use tungstenite::Message;

use super::WsWriter;
use crate::Result;
use crate::models::{Channel, ClassifyRequest, SubscribeRequest, UnsubscribeRequest};

/// Subscribes to a channel, optionally scoped to one symbol.
///
/// # Errors
///
/// Returns a [`LookoutError`](crate::LookoutError) if sending the subscription message fails.
pub async fn subscribe(
    write: &mut WsWriter,
    channel: Channel,
    symbol: Option<&str>,
) -> Result<()> {
    let request = SubscribeRequest::new(channel, symbol);
    let json = serde_json::to_string(&request)?;
    debug!("Sending subscribe request: {}", json);
    write.send(Message::Text(json.into())).await?;
    info!(channel = channel.as_str(), ?symbol, "Subscribed to channel");

    Ok(())
}

/// Unsubscribes from a channel.
///
/// # Errors
///
/// Returns a [`LookoutError`](crate::LookoutError) if sending the unsubscribe message fails.
pub async fn unsubscribe(
    write: &mut WsWriter,
    channel: Channel,
    symbol: Option<&str>,
) -> Result<()> {
    let request = UnsubscribeRequest::new(channel, symbol);
    let json = serde_json::to_string(&request)?;
    write.send(Message::Text(json.into())).await?;
    info!(channel = channel.as_str(), ?symbol, "Unsubscribed from channel");

    Ok(())
}

/// Sends a `classify` RPC. The reply carries the same `req_id`.
///
/// # Errors
///
/// Returns a [`LookoutError`](crate::LookoutError) if sending the request fails.
pub async fn classify(write: &mut WsWriter, request: &str, req_id: u64) -> Result<()> {
    let request = ClassifyRequest::new(request, req_id);
    let json = serde_json::to_string(&request)?;
    debug!("Sending classify request: {}", json);
    write.send(Message::Text(json.into())).await?;

    Ok(())
}
