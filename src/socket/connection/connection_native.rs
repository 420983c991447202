//! Native/Desktop driver using tokio-tungstenite.

use std::time::Duration;

use futures_channel::mpsc::UnboundedSender;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::decode_frame;
use crate::error::{Result, SocketError};
use crate::socket::{Outbound, TransportEvent};

/// Start the driver on the current tokio runtime.
pub(crate) fn spawn(
    endpoint: Url,
    connect_timeout: Duration,
    outbound: Outbound,
    inbound: UnboundedSender<TransportEvent>,
) -> Result<()> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| SocketError::Runtime(e.to_string()))?;
    runtime.spawn(run(endpoint, connect_timeout, outbound, inbound));
    Ok(())
}

async fn run(
    endpoint: Url,
    connect_timeout: Duration,
    mut outbound: Outbound,
    inbound: UnboundedSender<TransportEvent>,
) {
    let ws_stream = match tokio::time::timeout(connect_timeout, connect_async(endpoint.as_str())).await
    {
        Ok(Ok((ws_stream, _response))) => ws_stream,
        Ok(Err(e)) => {
            crate::log_error!("WebSocket error for {}: {}", endpoint, e);
            fail(&inbound, e.to_string());
            return;
        }
        Err(_) => {
            crate::log_error!(
                "WebSocket to {} timed out after {}ms",
                endpoint,
                connect_timeout.as_millis()
            );
            fail(&inbound, "connection timeout".to_string());
            return;
        }
    };

    crate::log_info!("WebSocket connected to {}", endpoint);
    let _ = inbound.unbounded_send(TransportEvent::Open);

    let (mut write, mut read) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            packet = outbound.next() => match packet {
                Some(packet) => match packet.to_text() {
                    Ok(text) => {
                        crate::log_debug!("Sending to {}: {}", endpoint, text);
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            crate::log_error!("Send failed: {}", e);
                            let _ = inbound.unbounded_send(TransportEvent::Error(e.to_string()));
                            break format!("send failed: {e}");
                        }
                    }
                    Err(e) => crate::log_error!("Serialize failed: {}", e),
                },
                None => {
                    // Handle disconnected
                    let _ = write.close().await;
                    break "client disconnect".to_string();
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    crate::log_debug!("WebSocket received: {}", text.as_str());
                    let _ = inbound.unbounded_send(decode_frame(text.as_str()));
                }
                Some(Ok(Message::Ping(_))) => {
                    // Pong is handled automatically by tungstenite
                    let _ = inbound.unbounded_send(TransportEvent::Ping);
                }
                Some(Ok(Message::Close(frame))) => {
                    crate::log_info!("WebSocket to {} received close frame", endpoint);
                    break frame
                        .map(|f| f.reason.as_str().to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "server closed".to_string());
                }
                Some(Ok(_)) => {
                    // Ignore binary, pong, etc.
                }
                Some(Err(e)) => {
                    crate::log_error!("WebSocket read error: {}", e);
                    let _ = inbound.unbounded_send(TransportEvent::Error(e.to_string()));
                    break format!("read error: {e}");
                }
                None => break "stream ended".to_string(),
            },
        }
    };

    crate::log_info!("WebSocket to {} closed: {}", endpoint, reason);
    let _ = inbound.unbounded_send(TransportEvent::Close { reason });
}

fn fail(inbound: &UnboundedSender<TransportEvent>, reason: String) {
    let _ = inbound.unbounded_send(TransportEvent::Error(reason.clone()));
    let _ = inbound.unbounded_send(TransportEvent::Close { reason });
}
