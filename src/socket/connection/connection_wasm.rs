//! WASM/Web driver using web_sys::WebSocket.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures_channel::mpsc::UnboundedSender;
use futures_util::StreamExt;
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{js_sys, CloseEvent, MessageEvent, WebSocket};

use super::decode_frame;
use crate::error::Result;
use crate::socket::{Outbound, TransportEvent};

/// Start the driver on the browser event loop.
pub(crate) fn spawn(
    endpoint: Url,
    connect_timeout: Duration,
    outbound: Outbound,
    inbound: UnboundedSender<TransportEvent>,
) -> Result<()> {
    spawn_local(run(endpoint, connect_timeout, outbound, inbound));
    Ok(())
}

async fn run(
    endpoint: Url,
    connect_timeout: Duration,
    mut outbound: Outbound,
    inbound: UnboundedSender<TransportEvent>,
) {
    let ws = match connect_websocket(endpoint.as_str(), connect_timeout, inbound.clone()).await {
        Ok(ws) => ws,
        Err(reason) => {
            crate::log_error!("WebSocket error for {}: {}", endpoint, reason);
            let _ = inbound.unbounded_send(TransportEvent::Error(reason.clone()));
            let _ = inbound.unbounded_send(TransportEvent::Close { reason });
            return;
        }
    };

    crate::log_info!("WebSocket connected to {}", endpoint);
    let _ = inbound.unbounded_send(TransportEvent::Open);

    while let Some(packet) = outbound.next().await {
        if ws.ready_state() != WebSocket::OPEN {
            crate::log_info!("WebSocket no longer open, stopping send task");
            break;
        }
        match packet.to_text() {
            Ok(text) => {
                crate::log_debug!("Sending to {}: {}", endpoint, text);
                if let Err(e) = ws.send_with_str(&text) {
                    crate::log_error!("Send failed: {:?}", e);
                }
            }
            Err(e) => crate::log_error!("Serialize failed: {}", e),
        }
    }

    // Outbound queue ended: the handle was disconnected.
    if let Err(e) = ws.close() {
        crate::log_error!("Close failed: {:?}", e);
    }
}

/// Open the WebSocket and wire its callbacks into `inbound`.
///
/// Resolves once the socket is open, or with the reason it never opened.
async fn connect_websocket(
    url: &str,
    connect_timeout: Duration,
    inbound: UnboundedSender<TransportEvent>,
) -> std::result::Result<WebSocket, String> {
    let ws = WebSocket::new(url).map_err(|e| format!("Failed to create WebSocket: {:?}", e))?;

    let is_open = Rc::new(RefCell::new(false));
    let error_reason = Rc::new(RefCell::new(None::<String>));

    let is_open_for_open = is_open.clone();
    let onopen_callback = Closure::wrap(Box::new(move |_: web_sys::Event| {
        *is_open_for_open.borrow_mut() = true;
    }) as Box<dyn FnMut(web_sys::Event)>);
    ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));
    onopen_callback.forget();

    // Before open, failures are recorded for the caller; after, they are events.
    let is_open_for_close = is_open.clone();
    let error_reason_close = error_reason.clone();
    let inbound_close = inbound.clone();
    let onclose_callback = Closure::wrap(Box::new(move |e: CloseEvent| {
        let reason = if e.reason().is_empty() {
            format!("Code {}", e.code())
        } else {
            e.reason()
        };
        crate::log_info!("WebSocket onclose: {}", reason);
        if *is_open_for_close.borrow() {
            let _ = inbound_close.unbounded_send(TransportEvent::Close { reason });
        } else {
            *error_reason_close.borrow_mut() = Some(reason);
        }
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));
    onclose_callback.forget();

    let is_open_for_error = is_open.clone();
    let error_reason_err = error_reason.clone();
    let inbound_error = inbound.clone();
    let onerror_callback = Closure::wrap(Box::new(move |_: web_sys::ErrorEvent| {
        crate::log_error!("WebSocket onerror fired");
        if *is_open_for_error.borrow() {
            let _ = inbound_error.unbounded_send(TransportEvent::Error("WebSocket error".to_string()));
        } else {
            *error_reason_err.borrow_mut() = Some("WebSocket error".to_string());
        }
    }) as Box<dyn FnMut(web_sys::ErrorEvent)>);
    ws.set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));
    onerror_callback.forget();

    let onmessage_callback = Closure::wrap(Box::new(move |e: MessageEvent| {
        if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
            let text: String = text.into();
            crate::log_debug!("WebSocket received: {}", text);
            let _ = inbound.unbounded_send(decode_frame(&text));
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));
    onmessage_callback.forget();

    // Poll in 10ms steps until open, failed, or out of time.
    let steps = (connect_timeout.as_millis() / 10).max(1);
    for _ in 0..steps {
        if *is_open.borrow() {
            return Ok(ws);
        }
        if let Some(reason) = error_reason.borrow().clone() {
            return Err(reason);
        }
        // Yield to allow callbacks to fire
        gloo_timers::future::TimeoutFuture::new(10).await;
    }

    let _ = ws.close();
    Err("Connection timeout".to_string())
}
