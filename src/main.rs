//! Socket Provider demo - a counter kept in sync over a WebSocket.
//!
//! The server is expected to answer `increment` events with
//! `{"type":"event","data":["update",{"count":N}]}`.

#![allow(non_snake_case)]

use dioxus::prelude::*;
use serde_json::{Map, Value};
use socket_provider::{
    use_emit_event, use_socket, use_socket_state, ConnectOptions, SocketAction, SocketProvider,
};

type Record = Map<String, Value>;

fn main() {
    // Initialize tracing for desktop
    #[cfg(not(target_arch = "wasm32"))]
    {
        use tracing_subscriber::EnvFilter;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("socket_provider=debug")),
            )
            .init();
    }

    dioxus::launch(App);
}

/// Merge `update` payloads into the record, ignore everything else.
fn reduce(state: &Record, action: &SocketAction) -> Record {
    let mut next = state.clone();
    if action.is("update") {
        if let Some(Value::Object(fields)) = &action.payload {
            next.extend(fields.clone());
        }
    }
    next
}

#[component]
fn App() -> Element {
    let (uri, connect_timeout) = match ConnectOptions::from_env() {
        Ok(options) => (options.endpoint().to_string(), options.connect_timeout()),
        Err(e) => {
            return rsx! {
                p { "Invalid socket configuration: {e}" }
            }
        }
    };

    let mut initial = Record::new();
    initial.insert("count".to_string(), Value::from(0));

    rsx! {
        SocketProvider::<Record> {
            uri,
            connect_timeout,
            reducer: reduce,
            initial_state: initial,
            Counter {}
        }
    }
}

#[component]
fn Counter() -> Element {
    let state = use_socket_state::<Record>();
    let socket = use_socket();
    let increment = use_emit_event("increment");

    let count = state.get("count").cloned().unwrap_or(Value::Null);
    let status = match socket {
        Some(_) => "connected",
        None => "disconnected",
    };

    rsx! {
        h1 { "Count: {count}" }
        p { "Socket: {status}" }
        button {
            onclick: move |_| {
                if let Err(e) = increment.emit(1) {
                    socket_provider::log_error!("increment failed: {}", e);
                }
            },
            "Increment"
        }
    }
}
