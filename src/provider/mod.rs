//! `SocketProvider`: one socket per mounted subtree, with its inbound packets
//! reduced into state that descendants read through context.
//!
//! # Usage
//!
//! ```rust,ignore
//! type Record = serde_json::Map<String, serde_json::Value>;
//!
//! fn reduce(state: &Record, action: &SocketAction) -> Record {
//!     let mut next = state.clone();
//!     if let (true, Some(Value::Object(fields))) = (action.is("update"), &action.payload) {
//!         next.extend(fields.clone());
//!     }
//!     next
//! }
//!
//! rsx! {
//!     SocketProvider::<Record> {
//!         uri: "ws://localhost:3000/socket",
//!         reducer: reduce,
//!         Counter {}
//!     }
//! }
//!
//! fn Counter() -> Element {
//!     let state = use_socket_state::<Record>();
//!     let increment = use_emit_event("increment");
//!     rsx! {
//!         button { onclick: move |_| { let _ = increment.emit(1); }, "{state:?}" }
//!     }
//! }
//! ```

mod binding;
mod hooks;
mod reducer;

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;
use std::time::Duration;

use dioxus::dioxus_core::Task;
use dioxus::prelude::*;

use crate::config::ConnectOptions;
use crate::socket::Socket;

pub use binding::{interceptor, Binding, Slot};
pub use hooks::{
    try_use_socket, try_use_socket_state, use_emit_event, use_socket, use_socket_context,
    use_socket_state, Emitter,
};
pub use reducer::{Reducer, SocketAction};

/// The `(connection handle, state)` pair published by a provider.
pub struct SocketContext<S: 'static> {
    pub socket: Signal<Option<Socket>>,
    pub state: Signal<S>,
}

impl<S: 'static> Clone for SocketContext<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: 'static> Copy for SocketContext<S> {}

/// The connection handle alone, for accessors that do not know the state type.
#[derive(Clone, Copy)]
pub struct ConnectionContext {
    pub socket: Signal<Option<Socket>>,
}

impl ConnectionContext {
    /// The published handle, read without subscribing.
    ///
    /// `None` once the owning provider has been dropped.
    pub fn current(&self) -> Option<Socket> {
        self.socket
            .try_peek()
            .ok()
            .and_then(|socket| socket.deref().clone())
    }
}

type SignalBinding<S> = Binding<S, Signal<Option<Socket>>, Signal<S>>;

/// Mount-cycle bookkeeping for one provider instance.
struct Lifecycle<S: 'static> {
    binding: SignalBinding<S>,
    pump: Option<Task>,
}

impl<S: 'static> Lifecycle<S> {
    fn open(&mut self, uri: &str, query: &[(String, String)], connect_timeout: Option<Duration>) {
        let options = match ConnectOptions::parse(uri) {
            Ok(options) => {
                let options = query
                    .iter()
                    .fold(options, |options, (k, v)| options.with_query(k.as_str(), v.as_str()));
                match connect_timeout {
                    Some(timeout) => options.with_connect_timeout(timeout),
                    None => options,
                }
            }
            Err(e) => {
                crate::log_error!("SocketProvider: bad uri '{}': {}", uri, e);
                return;
            }
        };

        let (socket, inbound) = match Socket::connect(&options) {
            Ok(connection) => connection,
            Err(e) => {
                crate::log_error!("SocketProvider: cannot connect to {}: {}", uri, e);
                return;
            }
        };

        self.close();
        self.binding.mount(socket.clone());
        self.pump = Some(spawn(socket.pump(inbound)));
    }

    fn close(&mut self) {
        if let Some(task) = self.pump.take() {
            task.cancel();
        }
        if let Some(socket) = self.binding.unmount() {
            crate::log_info!("SocketProvider: tore down socket {}", socket.id());
        }
    }
}

/// Component that owns one socket for the lifetime of its subtree.
///
/// The socket is opened once on mount and closed on unmount. Changing `uri`,
/// `query` or `reducer` afterwards does not reconnect.
#[component]
pub fn SocketProvider<S: Clone + PartialEq + Default + 'static>(
    /// Target address (`ws`, `wss`, `http` or `https`).
    uri: String,
    /// Reduces each inbound packet into the state.
    #[props(into)]
    reducer: Reducer<S>,
    /// State before the first packet arrives.
    #[props(default)]
    initial_state: S,
    /// Extra query parameters appended to `uri`.
    #[props(default)]
    query: Vec<(String, String)>,
    /// Overrides the default connect timeout.
    connect_timeout: Option<Duration>,
    children: Element,
) -> Element {
    let socket = use_signal(|| None::<Socket>);
    let state = use_signal(|| initial_state.clone());

    let lifecycle = use_hook(|| {
        Rc::new(RefCell::new(Lifecycle {
            binding: Binding::new(reducer.clone(), socket, state),
            pump: None,
        }))
    });

    // Reads no signals, so it runs exactly once.
    use_effect({
        let lifecycle = lifecycle.clone();
        move || lifecycle.borrow_mut().open(&uri, &query, connect_timeout)
    });

    use_drop(move || lifecycle.borrow_mut().close());

    use_context_provider(|| SocketContext { socket, state });
    use_context_provider(|| ConnectionContext { socket });

    children
}
