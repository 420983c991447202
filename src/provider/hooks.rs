//! Accessors for components below a `SocketProvider`.
//!
//! The `use_*` hooks panic outside a provider subtree, like
//! `use_context`. The `try_use_*` forms return
//! [`SocketError::MissingProvider`] instead.

use std::fmt;
use std::rc::Rc;

use dioxus::prelude::*;
use serde::Serialize;

use super::{ConnectionContext, SocketContext};
use crate::error::{Result, SocketError};
use crate::socket::Socket;

/// Hook to get the connection handle of the nearest provider.
///
/// # Returns
/// The published handle (reactive), `None` before mount or after teardown.
pub fn use_socket() -> Option<Socket> {
    use_context::<ConnectionContext>().socket.cloned()
}

pub fn try_use_socket() -> Result<Option<Socket>> {
    let ctx = try_use_context::<ConnectionContext>().ok_or(SocketError::MissingProvider)?;
    Ok(ctx.socket.cloned())
}

/// Hook to get the current reduced state.
///
/// `S` must be the state type of the enclosing `SocketProvider`.
pub fn use_socket_state<S: Clone + 'static>() -> S {
    use_context::<SocketContext<S>>().state.cloned()
}

pub fn try_use_socket_state<S: Clone + 'static>() -> Result<S> {
    let ctx = try_use_context::<SocketContext<S>>().ok_or(SocketError::MissingProvider)?;
    Ok(ctx.state.cloned())
}

/// Hook to get the raw `(socket, state)` signal pair.
pub fn use_socket_context<S: 'static>() -> SocketContext<S> {
    use_context::<SocketContext<S>>()
}

/// Hook to get an [`Emitter`] for a named outbound event.
///
/// The emitter looks the handle up each time it fires, so it always targets
/// whatever socket is published at that moment.
pub fn use_emit_event(event: &str) -> Emitter {
    let ctx = use_context::<ConnectionContext>();
    Emitter::new(event, move || ctx.current())
}

/// Emits one named event on a late-bound socket.
#[derive(Clone)]
pub struct Emitter {
    event: Rc<str>,
    resolve: Rc<dyn Fn() -> Option<Socket>>,
}

impl Emitter {
    pub fn new(event: &str, resolve: impl Fn() -> Option<Socket> + 'static) -> Self {
        Self {
            event: Rc::from(event),
            resolve: Rc::new(resolve),
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Emit the event with `payload` on the currently published socket.
    pub fn emit<P: Serialize>(&self, payload: P) -> Result<()> {
        let socket = (self.resolve)().ok_or(SocketError::NotConnected)?;
        socket.emit(&self.event, payload)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").field("event", &self.event).finish()
    }
}
