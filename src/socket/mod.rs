//! Connection handle and inbound event pipeline.
//!
//! A [`Socket`] is a cheap, clonable reference to one WebSocket session. The
//! platform driver owns the actual connection and talks to the handle through
//! two queues:
//!
//! ```text
//!   Socket::emit ──► outbound queue ──► driver ──► server
//!   server ──► driver ──► inbound queue ──► Socket::pump ──► listeners
//! ```
//!
//! Listeners run on the thread that pumps the inbound queue, in this order:
//! interceptors, raw listeners, then named event handlers.

mod connection;
mod packet;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ConnectOptions;
use crate::error::{Result, SocketError};

pub use packet::{Packet, PacketKind, TransportEvent, PACKET};

/// Events reported by the driver, consumed by [`Socket::pump`].
pub type Inbound = UnboundedReceiver<TransportEvent>;

/// Packets queued by [`Socket::emit`], consumed by the driver.
pub type Outbound = UnboundedReceiver<Packet>;

type RawListener = Rc<dyn Fn(&TransportEvent)>;
type EventHandler = Rc<dyn Fn(&Value)>;

/// Registration token returned by the listener methods, used with [`Socket::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    interceptors: Vec<(ListenerId, RawListener)>,
    raw: Vec<(ListenerId, RawListener)>,
    handlers: Vec<(ListenerId, String, EventHandler)>,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.interceptors.len() + self.raw.len() + self.handlers.len();
        self.interceptors.retain(|(l, _)| *l != id);
        self.raw.retain(|(l, _)| *l != id);
        self.handlers.retain(|(l, _, _)| *l != id);
        before != self.interceptors.len() + self.raw.len() + self.handlers.len()
    }
}

struct SocketInner {
    id: Uuid,
    uri: String,
    outbound: UnboundedSender<Packet>,
    connected: Cell<bool>,
    listeners: RefCell<Listeners>,
}

/// Handle to one transport session.
#[derive(Clone)]
pub struct Socket {
    inner: Rc<SocketInner>,
}

impl Socket {
    /// Open a connection and start the platform driver.
    ///
    /// The returned [`Inbound`] stream must be pumped (see [`Socket::pump`])
    /// for listeners to see anything.
    pub fn connect(options: &ConnectOptions) -> Result<(Socket, Inbound)> {
        let endpoint = options.endpoint();
        let (socket, outbound) = Socket::detached(endpoint.as_str());
        let (inbound_tx, inbound) = unbounded();

        connection::spawn(endpoint, options.connect_timeout(), outbound, inbound_tx)?;
        crate::log_info!("socket {} connecting to {}", socket.id(), socket.uri());

        Ok((socket, inbound))
    }

    /// Create a handle that is not attached to any driver.
    ///
    /// Whoever holds the returned [`Outbound`] plays the driver: it receives
    /// every emitted packet, and sees the queue end once the handle is
    /// disconnected. Inbound traffic is fed through [`Socket::deliver`].
    pub fn detached(uri: impl Into<String>) -> (Socket, Outbound) {
        let (outbound, outbound_rx) = unbounded();
        let socket = Socket {
            inner: Rc::new(SocketInner {
                id: Uuid::new_v4(),
                uri: uri.into(),
                outbound,
                connected: Cell::new(false),
                listeners: RefCell::new(Listeners::default()),
            }),
        };
        (socket, outbound_rx)
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    /// Whether the driver reported `open` and no `close` since.
    pub fn connected(&self) -> bool {
        self.inner.connected.get()
    }

    /// Whether [`Socket::disconnect`] was called or the driver went away.
    pub fn is_closed(&self) -> bool {
        self.inner.outbound.is_closed()
    }

    /// Emit a named application event.
    pub fn emit<P: Serialize>(&self, event: &str, payload: P) -> Result<()> {
        let payload = serde_json::to_value(payload)?;
        self.send(Packet::event(event, payload))
    }

    /// Queue a raw packet for the driver.
    pub fn send(&self, packet: Packet) -> Result<()> {
        self.inner
            .outbound
            .unbounded_send(packet)
            .map_err(|_| SocketError::Closed)
    }

    /// Close the session.
    ///
    /// Returns `true` only for the call that actually closed the outbound
    /// queue.
    pub fn disconnect(&self) -> bool {
        if self.inner.outbound.is_closed() {
            return false;
        }
        self.inner.outbound.close_channel();
        self.inner.connected.set(false);
        crate::log_info!("socket {} disconnected", self.id());
        true
    }

    /// Register a listener that sees every event before anything else.
    pub fn intercept(&self, listener: impl Fn(&TransportEvent) + 'static) -> ListenerId {
        let mut listeners = self.inner.listeners.borrow_mut();
        let id = listeners.next_id();
        listeners.interceptors.push((id, Rc::new(listener)));
        id
    }

    /// Register a listener for every transport event.
    pub fn on_any(&self, listener: impl Fn(&TransportEvent) + 'static) -> ListenerId {
        let mut listeners = self.inner.listeners.borrow_mut();
        let id = listeners.next_id();
        listeners.raw.push((id, Rc::new(listener)));
        id
    }

    /// Register a handler for a named application event.
    ///
    /// The handler receives the event payload, `Value::Null` if the packet
    /// carried none.
    pub fn on(&self, event: &str, handler: impl Fn(&Value) + 'static) -> ListenerId {
        let mut listeners = self.inner.listeners.borrow_mut();
        let id = listeners.next_id();
        listeners
            .handlers
            .push((id, event.to_string(), Rc::new(handler)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    /// Run one event through the listener pipeline.
    pub fn deliver(&self, event: &TransportEvent) {
        match event {
            TransportEvent::Open => self.inner.connected.set(true),
            TransportEvent::Close { .. } => self.inner.connected.set(false),
            _ => {}
        }

        // Snapshot so listeners can register or remove listeners while running.
        let (interceptors, raw, handlers) = {
            let listeners = self.inner.listeners.borrow();
            let interceptors: Vec<RawListener> =
                listeners.interceptors.iter().map(|(_, l)| l.clone()).collect();
            let raw: Vec<RawListener> = listeners.raw.iter().map(|(_, l)| l.clone()).collect();
            let handlers: Vec<(String, EventHandler)> = listeners
                .handlers
                .iter()
                .map(|(_, name, h)| (name.clone(), h.clone()))
                .collect();
            (interceptors, raw, handlers)
        };

        for listener in interceptors.iter().chain(raw.iter()) {
            listener(event);
        }

        let Some(packet) = event.as_packet() else {
            return;
        };
        if packet.kind != PacketKind::Event {
            return;
        }
        if let (Some(name), payload) = packet.event_parts() {
            let payload = payload.unwrap_or(&Value::Null);
            for (_, handler) in handlers.iter().filter(|(n, _)| n == name) {
                handler(payload);
            }
        }
    }

    /// Deliver inbound events one at a time until the driver goes away.
    pub async fn pump(self, mut inbound: Inbound) {
        while let Some(event) = inbound.next().await {
            self.deliver(&event);
        }
        crate::log_debug!("socket {} inbound stream ended", self.id());
    }
}

impl PartialEq for Socket {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("id", &self.inner.id)
            .field("uri", &self.inner.uri)
            .field("connected", &self.inner.connected.get())
            .finish()
    }
}
