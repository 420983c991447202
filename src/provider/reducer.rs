//! Actions and the reducer they are fed to.

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::socket::Packet;

/// A state update derived from one inbound packet.
///
/// `None` fields mean the packet did not carry them: a packet without `data`
/// produces an action with neither kind nor payload, and it is up to the
/// reducer to decide what that means.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SocketAction {
    pub kind: Option<String>,
    pub payload: Option<Value>,
}

impl SocketAction {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: Some(kind.into()),
            payload: Some(payload),
        }
    }

    /// Destructure a packet's `[eventName, payload]` data into an action.
    pub fn from_packet(packet: &Packet) -> Self {
        let (kind, payload) = packet.event_parts();
        Self {
            kind: kind.map(str::to_string),
            payload: payload.cloned(),
        }
    }

    /// Whether this action has the given kind.
    pub fn is(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// Decode the payload into a typed value.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.payload
            .clone()
            .and_then(|payload| serde_json::from_value(payload).ok())
    }
}

/// A shared `(state, action) -> state` function.
///
/// Two reducers are equal only if they are the same allocation, which is
/// what component props need to skip needless re-renders.
pub struct Reducer<S> {
    f: Rc<dyn Fn(&S, &SocketAction) -> S>,
}

impl<S> Reducer<S> {
    pub fn new(f: impl Fn(&S, &SocketAction) -> S + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    pub fn reduce(&self, state: &S, action: &SocketAction) -> S {
        (self.f)(state, action)
    }
}

impl<S> Clone for Reducer<S> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<S> PartialEq for Reducer<S> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

impl<S> fmt::Debug for Reducer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reducer")
    }
}

impl<S, F> From<F> for Reducer<S>
where
    F: Fn(&S, &SocketAction) -> S + 'static,
{
    fn from(f: F) -> Self {
        Reducer::new(f)
    }
}
