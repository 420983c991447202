//! The adapter core: ties one socket session to a reducer-driven state.
//!
//! `Binding` knows nothing about components. It writes into two [`Slot`]s,
//! which are Dioxus signals inside `SocketProvider` and plain
//! `Rc<RefCell<_>>` cells anywhere else.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use dioxus::prelude::*;

use super::reducer::{Reducer, SocketAction};
use crate::socket::{ListenerId, Socket, TransportEvent, PACKET};

/// A writable cell the binding publishes into.
pub trait Slot<T>: Clone + 'static {
    /// Copy out the current value without subscribing to it.
    fn snapshot(&self) -> T
    where
        T: Clone;

    fn publish(&mut self, value: T);

    fn apply(&mut self, f: impl FnOnce(&mut T));
}

// Writes after the owning scope is gone are dropped: nobody is left to read them.
impl<T: 'static> Slot<T> for Signal<T> {
    fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.peek().deref().clone()
    }

    fn publish(&mut self, value: T) {
        if let Ok(mut current) = self.try_write() {
            *current = value;
        }
    }

    fn apply(&mut self, f: impl FnOnce(&mut T)) {
        if let Ok(mut current) = self.try_write() {
            f(&mut current);
        }
    }
}

impl<T: 'static> Slot<T> for Rc<RefCell<T>> {
    fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.borrow().clone()
    }

    fn publish(&mut self, value: T) {
        *self.borrow_mut() = value;
    }

    fn apply(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.borrow_mut());
    }
}

/// Build the listener that turns `packet` events into reducer dispatches.
///
/// Every other tag is ignored. The listener never stops an event: the socket
/// keeps delivering it to its remaining listeners afterwards.
pub fn interceptor<S, St>(reducer: Reducer<S>, state: St) -> impl Fn(&TransportEvent) + 'static
where
    S: 'static,
    St: Slot<S>,
{
    move |event| {
        if event.tag() != PACKET {
            return;
        }
        let Some(packet) = event.as_packet() else {
            return;
        };

        let action = SocketAction::from_packet(packet);
        crate::log_debug!("dispatching action {:?}", action.kind);

        let mut state = state.clone();
        state.apply(|current| {
            let next = reducer.reduce(current, &action);
            *current = next;
        });
    }
}

struct Session {
    socket: Socket,
    interceptor: ListenerId,
}

/// One adapter instance: at most one live session at a time.
pub struct Binding<S, H, St>
where
    S: 'static,
    H: Slot<Option<Socket>>,
    St: Slot<S>,
{
    reducer: Reducer<S>,
    handle: H,
    state: St,
    session: Option<Session>,
}

impl<S, H, St> Binding<S, H, St>
where
    S: 'static,
    H: Slot<Option<Socket>>,
    St: Slot<S>,
{
    pub fn new(reducer: Reducer<S>, handle: H, state: St) -> Self {
        Self {
            reducer,
            handle,
            state,
            session: None,
        }
    }

    /// Attach a freshly opened socket.
    ///
    /// An already mounted session is torn down first.
    pub fn mount(&mut self, socket: Socket) {
        self.unmount();

        let interceptor = socket.intercept(interceptor(self.reducer.clone(), self.state.clone()));
        self.handle.publish(Some(socket.clone()));
        self.session = Some(Session {
            socket,
            interceptor,
        });
    }

    /// Tear the current session down: stop dispatching, clear the published
    /// handle, then disconnect.
    ///
    /// Returns the socket that was torn down, `None` if nothing was mounted.
    pub fn unmount(&mut self) -> Option<Socket> {
        let session = self.session.take()?;
        session.socket.off(session.interceptor);
        self.handle.publish(None);
        session.socket.disconnect();
        Some(session.socket)
    }

    pub fn socket(&self) -> Option<&Socket> {
        self.session.as_ref().map(|s| &s.socket)
    }

    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }
}
