//! Socket Provider - a WebSocket bound to reducer-driven Dioxus state.
//!
//! Wrap a subtree in [`SocketProvider`]: it opens one socket on mount, turns
//! every inbound `packet` into a [`SocketAction`] for your [`Reducer`], and shares
//! the socket handle and the reduced state with descendants through
//! [`use_socket`], [`use_socket_state`] and [`use_emit_event`].

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod socket;

pub use config::ConnectOptions;
pub use error::{Result, SocketError};
pub use provider::{
    try_use_socket, try_use_socket_state, use_emit_event, use_socket, use_socket_context,
    use_socket_state, Binding, ConnectionContext, Emitter, Reducer, SocketAction, SocketContext,
    SocketProvider, SocketProviderProps,
};
pub use socket::{Packet, PacketKind, Socket, TransportEvent};
