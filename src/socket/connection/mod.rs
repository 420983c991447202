//! Platform drivers that own the actual WebSocket.
//!
//! Both drivers share one contract: read [`Packet`]s from the outbound queue
//! and write them as text frames, report everything else as
//! [`TransportEvent`]s on the inbound queue, and close the WebSocket once the
//! outbound queue ends.

use super::{Packet, TransportEvent};

/// Turn a text frame into the event listeners see.
pub(crate) fn decode_frame(text: &str) -> TransportEvent {
    match Packet::parse(text) {
        Ok(packet) => TransportEvent::Packet(packet),
        Err(e) => TransportEvent::Error(format!("unreadable frame: {e}")),
    }
}

// Include platform-specific implementation
#[cfg(target_arch = "wasm32")]
mod connection_wasm;
#[cfg(target_arch = "wasm32")]
pub(crate) use connection_wasm::spawn;

#[cfg(not(target_arch = "wasm32"))]
mod connection_native;
#[cfg(not(target_arch = "wasm32"))]
pub(crate) use connection_native::spawn;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::PacketKind;

    #[test]
    fn text_frames_become_packets() {
        let event = decode_frame(r#"{"type":"event","data":["hello",1]}"#);
        let packet = event.as_packet().unwrap();
        assert_eq!(packet.kind, PacketKind::Event);
        assert_eq!(packet.event_parts().0, Some("hello"));
    }

    #[test]
    fn garbage_frames_become_errors() {
        match decode_frame("{oops") {
            TransportEvent::Error(reason) => assert!(reason.starts_with("unreadable frame")),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
