//! Wire packets and the events a socket surfaces to its listeners.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag of the transport event that carries an inbound packet.
pub const PACKET: &str = "packet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    Connect,
    Disconnect,
    Event,
    ConnectError,
}

/// A JSON packet as it travels over a text frame.
///
/// Application events carry `data = [eventName, payload]`:
///
/// ```json
/// {"type":"event","data":["chat_message",{"text":"hi"}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(rename = "type")]
    pub kind: PacketKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Packet {
    /// Build an application event packet.
    pub fn event(name: &str, payload: Value) -> Self {
        Self {
            kind: PacketKind::Event,
            data: Some(Value::Array(vec![Value::String(name.to_string()), payload])),
        }
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Destructure `data` into `(eventName, payload)`.
    ///
    /// Missing or non-array data behaves like an empty pair. A first element
    /// that is not a string yields no name.
    pub fn event_parts(&self) -> (Option<&str>, Option<&Value>) {
        match &self.data {
            Some(Value::Array(items)) => (
                items.first().and_then(Value::as_str),
                items.get(1),
            ),
            _ => (None, None),
        }
    }
}

/// Everything a transport driver reports about its connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection was established.
    Open,
    /// An inbound packet.
    Packet(Packet),
    /// A keep-alive ping from the server.
    Ping,
    /// The driver hit an error (failed connect, unreadable frame, ...).
    Error(String),
    /// The connection is gone.
    Close { reason: String },
}

impl TransportEvent {
    /// Classification tag of this event.
    pub fn tag(&self) -> &'static str {
        match self {
            TransportEvent::Open => "open",
            TransportEvent::Packet(_) => PACKET,
            TransportEvent::Ping => "ping",
            TransportEvent::Error(_) => "error",
            TransportEvent::Close { .. } => "close",
        }
    }

    pub fn as_packet(&self) -> Option<&Packet> {
        match self {
            TransportEvent::Packet(packet) => Some(packet),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_packet_wire_shape() {
        let packet = Packet::event("chat_message", json!({ "text": "hi" }));
        let text = packet.to_text().unwrap();
        assert_eq!(
            text,
            r#"{"type":"event","data":["chat_message",{"text":"hi"}]}"#
        );
    }

    #[test]
    fn parse_packet_without_data() {
        let packet = Packet::parse(r#"{"type":"connect"}"#).unwrap();
        assert_eq!(packet.kind, PacketKind::Connect);
        assert_eq!(packet.data, None);
        assert_eq!(packet.event_parts(), (None, None));
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        assert!(Packet::parse(r#"{"type":"bogus"}"#).is_err());
        assert!(Packet::parse("not json").is_err());
    }

    #[test]
    fn event_parts_destructures_pairs() {
        let packet = Packet::parse(r#"{"type":"event","data":["update",{"count":5}]}"#).unwrap();
        let (name, payload) = packet.event_parts();
        assert_eq!(name, Some("update"));
        assert_eq!(payload, Some(&json!({ "count": 5 })));
    }

    #[test]
    fn event_parts_tolerates_short_and_odd_data() {
        let only_name = Packet::parse(r#"{"type":"event","data":["ping"]}"#).unwrap();
        assert_eq!(only_name.event_parts(), (Some("ping"), None));

        let numeric = Packet::parse(r#"{"type":"event","data":[7,"x"]}"#).unwrap();
        assert_eq!(numeric.event_parts(), (None, Some(&json!("x"))));

        let object = Packet::parse(r#"{"type":"connect","data":{"sid":"abc"}}"#).unwrap();
        assert_eq!(object.event_parts(), (None, None));
    }

    #[test]
    fn tags() {
        assert_eq!(TransportEvent::Open.tag(), "open");
        assert_eq!(TransportEvent::Ping.tag(), "ping");
        assert_eq!(TransportEvent::Error("x".into()).tag(), "error");
        assert_eq!(
            TransportEvent::Close {
                reason: "bye".into()
            }
            .tag(),
            "close"
        );
        let packet = TransportEvent::Packet(Packet::event("a", Value::Null));
        assert_eq!(packet.tag(), PACKET);
        assert!(packet.as_packet().is_some());
        assert!(TransportEvent::Open.as_packet().is_none());
    }
}
