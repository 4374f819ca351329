//! Client -> Server message decoding.

use crate::ProtocolError;
use serde::Deserialize;

/// The join handshake, sent as the first message on a new connection.
#[derive(Debug, Clone, Deserialize)]
pub struct Join {
    pub name: String,
    pub color: String,
}

impl Join {
    /// Decode a join handshake from a raw JSON text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Any message accepted after the join handshake.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Target point in map coordinates the avatar eases toward.
    Move { x: f64, y: f64 },
}

impl ClientMessage {
    /// Decode a post-handshake message from a raw JSON text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_join() {
        let join = Join::decode(r#"{"name":"alice","color":"rgb(10,20,30)"}"#).unwrap();
        assert_eq!(join.name, "alice");
        assert_eq!(join.color, "rgb(10,20,30)");
    }

    #[test]
    fn decodes_move() {
        let msg = ClientMessage::decode(r#"{"type":"move","x":120.5,"y":-4}"#).unwrap();
        let ClientMessage::Move { x, y } = msg;
        assert_eq!(x, 120.5);
        assert_eq!(y, -4.0);
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(Join::decode(r#"{"name":"bob"}"#).is_err());
        assert!(ClientMessage::decode(r#"{"type":"move","x":1.0}"#).is_err());
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(ClientMessage::decode(r#"{"type":"teleport","x":0,"y":0}"#).is_err());
        assert!(ClientMessage::decode("not json").is_err());
    }
}
