//! Classification of inbound WebSocket frames.

use axum::extract::ws::Message;
use serde_json::Value;

/// What an inbound frame means to the session loop.
#[derive(Debug, PartialEq)]
pub enum Inbound {
    /// A well-formed JSON payload to relay.
    Payload(Value),
    /// A data frame that is not valid JSON (or not UTF-8).
    Malformed,
    /// Ping or Pong; proves liveness.
    Heartbeat,
    /// The peer started the close handshake.
    Close,
}

/// Decode one frame. Text and binary frames are both treated as JSON text.
pub fn decode(msg: &Message) -> Inbound {
    match msg {
        Message::Text(text) => decode_text(text.as_str()),
        Message::Binary(data) => match std::str::from_utf8(data) {
            Ok(text) => decode_text(text),
            Err(_) => Inbound::Malformed,
        },
        Message::Ping(_) | Message::Pong(_) => Inbound::Heartbeat,
        Message::Close(_) => Inbound::Close,
    }
}

fn decode_text(text: &str) -> Inbound {
    serde_json::from_str(text).map_or(Inbound::Malformed, Inbound::Payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_json_is_payload() {
        let msg = Message::Text(r#"{"chant":"olé"}"#.into());
        assert_eq!(decode(&msg), Inbound::Payload(json!({"chant": "olé"})));
    }

    #[test]
    fn scalar_json_is_payload() {
        assert_eq!(decode(&Message::Text("42".into())), Inbound::Payload(json!(42)));
    }

    #[test]
    fn garbage_text_is_malformed() {
        assert_eq!(decode(&Message::Text("{oops".into())), Inbound::Malformed);
        assert_eq!(decode(&Message::Text(String::new().into())), Inbound::Malformed);
    }

    #[test]
    fn binary_utf8_json_is_payload() {
        let msg = Message::Binary(br#"[1,2]"#.to_vec().into());
        assert_eq!(decode(&msg), Inbound::Payload(json!([1, 2])));
    }

    #[test]
    fn binary_non_utf8_is_malformed() {
        let msg = Message::Binary(vec![0xff, 0xfe].into());
        assert_eq!(decode(&msg), Inbound::Malformed);
    }

    #[test]
    fn control_frames() {
        assert_eq!(decode(&Message::Ping(Vec::new().into())), Inbound::Heartbeat);
        assert_eq!(decode(&Message::Pong(Vec::new().into())), Inbound::Heartbeat);
        assert_eq!(decode(&Message::Close(None)), Inbound::Close);
    }
}
