//! Control message schema.
//!
//! The reserved `effect` sub-topic carries a JSON object selecting the next
//! animation: a required `effect` name plus any effect-specific fields, e.g.
//! `{ "effect": "cross", "color": [200, 0, 0], "wait": 500 }`.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::params::EffectParams;

/// Parsed effect-selection message.
#[derive(Debug, Clone)]
pub struct ControlMessage {
    /// Requested effect name, matched case-insensitively against the registry.
    pub effect: String,
    /// Remaining fields, handed to the effect constructor.
    pub params: EffectParams,
}

impl ControlMessage {
    /// Parse a control message from JSON text.
    ///
    /// # Errors
    /// Returns a control-message error for non-JSON input, non-object
    /// payloads and a missing or blank `effect` field.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::ControlMessage(format!("invalid JSON: {e}")))?;
        let Value::Object(mut map) = value else {
            return Err(Error::ControlMessage(format!(
                "payload must be a JSON object, not {value}"
            )));
        };
        let effect = match map.remove("effect") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
            Some(other) => {
                return Err(Error::ControlMessage(format!(
                    "\"effect\" must be a non-empty string, not {other}"
                )));
            }
            None => return Err(Error::ControlMessage("no \"effect\" in payload".into())),
        };
        Ok(Self {
            effect,
            params: EffectParams::from_map(map),
        })
    }

    /// Parse a control message from a raw MQTT payload.
    ///
    /// # Errors
    /// Returns a control-message error for non-UTF-8 payloads, plus
    /// everything [`from_json`](Self::from_json) rejects.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| Error::ControlMessage("payload is not valid UTF-8".into()))?;
        Self::from_json(text.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn parses_effect_and_params() {
        let msg =
            ControlMessage::from_json(r#"{ "effect": "cross", "color": [200, 0, 0], "wait": 500 }"#)
                .unwrap();
        assert_eq!(msg.effect, "cross");
        assert_eq!(msg.params.color_or(Rgb::RED).unwrap(), Rgb(200, 0, 0));
        assert_eq!(msg.params.u64_or("wait", 100).unwrap(), 500);
    }

    #[test]
    fn rejects_missing_effect_field() {
        assert!(ControlMessage::from_json(r#"{ "color": [1, 2, 3] }"#).is_err());
        assert!(ControlMessage::from_json(r#"{ "effect": "" }"#).is_err());
        assert!(ControlMessage::from_json(r#"{ "effect": 7 }"#).is_err());
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(ControlMessage::from_json("\"cross\"").is_err());
        assert!(ControlMessage::from_json("not json at all").is_err());
    }

    #[test]
    fn trims_payload_whitespace() {
        let msg = ControlMessage::from_payload(b"  { \"effect\": \"cycle\" }\n").unwrap();
        assert_eq!(msg.effect, "cycle");
        assert!(msg.params.is_empty());
    }

    #[test]
    fn rejects_non_utf8_payloads() {
        assert!(ControlMessage::from_payload(&[0xff, 0xfe, 0x7b]).is_err());
    }
}
