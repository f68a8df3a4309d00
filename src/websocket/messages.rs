//! WebSocket Message Types
//!
//! Defines the JSON frames exchanged between the sensor server and
//! dashboards. Inbound frames are tagged by a `type` field; only known tags
//! are acted upon.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Type tag of Bioharness sensor frames
pub const BIOHARNESS: &str = "bioharness";

/// Messages received by a dashboard from the sensor server
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Batches of Bioharness samples keyed by series name
    Bioharness(SeriesPayload),
    /// Any frame whose `type` is missing or unknown
    Unrecognized {
        /// The `type` field, if it was a string
        kind: Option<String>,
    },
}

impl InboundMessage {
    /// Parse a text frame. Only malformed JSON is an error; any valid JSON
    /// value maps to some variant.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match kind.as_deref() {
            Some(BIOHARNESS) => Self::Bioharness(SeriesPayload::from_value(value)),
            _ => Self::Unrecognized { kind },
        }
    }

    /// The frame's type tag
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Bioharness(_) => Some(BIOHARNESS),
            Self::Unrecognized { kind } => kind.as_deref(),
        }
    }
}

/// Sample batches of one frame, keyed by series name.
///
/// Only keys whose value is an array of numbers are kept. Anything else in
/// the frame (the type tag, timestamps, malformed batches) is dropped here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesPayload {
    batches: HashMap<String, Vec<f64>>,
}

impl SeriesPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let batches = map
            .into_iter()
            .filter(|(key, _)| key != "type")
            .filter_map(|(key, value)| match to_batch(&value) {
                Some(batch) => Some((key, batch)),
                None => {
                    tracing::trace!(key = %key, "Skipping non-batch field");
                    None
                }
            })
            .collect();

        Self { batches }
    }

    /// Add or replace one batch
    pub fn insert(&mut self, name: impl Into<String>, batch: Vec<f64>) {
        self.batches.insert(name.into(), batch);
    }

    pub fn batch(&self, name: &str) -> Option<&[f64]> {
        self.batches.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.batches.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

fn to_batch(value: &Value) -> Option<Vec<f64>> {
    value.as_array()?.iter().map(Value::as_f64).collect()
}

/// Sensor frame broadcast by the feed server
#[derive(Debug, Clone, Serialize)]
pub struct SensorFrame {
    #[serde(rename = "type")]
    pub kind: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Sample batches, flattened into the frame as `name: [..]`
    #[serde(flatten)]
    pub series: BTreeMap<String, Vec<f64>>,
}

impl SensorFrame {
    pub fn bioharness(timestamp: i64, series: BTreeMap<String, Vec<f64>>) -> Self {
        Self {
            kind: BIOHARNESS.to_string(),
            timestamp,
            series,
        }
    }
}

/// Generic outbound control envelope: `{"type": .., "value": ..}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
}

impl ControlMessage {
    pub fn new(kind: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Recording-session commands understood by the collection server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoggingCommand {
    /// Start a new recording session named after subject and session name
    #[serde(rename = "LOG")]
    Start { subject: String, name: String },
    /// Stop writing to the recording session
    #[serde(rename = "STOP_LOG")]
    Stop,
}

/// Messages sent from a dashboard to the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Logging(LoggingCommand),
    Control(ControlMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bioharness_frame() {
        let msg = InboundMessage::parse(r#"{"type": "bioharness", "heart_rate": [72, 74]}"#)
            .unwrap();
        match msg {
            InboundMessage::Bioharness(payload) => {
                assert_eq!(payload.batch("heart_rate"), Some(&[72.0, 74.0][..]));
                assert_eq!(payload.len(), 1);
            }
            _ => panic!("Expected Bioharness"),
        }
    }

    #[test]
    fn test_parse_unknown_type() {
        let msg = InboundMessage::parse(r#"{"type": "foo", "heart_rate": [1]}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Unrecognized {
                kind: Some("foo".to_string())
            }
        );
        assert_eq!(msg.kind(), Some("foo"));
    }

    #[test]
    fn test_parse_missing_or_non_string_type() {
        let msg = InboundMessage::parse(r#"{"heart_rate": [1]}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unrecognized { kind: None });

        let msg = InboundMessage::parse(r#"{"type": 7}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unrecognized { kind: None });

        let msg = InboundMessage::parse("[1, 2, 3]").unwrap();
        assert_eq!(msg, InboundMessage::Unrecognized { kind: None });
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(InboundMessage::parse("{not json").is_err());
        assert!(InboundMessage::parse("").is_err());
    }

    #[test]
    fn test_type_tag_is_case_sensitive() {
        let msg = InboundMessage::parse(r#"{"type": "Bioharness"}"#).unwrap();
        assert!(matches!(msg, InboundMessage::Unrecognized { .. }));
    }

    #[test]
    fn test_payload_skips_non_batch_fields() {
        let payload = SeriesPayload::from_value(json!({
            "type": "bioharness",
            "timestamp": 1699000000000_i64,
            "ecg": [0.1, 0.2],
            "rr": "fast",
            "breathing": [1, "x"],
            "acceleration_x": [],
        }));

        assert_eq!(payload.batch("ecg"), Some(&[0.1, 0.2][..]));
        assert_eq!(payload.batch("acceleration_x"), Some(&[] as &[f64]));
        assert!(payload.batch("timestamp").is_none());
        assert!(payload.batch("rr").is_none());
        assert!(payload.batch("breathing").is_none());
        assert!(payload.batch("type").is_none());
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_sensor_frame_serialize() {
        let mut series = BTreeMap::new();
        series.insert("heart_rate".to_string(), vec![72.0]);
        let frame = SensorFrame::bioharness(1699000000000, series);

        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"bioharness\""));
        assert!(json.contains("\"heart_rate\":[72.0]"));

        // A dashboard reads it back as a bioharness payload
        match InboundMessage::parse(&json).unwrap() {
            InboundMessage::Bioharness(payload) => {
                assert_eq!(payload.batch("heart_rate"), Some(&[72.0][..]));
                assert!(payload.batch("timestamp").is_none());
            }
            _ => panic!("Expected Bioharness"),
        }
    }

    #[test]
    fn test_control_message_envelope() {
        let msg = ControlMessage::new("marker", json!({"label": "baseline"}));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"type": "marker", "value": {"label": "baseline"}}));
    }

    #[test]
    fn test_logging_command_serialize() {
        let start = LoggingCommand::Start {
            subject: "S01".to_string(),
            name: "baseline".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&start).unwrap(),
            json!({"type": "LOG", "subject": "S01", "name": "baseline"})
        );
        assert_eq!(
            serde_json::to_value(LoggingCommand::Stop).unwrap(),
            json!({"type": "STOP_LOG"})
        );
    }

    #[test]
    fn test_client_message_deserialize() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "LOG", "subject": "S01", "name": "run1"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Logging(LoggingCommand::Start { .. })));

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "STOP_LOG"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Logging(LoggingCommand::Stop));

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "volume", "value": 3}"#).unwrap();
        assert_eq!(msg, ClientMessage::Control(ControlMessage::new("volume", 3)));
    }
}
