use serde_json::Value;

use crate::event::RawEvent;

/// Request body shape, decided once right after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestPayload {
    /// Top-level array. Non-object entries are already dropped.
    Batch(Vec<RawEvent>),
    Single(RawEvent),
    /// Valid JSON of any other shape (number, string, bool, null).
    Invalid,
}

impl IngestPayload {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::classify(&value))
    }

    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Array(items) => IngestPayload::Batch(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(RawEvent::from)
                    .collect(),
            ),
            Value::Object(object) => IngestPayload::Single(RawEvent::from(object)),
            _ => IngestPayload::Invalid,
        }
    }
}
