//! Message envelope.
//!
//! Every frame exchanged after the handshake is a JSON object of the shape
//! `{ "type": string, "data": any, "timestamp"?: integer }`. The `type` is a
//! free-form discriminator interpreted only by application handlers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A single message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Application-defined discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque payload.
    #[serde(default)]
    pub data: Value,
    /// Epoch milliseconds. Filled in at send time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Envelope {
    /// Create an envelope without a timestamp.
    pub fn new(kind: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
            timestamp: None,
        }
    }

    /// Set an explicit timestamp, preserved verbatim on the wire.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Copy of this envelope with the timestamp filled in if it was missing.
    pub fn stamped(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            data: self.data.clone(),
            timestamp: Some(self.timestamp.unwrap_or_else(now_millis)),
        }
    }

    /// Serialize to a text frame. Does not stamp.
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Stamp (if needed) and serialize in one step.
    pub fn to_stamped_frame(&self) -> Result<String, ProtocolError> {
        self.stamped().to_frame()
    }

    /// Decode an inbound text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

        if !value.is_object() {
            return Err(ProtocolError::InvalidShape(
                "frame is not a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::InvalidShape(e.to_string()))
    }

    /// Decode `data` into an application type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| ProtocolError::InvalidShape(e.to_string()))
    }
}
