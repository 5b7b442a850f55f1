//! AR bridge wire protocol.
//!
//! This module owns **every message that crosses the UDP boundary** between
//! the Local endpoint (AR viewer) and the Device endpoint.
//!
//! ## Envelope
//!
//! One datagram carries exactly one UTF-8 JSON object:
//!
//! ```json
//! {"kind": "data",  "category": "heartbeat_request", "data": { ... }}
//! {"kind": "event", "event_name": "play_start"}
//! ```
//!
//! | `kind`  | Discriminator field | Values                                                |
//! |---------|---------------------|-------------------------------------------------------|
//! | `data`  | `category`          | `heartbeat_request`, `heartbeat_response`, `position` |
//! | `event` | `event_name`        | `play_start`, `reset`                                 |
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON.
//! 2. Exactly one of `category` / `event_name` is set, consistent with `kind`.
//! 3. Packets are immutable once constructed; decode never panics on
//!    malformed input.
//! 4. `decode(encode(p)) == p` for every constructible packet.

use crate::types::PoseSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Datagram was not a valid JSON packet.
    #[error("undecodable packet: {0}")]
    Decode(#[from] serde_json::Error),

    /// Event name outside the protocol's event set.
    #[error("invalid event name '{0}', expected 'play_start' or 'reset'")]
    InvalidEvent(String),

    /// Packet kind/category did not match the expected payload schema, or a
    /// required payload field was absent.
    #[error("schema mismatch for '{expected}': {detail}")]
    Schema {
        expected: &'static str,
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Cache keys
// ---------------------------------------------------------------------------

/// Category and event names as they appear on the wire.  Doubles as the key
/// set of the transport's latest-packet cache.
pub mod categories {
    pub const HEARTBEAT_REQUEST: &str = "heartbeat_request";
    pub const HEARTBEAT_RESPONSE: &str = "heartbeat_response";
    pub const POSITION: &str = "position";

    pub const PLAY_START: &str = "play_start";
    pub const RESET: &str = "reset";
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    Data,
    Event,
}

/// The wire unit.  Constructed immediately before serialization, decoded
/// into an ephemeral value on receipt, never mutated in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub kind: PacketKind,
    /// Payload schema selector; set iff `kind == Data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Event selector; set iff `kind == Event`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Category-specific key→value payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Packet {
    fn data(category: &str, data: Value) -> Self {
        Self {
            kind: PacketKind::Data,
            category: Some(category.to_string()),
            event_name: None,
            data: Some(data),
        }
    }

    /// Build an event packet.  [`EventKind`] restricts the name to the
    /// protocol's event set.
    pub fn event(kind: EventKind) -> Self {
        Self {
            kind: PacketKind::Event,
            category: None,
            event_name: Some(kind.as_str().to_string()),
            data: None,
        }
    }

    pub fn heartbeat_request(req: &HeartbeatRequest) -> Result<Self, ProtocolError> {
        Ok(Self::data(
            categories::HEARTBEAT_REQUEST,
            serde_json::to_value(req)?,
        ))
    }

    pub fn heartbeat_response(status: impl Into<String>) -> Self {
        let payload = HeartbeatResponse {
            status: status.into(),
        };
        // A one-field string struct always serializes.
        let data = serde_json::to_value(&payload).unwrap_or(Value::Null);
        Self::data(categories::HEARTBEAT_RESPONSE, data)
    }

    pub fn position(pose: &PoseSnapshot) -> Result<Self, ProtocolError> {
        Ok(Self::data(categories::POSITION, serde_json::to_value(pose)?))
    }

    /// Key under which the transport caches this packet: the category for
    /// data packets, the event name for event packets.  `None` when the
    /// envelope invariant is violated.
    pub fn cache_key(&self) -> Option<&str> {
        match self.kind {
            PacketKind::Data => self.category.as_deref(),
            PacketKind::Event => self.event_name.as_deref(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn expect_data(&self, category: &'static str) -> Result<&Value, ProtocolError> {
        if self.kind != PacketKind::Data || self.category.as_deref() != Some(category) {
            return Err(ProtocolError::Schema {
                expected: category,
                detail: format!(
                    "kind={:?}, category={:?}, event_name={:?}",
                    self.kind, self.category, self.event_name
                ),
            });
        }
        self.data.as_ref().ok_or(ProtocolError::Schema {
            expected: category,
            detail: "missing data payload".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PlayStart,
    Reset,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PlayStart => categories::PLAY_START,
            EventKind::Reset => categories::RESET,
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ProtocolError> {
        match name {
            categories::PLAY_START => Ok(EventKind::PlayStart),
            categories::RESET => Ok(EventKind::Reset),
            other => Err(ProtocolError::InvalidEvent(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed payloads
// ---------------------------------------------------------------------------

/// Announces liveness and the sender's last-known pose.
///
/// `ip_address` is the host the receiver derives its service address from;
/// `server_port` is the sender's own UDP listening port, used to override the
/// receiver's reply port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub ip_address: String,
    pub server_port: u16,
    pub saved_position: PoseSnapshot,
}

impl HeartbeatRequest {
    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        let data = packet.expect_data(categories::HEARTBEAT_REQUEST)?;
        serde_json::from_value(data.clone()).map_err(|e| ProtocolError::Schema {
            expected: categories::HEARTBEAT_REQUEST,
            detail: e.to_string(),
        })
    }
}

/// Carries the responder's current session state as a string
/// (`"POSITIONING"` / `"PLAYING"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub status: String,
}

impl HeartbeatResponse {
    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        let data = packet.expect_data(categories::HEARTBEAT_RESPONSE)?;
        serde_json::from_value(data.clone()).map_err(|e| ProtocolError::Schema {
            expected: categories::HEARTBEAT_RESPONSE,
            detail: e.to_string(),
        })
    }
}

/// Extract the pose payload of a `position` data packet.
pub fn pose_from_packet(packet: &Packet) -> Result<PoseSnapshot, ProtocolError> {
    let data = packet.expect_data(categories::POSITION)?;
    serde_json::from_value(data.clone()).map_err(|e| ProtocolError::Schema {
        expected: categories::POSITION,
        detail: e.to_string(),
    })
}
