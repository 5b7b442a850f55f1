//! Core types shared across all modules.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// A pose sample (position + Euler orientation) in a named reference frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoseSnapshot {
    /// Reference frame identifier (e.g. `"unity"`).
    pub frame_type: String,
    pub position: Vec3,
    pub orientation: Vec3,
}

impl PoseSnapshot {
    pub fn new(frame_type: impl Into<String>, position: Vec3, orientation: Vec3) -> Self {
        Self {
            frame_type: frame_type.into(),
            position,
            orientation,
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Session phase of a bridge.  Owned exclusively by the state manager and
/// mutated only on the tick thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Pose is being re-aligned.
    Positioning,
    /// Pose tracking is live.
    Playing,
}

impl std::fmt::Display for BridgeState {
    /// Renders the protocol status strings carried in heartbeat responses.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeState::Positioning => write!(f, "POSITIONING"),
            BridgeState::Playing => write!(f, "PLAYING"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Fixed UDP port the transport binds for receiving (0 = ephemeral).
    pub recv_port: u16,
    /// Default port component of the learned peer address.  Overridden once
    /// the peer advertises its own listening port via a heartbeat.
    pub reply_port: u16,
    /// Port of the Player service address derived on the Device side.
    pub service_port: u16,
    /// Silence window after which the peer is presumed gone.
    pub heartbeat_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            recv_port: 38528,
            reply_port: 48528,
            service_port: 8765,
            heartbeat_timeout: Duration::from_secs(5),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Receive port could not be bound; aborts `start`.
    #[error("failed to bind receive socket: {0}")]
    Bind(#[source] std::io::Error),
}
