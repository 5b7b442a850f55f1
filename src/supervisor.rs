//! Session state management and the heartbeat bookkeeping shared by both
//! bridge roles.
//!
//! The two roles differ in **who owns transitions** (the Local role reacts to
//! remote events, the Device role is driven by its host), but both perform
//! the same per-tick heartbeat check: acknowledge the peer's liveness packet,
//! capture its advertised reply port, and watch for the silence window that
//! collapses the session back to POSITIONING.

use crate::protocol::{categories, HeartbeatRequest, Packet};
use crate::transport::UdpTransport;
use crate::types::BridgeState;
use log::{debug, warn};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// State manager
// ---------------------------------------------------------------------------

/// Owns the POSITIONING/PLAYING phase of one bridge.  Mutated only on the
/// tick thread.
pub struct StateManager {
    state: BridgeState,
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            state: BridgeState::Positioning,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Play begins: POSITIONING → PLAYING.  Ignored in any other phase.
    pub fn event_play_start(&mut self) {
        if self.state == BridgeState::Positioning {
            debug!("transitioning from POSITIONING to PLAYING");
            self.state = BridgeState::Playing;
        }
    }

    /// Disconnect or reset: any phase → POSITIONING.
    pub fn event_reset(&mut self) {
        self.state = BridgeState::Positioning;
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Heartbeat supervisor
// ---------------------------------------------------------------------------

/// Outcome of one per-tick heartbeat check.
pub struct HeartbeatTick {
    /// The validated heartbeat payload, if one was received and acknowledged.
    pub request: Option<HeartbeatRequest>,
    /// The silence window was exceeded; the caller must fall back to
    /// POSITIONING.
    pub timed_out: bool,
}

/// Heartbeat liveness bookkeeping plus the session state manager.
pub struct Supervisor {
    pub state: StateManager,
    timeout: Duration,
    last_beat: Instant,
}

impl Supervisor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: StateManager::new(),
            timeout,
            last_beat: Instant::now(),
        }
    }

    /// Re-arm the liveness clock (called when a bridge starts, so a peer that
    /// never shows up still times out relative to the start instant).
    pub fn arm(&mut self) {
        self.last_beat = Instant::now();
    }

    /// Consume the cached `heartbeat_request` (if any), acknowledge it with
    /// the current state string, and report whether the timeout elapsed.
    ///
    /// A request without a peer address is malformed: it is logged, skipped,
    /// and does not refresh liveness.
    pub fn check_heartbeat(&mut self, transport: &UdpTransport) -> HeartbeatTick {
        let mut request = None;

        if let Some(packet) = transport.take(categories::HEARTBEAT_REQUEST) {
            match HeartbeatRequest::from_packet(&packet) {
                Ok(req) if !req.ip_address.is_empty() => {
                    self.last_beat = Instant::now();
                    transport.set_reply_port(req.server_port);
                    let reply = Packet::heartbeat_response(self.state.state().to_string());
                    transport.send(&reply);
                    request = Some(req);
                }
                Ok(_) => warn!("heartbeat_request carries an empty ip_address – skipped"),
                Err(e) => warn!("invalid heartbeat_request payload: {}", e),
            }
        }

        HeartbeatTick {
            request,
            timed_out: self.last_beat.elapsed() > self.timeout,
        }
    }
}
