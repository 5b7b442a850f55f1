//! Player capability – the host-supplied sink for pose updates and service
//! lifecycle.
//!
//! The core never assumes a concrete implementation: an AR viewer, a game
//! engine avatar rig, or a test recorder all plug in through this trait.

use crate::types::Vec3;

pub trait BridgePlayer: Send {
    /// Start the player's own service against `server_addr` (may be empty if
    /// no peer has been seen yet).  Returns whether startup succeeded.
    fn start_service(&mut self, server_addr: &str) -> bool;

    /// Stop the player's service.  Returns whether shutdown succeeded.
    fn stop_service(&mut self) -> bool;

    /// Apply a pose update (position + Euler orientation).
    fn update_position(&mut self, position: Vec3, rotation: Vec3);

    /// The player's reference pose, used before any peer pose is known.
    fn base_position(&self) -> (Vec3, Vec3);

    /// Re-align the player's pose to its reference.
    fn reset_position(&mut self);

    /// Per-tick avatar refresh hook; takes no packet input.
    fn update_avatars(&mut self);
}
