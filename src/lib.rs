//! AR Pose Bridge
//!
//! Synchronizes spatial pose between two peers — a **Local** endpoint (an AR
//! viewer) and a **Device** endpoint — over unreliable UDP, with a
//! heartbeat-driven POSITIONING/PLAYING session state machine.
//!
//! ## Architecture
//!
//! ```text
//! LocalBridge / DeviceBridge  (local.rs, device.rs)  ← role state machines
//!   ├── Supervisor   (supervisor.rs) ← heartbeat bookkeeping, transitions
//!   ├── UdpTransport (transport.rs)  ← socket, receive loop, packet cache
//!   │     └── Packet (protocol.rs)   ← JSON wire envelopes
//!   └── BridgePlayer (player.rs)     ← host-supplied pose/service sink
//! ```
//!
//! An external driver calls `run()` at a fixed cadence (typically 1 Hz).
//! There is no delivery guarantee and no retry: resilience comes from
//! re-sending current state every tick and from the heartbeat timeout
//! collapsing the session to POSITIONING.

pub mod device;
pub mod local;
pub mod player;
pub mod protocol;
pub mod supervisor;
pub mod transport;
pub mod types;

// Convenience re-exports
pub use device::DeviceBridge;
pub use local::LocalBridge;
pub use player::BridgePlayer;
pub use protocol::{categories, EventKind, HeartbeatRequest, HeartbeatResponse, Packet, PacketKind};
pub use supervisor::{StateManager, Supervisor};
pub use transport::UdpTransport;
pub use types::{BridgeConfig, BridgeError, BridgeState, PoseSnapshot, Vec3};
