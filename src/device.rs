//! Device role bridge – the endpoint with event authority.
//!
//! Unlike the Local role, the Device decides when play begins and when the
//! pose resets: its host calls [`DeviceBridge::trigger_play_start`] and
//! [`DeviceBridge::trigger_reset`] directly instead of the bridge reacting
//! to remote events.
//!
//! The Device additionally manages a secondary service connection: the first
//! valid heartbeat starts the player's service against an address derived
//! from the peer's advertised host, guarded so it happens at most once per
//! session.
//!
//! ## Per-tick behaviour (`run`)
//!
//! 1. Heartbeat check (shared supervisor).  A valid request also updates the
//!    remembered saved pose and, if no service connection is active yet,
//!    starts the player's service.  Timeout runs the session reset routine.
//! 2. POSITIONING – the last remembered saved pose is replayed to the player
//!    **every tick**, even without a fresh packet (the player's base pose is
//!    used before any heartbeat payload has been seen).
//! 3. The avatar refresh hook runs every tick, regardless of state.

use crate::player::BridgePlayer;
use crate::supervisor::Supervisor;
use crate::transport::UdpTransport;
use crate::types::{BridgeConfig, BridgeState, PoseSnapshot};
use log::{error, info, warn};

pub struct DeviceBridge {
    config: BridgeConfig,
    transport: UdpTransport,
    supervisor: Supervisor,
    player: Option<Box<dyn BridgePlayer>>,
    /// Saved pose from the last valid heartbeat payload.
    saved_pose: Option<PoseSnapshot>,
    /// Guards the secondary service connection: started at most once per
    /// session.
    service_active: bool,
}

impl DeviceBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            transport: UdpTransport::new(&config),
            supervisor: Supervisor::new(config.heartbeat_timeout),
            player: None,
            saved_pose: None,
            service_active: false,
            config,
        }
    }

    /// Register the host's player.  Fails (returns `false`) when one is
    /// already registered.
    pub fn register(&mut self, player: Box<dyn BridgePlayer>) -> bool {
        if self.player.is_some() {
            warn!("a player is already registered");
            return false;
        }
        self.player = Some(player);
        info!("player registered");
        true
    }

    /// Start the receive loop.  The player's service is started later, once
    /// a heartbeat advertises the peer's host.
    pub fn start(&mut self) -> bool {
        if self.player.is_none() {
            warn!("no player registered – cannot start device bridge");
            return false;
        }
        if let Err(e) = self.transport.start() {
            error!("failed to start transport: {}", e);
            return false;
        }
        self.supervisor.arm();
        info!("device bridge starting");
        true
    }

    /// Stop the receive loop and the player's service.
    pub fn stop(&mut self) -> bool {
        let Some(player) = self.player.as_mut() else {
            warn!("no player registered – nothing to stop");
            return false;
        };
        self.transport.stop();
        info!("device bridge stopping");
        player.stop_service()
    }

    /// One tick of the session state machine.
    pub fn run(&mut self) {
        let tick = self.supervisor.check_heartbeat(&self.transport);

        if let Some(req) = tick.request {
            self.saved_pose = Some(req.saved_position);

            if !self.service_active {
                let addr = format!("ws://{}:{}", req.ip_address, self.config.service_port);
                if let Some(player) = self.player.as_mut() {
                    if player.start_service(&addr) {
                        info!("player service started against {}", addr);
                        self.service_active = true;
                    } else {
                        warn!("player service failed to start against {}", addr);
                    }
                }
            }
        }

        if tick.timed_out {
            self.reset_session();
        }

        let Some(player) = self.player.as_mut() else {
            return;
        };

        if self.supervisor.state.state() == BridgeState::Positioning {
            // Replay the last known snapshot, not gated on a fresh packet.
            let (position, rotation) = match &self.saved_pose {
                Some(pose) => (pose.position, pose.orientation),
                None => player.base_position(),
            };
            player.update_position(position, rotation);
        }

        player.update_avatars();
    }

    /// Host decision: play begins now (POSITIONING → PLAYING).
    pub fn trigger_play_start(&mut self) {
        self.supervisor.state.event_play_start();
    }

    /// Host decision: reset the session to POSITIONING.
    pub fn trigger_reset(&mut self) {
        self.reset_session();
    }

    pub fn state(&self) -> BridgeState {
        self.supervisor.state.state()
    }

    /// Actual bound receive address, available while running.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The bridge's transport, for host-side inspection.
    pub fn transport(&self) -> &UdpTransport {
        &self.transport
    }

    /// Tear down the session: when PLAYING, re-align the player and stop its
    /// service; always flush the cache and return to POSITIONING.
    fn reset_session(&mut self) {
        if self.supervisor.state.state() == BridgeState::Playing {
            if let Some(player) = self.player.as_mut() {
                player.reset_position();
                player.stop_service();
            }
            self.service_active = false;
        }
        self.transport.clear_cache();
        self.supervisor.state.event_reset();
    }
}
