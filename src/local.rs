//! Local role bridge – the AR viewer endpoint.
//!
//! The Local role reacts **passively** to protocol packets: the peer decides
//! when play starts (`play_start`) and when the session resets (`reset`);
//! this side forwards incoming pose data to its [`BridgePlayer`] and answers
//! heartbeats.
//!
//! ## Per-tick behaviour (`run`)
//!
//! 1. Heartbeat check (shared supervisor): acknowledge the peer, learn its
//!    reply port, fall back to POSITIONING on timeout.
//! 2. POSITIONING – a cached `play_start` event transitions to PLAYING and
//!    ends the tick; otherwise the latest `position` payload (when
//!    well-formed) is forwarded to the player.
//! 3. PLAYING – a cached `reset` event resets the player pose, recycles the
//!    transport (fresh cache, fresh receive loop) and returns to
//!    POSITIONING; otherwise the avatar refresh hook runs.

use crate::player::BridgePlayer;
use crate::protocol::{categories, pose_from_packet};
use crate::supervisor::Supervisor;
use crate::transport::UdpTransport;
use crate::types::{BridgeConfig, BridgeState};
use log::{debug, error, info, warn};

pub struct LocalBridge {
    config: BridgeConfig,
    transport: UdpTransport,
    supervisor: Supervisor,
    player: Option<Box<dyn BridgePlayer>>,
    /// Service address derived from the peer's last heartbeat; empty until
    /// one has been seen.
    server_addr: String,
}

impl LocalBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            transport: UdpTransport::new(&config),
            supervisor: Supervisor::new(config.heartbeat_timeout),
            player: None,
            server_addr: String::new(),
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

    /// Start the receive loop and the player's service.  Requires a
    /// registered player; bind failure aborts the start.
    pub fn start(&mut self) -> bool {
        let Some(player) = self.player.as_mut() else {
            warn!("no player registered – cannot start local bridge");
            return false;
        };
        if let Err(e) = self.transport.start() {
            error!("failed to start transport: {}", e);
            return false;
        }
        self.supervisor.arm();
        info!("local bridge starting");
        player.start_service(&self.server_addr)
    }

    /// Stop the receive loop and the player's service.
    pub fn stop(&mut self) -> bool {
        let Some(player) = self.player.as_mut() else {
            warn!("no player registered – nothing to stop");
            return false;
        };
        self.transport.stop();
        info!("local bridge stopping");
        player.stop_service()
    }

    /// One tick of the session state machine.
    pub fn run(&mut self) {
        let tick = self.supervisor.check_heartbeat(&self.transport);
        if let Some(req) = tick.request {
            self.server_addr = format!("ws://{}:{}", req.ip_address, self.config.service_port);
        }
        if tick.timed_out {
            // Loss of the peer always reverts to re-alignment.
            self.supervisor.state.event_reset();
        }

        let Some(player) = self.player.as_mut() else {
            return;
        };

        match self.supervisor.state.state() {
            BridgeState::Positioning => {
                if self.transport.take(categories::PLAY_START).is_some() {
                    self.supervisor.state.event_play_start();
                    return;
                }
                if let Some(packet) = self.transport.latest(categories::POSITION) {
                    match pose_from_packet(&packet) {
                        Ok(pose) => player.update_position(pose.position, pose.orientation),
                        Err(e) => warn!("skipping malformed position payload: {}", e),
                    }
                }
            }
            BridgeState::Playing => {
                if self.transport.take(categories::RESET).is_some() {
                    debug!("reset event received – recycling session");
                    player.reset_position();
                    self.transport.stop();
                    self.transport.clear_cache();
                    if let Err(e) = self.transport.start() {
                        error!("failed to restart transport after reset: {}", e);
                    }
                    self.supervisor.state.event_reset();
                    return;
                }
                player.update_avatars();
            }
        }
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
}
