//! Datagram transport – UDP socket, background receive loop, and the
//! latest-packet cache.
//!
//! ## Threading model
//!
//! ```text
//! Tick thread                  │  Receive thread
//! ──────────────────────────── │ ─────────────────────────────
//! latest(key) / take(key)      │  loop while running:
//! send(packet)                 │    recv_from (bounded by timeout)
//! set_reply_port(port)         │    decode → classify by key
//! clear_cache()                │    lock { learn peer, cache[key] = packet }
//! ```
//!
//! The cache keeps **at most one packet per key** — entries are overwritten,
//! never queued, so readers always observe the most recent state and nothing
//! else.  The peer address is learned dynamically: IP from the sender of the
//! last received datagram, port from the configured (or advertised) reply
//! port.  Until the first datagram arrives the peer is unknown and `send` is
//! a logged no-op.

use crate::protocol::Packet;
use crate::types::{BridgeConfig, BridgeError};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often the receive loop wakes up to observe a stop request.
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on one datagram; the JSON envelopes stay far below this.
const MAX_DATAGRAM: usize = 4096;

// ---------------------------------------------------------------------------
// Shared state (tick thread ↔ receive thread)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SharedState {
    /// Most recent packet per category / event name.
    cache: HashMap<String, Packet>,
    /// IP of the sender of the last received datagram.
    peer_ip: Option<IpAddr>,
    /// Port component of the derived peer address.
    reply_port: u16,
    /// When the last decodable datagram arrived.
    last_recv: Option<Instant>,
}

struct Shared {
    running: AtomicBool,
    state: Mutex<SharedState>,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

pub struct UdpTransport {
    recv_port: u16,
    shared: Arc<Shared>,
    /// Bound while running; also used for sending.
    socket: Option<UdpSocket>,
    handle: Option<thread::JoinHandle<()>>,
}

impl UdpTransport {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            recv_port: config.recv_port,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                state: Mutex::new(SharedState {
                    reply_port: config.reply_port,
                    ..SharedState::default()
                }),
            }),
            socket: None,
            handle: None,
        }
    }

    /// Bind the receive socket and spawn the receive loop.  No-op while
    /// already running.
    pub fn start(&mut self) -> Result<(), BridgeError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let socket =
            UdpSocket::bind(("0.0.0.0", self.recv_port)).map_err(BridgeError::Bind)?;
        // A read timeout bounds the blocking recv so stop() can be observed.
        socket
            .set_read_timeout(Some(RECV_POLL_INTERVAL))
            .map_err(BridgeError::Bind)?;
        let recv_socket = socket.try_clone().map_err(BridgeError::Bind)?;

        self.shared.running.store(true, Ordering::SeqCst);
        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name("ar-bridge-recv".into())
            .spawn(move || receive_loop(recv_socket, shared))
            .map_err(BridgeError::Bind)?;

        debug!("transport listening on {:?}", socket.local_addr().ok());
        self.socket = Some(socket);
        self.handle = Some(handle);
        Ok(())
    }

    /// Signal the receive loop to terminate and wait for it to exit.  The
    /// socket is closed only after the thread is gone.  Idempotent.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("receive thread panicked during shutdown");
            }
        }
        self.socket = None;
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Serialize and send to the currently known peer.  Fire-and-forget: an
    /// unknown peer or a failed send is logged and swallowed.
    pub fn send(&self, packet: &Packet) {
        let Some(peer) = self.peer_addr() else {
            debug!("no peer address learned yet – dropping outbound packet");
            return;
        };
        let Some(socket) = self.socket.as_ref() else {
            debug!("transport not started – dropping outbound packet");
            return;
        };
        match packet.encode() {
            Ok(bytes) => {
                if let Err(e) = socket.send_to(&bytes, peer) {
                    warn!("failed to send packet to {}: {}", peer, e);
                }
            }
            Err(e) => warn!("failed to encode outbound packet: {}", e),
        }
    }

    /// Most recent packet cached under `key`, or `None` if none has arrived.
    pub fn latest(&self, key: &str) -> Option<Packet> {
        self.shared.state.lock().cache.get(key).cloned()
    }

    /// Remove and return the cached packet for `key`, so one datagram drives
    /// exactly one reaction.
    pub fn take(&self, key: &str) -> Option<Packet> {
        self.shared.state.lock().cache.remove(key)
    }

    /// Drop all cached entries so stale pose/event data cannot leak into a
    /// fresh session.
    pub fn clear_cache(&self) {
        self.shared.state.lock().cache.clear();
    }

    /// Override the port component of the derived peer address (used once a
    /// peer advertises its own listening port).
    pub fn set_reply_port(&self, port: u16) {
        self.shared.state.lock().reply_port = port;
    }

    /// The address outbound packets go to; `None` until the first datagram
    /// has been received.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        let state = self.shared.state.lock();
        state.peer_ip.map(|ip| SocketAddr::new(ip, state.reply_port))
    }

    /// When the last decodable datagram arrived.
    pub fn last_recv(&self) -> Option<Instant> {
        self.shared.state.lock().last_recv
    }

    /// Actual bound address (relevant when `recv_port` is 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Receive loop
// ---------------------------------------------------------------------------

fn receive_loop(socket: UdpSocket, shared: Arc<Shared>) {
    let mut buf = [0u8; MAX_DATAGRAM];

    while shared.running.load(Ordering::SeqCst) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                if shared.running.load(Ordering::SeqCst) {
                    warn!("socket receive error: {}", e);
                }
                continue;
            }
        };

        // Malformed datagrams never terminate the loop.
        let packet = match Packet::decode(&buf[..len]) {
            Ok(p) => p,
            Err(e) => {
                warn!("dropping undecodable datagram from {}: {}", src, e);
                continue;
            }
        };
        let Some(key) = packet.cache_key().map(str::to_string) else {
            warn!("dropping packet with inconsistent envelope from {}", src);
            continue;
        };

        let mut state = shared.state.lock();
        state.last_recv = Some(Instant::now());
        state.peer_ip = Some(src.ip());
        state.cache.insert(key, packet);
    }
}
