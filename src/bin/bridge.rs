//! ar-bridge binary
//!
//! Runs one bridge role against a console player that logs every capability
//! call — useful for exercising the protocol between two shells or against a
//! real peer.
//!
//! ## Configuration (flags / env)
//!
//! | Key                  | Default | Description                          |
//! |----------------------|---------|--------------------------------------|
//! | `AR_BRIDGE_ROLE`     | `local` | `local` or `device`                  |
//! | `AR_BRIDGE_RECV_PORT`| `38528` | Fixed UDP receive port               |
//! | `AR_BRIDGE_REPLY_PORT`| `48528`| Default peer reply port              |
//! | `AR_BRIDGE_TICK_MS`  | `1000`  | Tick interval in milliseconds        |

use anyhow::{bail, Result};
use ar_pose_bridge::{BridgeConfig, BridgePlayer, DeviceBridge, LocalBridge, Vec3};
use clap::{Parser, ValueEnum};
use std::thread;
use std::time::Duration;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    Local,
    Device,
}

#[derive(Parser, Debug)]
#[command(name = "ar-bridge", about = "AR pose synchronization bridge", version)]
struct Args {
    /// Bridge role
    #[arg(long, value_enum, env = "AR_BRIDGE_ROLE", default_value = "local")]
    role: Role,

    /// Fixed UDP receive port
    #[arg(long, env = "AR_BRIDGE_RECV_PORT", default_value_t = 38528)]
    recv_port: u16,

    /// Default peer reply port (overridden once the peer advertises its own)
    #[arg(long, env = "AR_BRIDGE_REPLY_PORT", default_value_t = 48528)]
    reply_port: u16,

    /// Tick interval in milliseconds
    #[arg(long, env = "AR_BRIDGE_TICK_MS", default_value_t = 1000)]
    tick_ms: u64,

    /// Heartbeat timeout in seconds
    #[arg(long, env = "AR_BRIDGE_HEARTBEAT_TIMEOUT", default_value_t = 5)]
    heartbeat_timeout: u64,
}

// ---------------------------------------------------------------------------
// Console player
// ---------------------------------------------------------------------------

/// Logs every capability call instead of driving a real renderer.
struct ConsolePlayer;

impl BridgePlayer for ConsolePlayer {
    fn start_service(&mut self, server_addr: &str) -> bool {
        log::info!("[player] service started (server='{}')", server_addr);
        true
    }

    fn stop_service(&mut self) -> bool {
        log::info!("[player] service stopped");
        true
    }

    fn update_position(&mut self, position: Vec3, rotation: Vec3) {
        log::info!("[player] position {} rotation {}", position, rotation);
    }

    fn base_position(&self) -> (Vec3, Vec3) {
        (Vec3::zero(), Vec3::zero())
    }

    fn reset_position(&mut self) {
        log::info!("[player] position reset");
    }

    fn update_avatars(&mut self) {
        log::debug!("[player] avatars updated");
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ar_pose_bridge=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = BridgeConfig {
        recv_port: args.recv_port,
        reply_port: args.reply_port,
        heartbeat_timeout: Duration::from_secs(args.heartbeat_timeout),
        ..BridgeConfig::default()
    };
    let interval = Duration::from_millis(args.tick_ms);

    log::info!(
        "Starting ar-bridge (role={:?}, recv_port={}, reply_port={}, tick={}ms)",
        args.role,
        config.recv_port,
        config.reply_port,
        args.tick_ms,
    );

    match args.role {
        Role::Local => {
            let mut bridge = LocalBridge::new(config);
            if !bridge.register(Box::new(ConsolePlayer)) {
                bail!("failed to register player");
            }
            if !bridge.start() {
                bail!("failed to start local bridge");
            }
            loop {
                bridge.run();
                log::info!("state: {}", bridge.state());
                thread::sleep(interval);
            }
        }
        Role::Device => {
            let mut bridge = DeviceBridge::new(config);
            if !bridge.register(Box::new(ConsolePlayer)) {
                bail!("failed to register player");
            }
            if !bridge.start() {
                bail!("failed to start device bridge");
            }
            loop {
                bridge.run();
                log::info!("state: {}", bridge.state());
                thread::sleep(interval);
            }
        }
    }
}
