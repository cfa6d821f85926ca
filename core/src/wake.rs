//! Wake-on-LAN orchestration.
//!
//! The full "wake a host and confirm it is up" protocol:
//!
//! 1. Broadcast one magic packet (6 bytes of `0xFF`, then the target MAC
//!    repeated 16 times, 102 bytes over UDP to port 9). A failed send is
//!    fatal for the attempt; nothing is retried and nothing is probed.
//! 2. Poll a [`LivenessProbe`] with a fixed delay between attempts until the
//!    host answers or the retry budget runs out.
//!
//! Attempts within one call are strictly sequential: a probe fully resolves
//! before the delay starts, and the delay elapses before the next probe.
//! Nothing here is shared across calls, so concurrent wakes for different
//! hosts do not interfere; concurrent wakes for the *same* host are not
//! coordinated.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use pnet::util::MacAddr;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::sleep;
use tracing::{debug, info};

use wakr_common::config::HostRecord;
use wakr_common::network::interface;

use crate::probe::{LivenessProbe, ProbeTarget};

/// UDP port the magic packet is broadcast to (the WoL discard port).
pub const WOL_PORT: u16 = 9;

pub const DEFAULT_RETRIES: u32 = 10;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(5_000);

const MAGIC_LEN: usize = 102;

#[derive(Debug, Error)]
pub enum WakeError {
    /// The magic packet never left this machine. Surfaced immediately,
    /// before any liveness probing.
    #[error("failed to send wake-on-lan packet: {source}")]
    SendFailed {
        #[source]
        source: anyhow::Error,
    },
    /// The packet was sent but the host never answered a probe.
    #[error("host did not come online after {attempts} liveness check(s)")]
    Timeout { attempts: u32 },
}

/// Per-call knobs for the polling loop. Nothing global, nothing mutable.
#[derive(Clone, Copy, Debug)]
pub struct WakeOptions {
    pub retries: u32,
    pub delay: Duration,
    /// Budget for each individual probe attempt.
    pub probe_timeout: Duration,
}

impl Default for WakeOptions {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_DELAY,
            probe_timeout: crate::probe::DEFAULT_TIMEOUT,
        }
    }
}

/// Builds the fixed 102-byte magic packet for `mac`.
pub fn build_magic_packet(mac: MacAddr) -> [u8; MAGIC_LEN] {
    let mut packet = [0u8; MAGIC_LEN];
    let octets = [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5];

    for byte in packet.iter_mut().take(6) {
        *byte = 0xFF;
    }
    for i in 0..16 {
        let offset = 6 + i * 6;
        packet[offset..offset + 6].copy_from_slice(&octets);
    }

    packet
}

/// Transmits one magic packet. Behind a trait so the orchestrator can be
/// exercised against a stub transmitter.
#[async_trait]
pub trait MagicPacketSender: Send + Sync {
    async fn send(&self, mac: MacAddr, interface: &str) -> anyhow::Result<()>;
}

/// Production sender: one UDP datagram to 255.255.255.255, broadcast enabled,
/// bound to the named interface's IPv4 address.
///
/// Unlike probe traffic, the bind is strict here: a wake request aimed at the
/// wrong segment silently does nothing, so an interface that cannot be
/// resolved is a send failure rather than a fallback.
#[derive(Clone, Copy, Debug)]
pub struct UdpBroadcastSender {
    port: u16,
}

impl UdpBroadcastSender {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Default for UdpBroadcastSender {
    fn default() -> Self {
        Self::new(WOL_PORT)
    }
}

#[async_trait]
impl MagicPacketSender for UdpBroadcastSender {
    async fn send(&self, mac: MacAddr, iface: &str) -> anyhow::Result<()> {
        let intf = interface::find_by_name(iface)
            .with_context(|| format!("unknown network interface '{iface}'"))?;
        let src = interface::source_ipv4(&intf)
            .with_context(|| format!("interface '{iface}' has no usable IPv4 address"))?;

        let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(src), 0))
            .await
            .with_context(|| format!("binding wake socket to {src}"))?;
        socket
            .set_broadcast(true)
            .context("enabling broadcast on wake socket")?;

        let packet = build_magic_packet(mac);
        let target = SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), self.port);
        socket
            .send_to(&packet, target)
            .await
            .with_context(|| format!("broadcasting magic packet to {target}"))?;

        Ok(())
    }
}

/// Sends the magic packet for `host`, then polls until it is confirmed
/// online or the retry budget is exhausted.
///
/// The host's configured interface is forwarded both to the sender and to
/// every polling probe. The delay sits *between* attempts, never before the
/// first one, so a host that boots instantly is confirmed on the first poll.
pub async fn wake(
    host: &HostRecord,
    sender: &dyn MagicPacketSender,
    probe: &dyn LivenessProbe,
    opts: WakeOptions,
) -> Result<(), WakeError> {
    sender
        .send(host.mac, &host.interface)
        .await
        .map_err(|source| WakeError::SendFailed { source })?;

    info!(
        "magic packet sent to '{}' ({}) via {}",
        host.name, host.mac, host.interface
    );

    let target = ProbeTarget::new(host.ip)
        .with_interface(host.interface.clone())
        .with_timeout(opts.probe_timeout);

    for attempt in 1..=opts.retries {
        if probe.probe(&target).await {
            info!("'{}' confirmed online after {attempt} check(s)", host.name);
            return Ok(());
        }

        debug!(
            "'{}' not online yet ({attempt}/{} checks)",
            host.name, opts.retries
        );
        if attempt < opts.retries {
            sleep(opts.delay).await;
        }
    }

    Err(WakeError::Timeout {
        attempts: opts.retries,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
