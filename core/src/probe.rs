//! The central **abstraction** for host liveness checks.
//!
//! This module defines the unified interface that specific probing strategies
//! (TCP connect, ICMP echo, ARP) must implement. A probe answers exactly one
//! question: is this address reachable right now?
//!
//! **Contract:**
//! A probe never fails outward. Timeouts, refused connections, missing
//! interfaces, and tooling errors all collapse to `false`: liveness probing
//! is best-effort and the caller only needs a boolean. Probes hold no mutable
//! state, never cache results, and never retry; retrying is the wake
//! orchestrator's job.

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

pub mod arp;
pub mod ping;
pub mod tcp;

pub use arp::ArpProbe;
pub use ping::PingProbe;
pub use tcp::TcpProbe;

/// Upper bound on a single probe attempt when the caller does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// One address to check, with its scoping and time budget.
#[derive(Clone, Debug)]
pub struct ProbeTarget {
    pub ip: IpAddr,
    /// Interface the probe traffic should originate from, when resolvable.
    pub interface: Option<String>,
    pub timeout: Duration,
}

impl ProbeTarget {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            interface: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A best-effort reachability check against one address.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Returns whether the target answered within its time budget.
    ///
    /// Resolves within `target.timeout` plus scheduling slack on every path,
    /// releasing any socket, channel, or child process it opened.
    async fn probe(&self, target: &ProbeTarget) -> bool;
}

/// The probing strategy chosen at configuration time.
///
/// High-level code holds a `Box<dyn LivenessProbe>` built from this and never
/// branches on the variant again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// TCP handshake against a well-known port. The default: a completed
    /// handshake proves the OS is up, not just the NIC.
    #[default]
    Tcp,
    /// One ICMP echo request via the system ping tool.
    Ping,
    /// ARP request on the target's L2 segment. Works through host firewalls
    /// but requires the target to be on a directly attached subnet.
    Arp,
}

impl ProbeStrategy {
    /// Builds the configured probe. `tcp_port` only affects [`TcpProbe`].
    pub fn build(self, tcp_port: u16) -> Box<dyn LivenessProbe> {
        match self {
            ProbeStrategy::Tcp => Box::new(TcpProbe::new(tcp_port)),
            ProbeStrategy::Ping => Box::new(PingProbe::new()),
            ProbeStrategy::Arp => Box::new(ArpProbe::new()),
        }
    }
}

impl FromStr for ProbeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(ProbeStrategy::Tcp),
            "ping" | "icmp" => Ok(ProbeStrategy::Ping),
            "arp" | "arping" => Ok(ProbeStrategy::Arp),
            _ => Err(format!("unknown probe strategy: {s}")),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
