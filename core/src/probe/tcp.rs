//! TCP connect probe.
//!
//! Attempts a full TCP handshake against a well-known port. The default port
//! is 3389 (remote desktop): a service listening there means the operating
//! system finished booting, which is the signal the wake sequence needs.
//! A refused connection counts as *unreachable*; the NIC answering is not
//! enough.

use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;
use tracing::debug;

use wakr_common::network::interface;

use super::{LivenessProbe, ProbeTarget};

/// Port probed when none is configured. Remote desktop rather than something
/// like SSH because the target fleet is assumed to be desktop machines.
pub const DEFAULT_PROBE_PORT: u16 = 3389;

#[derive(Clone, Copy, Debug)]
pub struct TcpProbe {
    port: u16,
}

impl TcpProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    async fn connect(&self, target: &ProbeTarget) -> anyhow::Result<TcpStream> {
        let addr = SocketAddr::new(target.ip, self.port);

        let socket = match target.ip {
            IpAddr::V4(_) => TcpSocket::new_v4()?,
            IpAddr::V6(_) => TcpSocket::new_v6()?,
        };

        // Source-bind to the configured interface when it resolves; an
        // unresolvable interface falls back to default routing.
        if target.ip.is_ipv4() {
            if let Some(src) = interface::probe_source(target.interface.as_deref()) {
                socket.bind(SocketAddr::new(IpAddr::V4(src), 0))?;
            }
        }

        Ok(socket.connect(addr).await?)
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_PORT)
    }
}

#[async_trait]
impl LivenessProbe for TcpProbe {
    async fn probe(&self, target: &ProbeTarget) -> bool {
        match timeout(target.timeout, self.connect(target)).await {
            // Stream dropped immediately; the handshake itself is the signal.
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!("tcp probe of {}:{} inconclusive: {e}", target.ip, self.port);
                false
            }
            Err(_elapsed) => false,
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
