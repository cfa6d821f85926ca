//! ARP probe.
//!
//! Resolves liveness at layer 2: send an ARP request for the target IPv4
//! address on its own segment and treat any ARP reply from that address as
//! proof of life. Useful when the target's firewall drops TCP and ICMP, at
//! the cost of requiring L2 adjacency and a raw datalink channel (root).
//!
//! IPv6 targets are always unreachable by this strategy.

use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use pnet::datalink::{self, Channel, NetworkInterface};
use pnet::packet::Packet;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::util::MacAddr;
use tokio::time::timeout;
use tracing::debug;

use wakr_common::network::interface;

use super::{LivenessProbe, ProbeTarget};

const ETH_HDR_LEN: usize = 14;
const ARP_LEN: usize = 28;
const MIN_ETH_FRAME_NO_FCS: usize = 60;

/// How long one blocking read on the channel may stall before the deadline
/// is re-checked.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, Default)]
pub struct ArpProbe;

impl ArpProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LivenessProbe for ArpProbe {
    async fn probe(&self, target: &ProbeTarget) -> bool {
        let IpAddr::V4(target_v4) = target.ip else {
            debug!("arp probe skipped for non-IPv4 target {}", target.ip);
            return false;
        };

        // A named interface wins; otherwise pick the interface whose subnet
        // contains the target. No candidate means no L2 adjacency.
        let candidate = match target.interface.as_deref() {
            Some(name) => {
                interface::find_by_name(name).or_else(|| interface::find_for_subnet(target_v4))
            }
            None => interface::find_for_subnet(target_v4),
        };
        let Some(intf) = candidate else {
            debug!("no interface on the same segment as {target_v4}");
            return false;
        };

        let budget = target.timeout;
        let task = tokio::task::spawn_blocking(move || run_blocking(&intf, target_v4, budget));

        // The blocking side bounds itself with its own deadline; the outer
        // timeout only covers a wedged channel open.
        match timeout(budget + 2 * POLL_INTERVAL, task).await {
            Ok(Ok(found)) => found,
            _ => false,
        }
    }
}

fn run_blocking(intf: &NetworkInterface, target: Ipv4Addr, budget: Duration) -> bool {
    match arp_exchange(intf, target, budget) {
        Ok(found) => found,
        Err(e) => {
            debug!("arp probe of {target} via {} inconclusive: {e}", intf.name);
            false
        }
    }
}

fn arp_exchange(intf: &NetworkInterface, target: Ipv4Addr, budget: Duration) -> anyhow::Result<bool> {
    let src_mac: MacAddr = intf.mac.context("interface has no MAC address")?;
    let src_ip: Ipv4Addr =
        interface::source_ipv4(intf).context("interface has no IPv4 address")?;

    let channel_cfg = datalink::Config {
        read_timeout: Some(POLL_INTERVAL),
        ..Default::default()
    };
    let (mut tx, mut rx) = match datalink::channel(intf, channel_cfg)? {
        Channel::Ethernet(tx, rx) => (tx, rx),
        _ => anyhow::bail!("unsupported datalink channel type"),
    };

    let request = build_request(src_mac, src_ip, target)?;
    match tx.send_to(&request, None) {
        Some(result) => result.context("sending ARP request")?,
        None => anyhow::bail!("datalink channel refused the ARP request"),
    }

    let deadline = Instant::now() + budget;
    while Instant::now() < deadline {
        match rx.next() {
            Ok(frame) => {
                if is_reply_from(frame, target) {
                    return Ok(true);
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::WouldBlock
                        | std::io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => return Err(e).context("reading from datalink channel"),
        }
    }

    Ok(false)
}

/// Broadcast "who-has `target`" frame, padded to the minimum ethernet size.
fn build_request(src_mac: MacAddr, src_ip: Ipv4Addr, target: Ipv4Addr) -> anyhow::Result<Vec<u8>> {
    let mut buffer = [0u8; MIN_ETH_FRAME_NO_FCS];

    {
        let mut eth = MutableEthernetPacket::new(&mut buffer)
            .context("failed to create mutable ethernet frame")?;
        eth.set_destination(MacAddr::broadcast());
        eth.set_source(src_mac);
        eth.set_ethertype(EtherTypes::Arp);
    }

    let mut arp = MutableArpPacket::new(&mut buffer[ETH_HDR_LEN..ETH_HDR_LEN + ARP_LEN])
        .context("failed to create mutable ARP packet")?;
    arp.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp.set_protocol_type(EtherTypes::Ipv4);
    arp.set_hw_addr_len(6);
    arp.set_proto_addr_len(4);
    arp.set_operation(ArpOperations::Request);
    arp.set_sender_hw_addr(src_mac);
    arp.set_sender_proto_addr(src_ip);
    arp.set_target_hw_addr(MacAddr::zero());
    arp.set_target_proto_addr(target);

    Ok(Vec::from(buffer))
}

/// True iff the frame is an ARP reply whose sender is the probed address.
fn is_reply_from(frame: &[u8], target: Ipv4Addr) -> bool {
    let Some(eth) = EthernetPacket::new(frame) else {
        return false;
    };
    if eth.get_ethertype() != EtherTypes::Arp {
        return false;
    }
    let Some(arp) = ArpPacket::new(eth.payload()) else {
        return false;
    };

    arp.get_operation() == ArpOperations::Reply && arp.get_sender_proto_addr() == target
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
