//! Local network-interface resolution.
//!
//! Probes and the magic-packet sender scope their outbound traffic to a
//! specific interface when the host record names one. Resolution goes through
//! the helpers here; the selection logic is kept as pure functions over
//! `&[NetworkInterface]` so it can be exercised without real hardware.

use std::net::Ipv4Addr;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use tracing::debug;

/// Finds an interface by its OS name (`eth0`, `enp3s0`, ...).
pub fn find_by_name(name: &str) -> Option<NetworkInterface> {
    select_by_name(&datalink::interfaces(), name)
}

/// Finds an up, non-loopback interface whose IPv4 subnet contains `target`.
///
/// Used by the ARP strategy when the caller did not name an interface:
/// an L2 probe is only meaningful on the segment the target lives on.
pub fn find_for_subnet(target: Ipv4Addr) -> Option<NetworkInterface> {
    select_for_subnet(&datalink::interfaces(), target)
}

/// First non-loopback IPv4 address assigned to the interface.
pub fn source_ipv4(interface: &NetworkInterface) -> Option<Ipv4Addr> {
    interface.ips.iter().find_map(|net| match net {
        IpNetwork::V4(v4) if !v4.ip().is_loopback() => Some(v4.ip()),
        _ => None,
    })
}

/// Resolves an optional interface name to a bindable IPv4 source address.
///
/// Probe traffic should originate from the named interface when possible,
/// but an unresolvable name is not an error: the probe continues over
/// default routing. Returns `None` in that case.
pub fn probe_source(interface: Option<&str>) -> Option<Ipv4Addr> {
    let name = interface?;
    match find_by_name(name).as_ref().and_then(source_ipv4) {
        Some(src) => Some(src),
        None => {
            debug!("interface '{name}' has no usable IPv4 address, falling back to default routing");
            None
        }
    }
}

fn select_by_name(interfaces: &[NetworkInterface], name: &str) -> Option<NetworkInterface> {
    interfaces.iter().find(|i| i.name == name).cloned()
}

fn select_for_subnet(interfaces: &[NetworkInterface], target: Ipv4Addr) -> Option<NetworkInterface> {
    interfaces
        .iter()
        .find(|iface| {
            iface.is_up()
                && !iface.is_loopback()
                && iface
                    .ips
                    .iter()
                    .any(|net| matches!(net, IpNetwork::V4(v4) if v4.contains(target)))
        })
        .cloned()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::ipnetwork::{IpNetwork, Ipv4Network};
    use pnet::util::MacAddr;

    const IFF_UP: u32 = 1;
    const IFF_BROADCAST: u32 = 1 << 1;
    const IFF_LOOPBACK: u32 = 1 << 3;

    fn create_mock_interface(name: &str, ips: Vec<IpNetwork>, flags: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: "An interface".to_string(),
            index: 0,
            mac: Some(MacAddr(0x1, 0x2, 0x3, 0x4, 0x5, 0x6)),
            ips,
            flags,
        }
    }

    fn lan_ip(addr: [u8; 4], prefix: u8) -> IpNetwork {
        IpNetwork::V4(
            Ipv4Network::new(Ipv4Addr::new(addr[0], addr[1], addr[2], addr[3]), prefix).unwrap(),
        )
    }

    #[test]
    fn select_by_name_matches_exact_name() {
        let interfaces = vec![
            create_mock_interface("eth0", vec![lan_ip([192, 168, 1, 5], 24)], IFF_UP),
            create_mock_interface("wlan0", vec![lan_ip([10, 0, 0, 5], 24)], IFF_UP),
        ];

        let found = select_by_name(&interfaces, "wlan0");
        assert_eq!(found.unwrap().name, "wlan0");
        assert!(select_by_name(&interfaces, "eth9").is_none());
    }

    #[test]
    fn source_ipv4_skips_loopback_addresses() {
        let interface = create_mock_interface(
            "eth0",
            vec![lan_ip([127, 0, 0, 1], 8), lan_ip([192, 168, 1, 5], 24)],
            IFF_UP | IFF_BROADCAST,
        );

        assert_eq!(source_ipv4(&interface), Some(Ipv4Addr::new(192, 168, 1, 5)));
    }

    #[test]
    fn source_ipv4_none_without_usable_address() {
        let v6_only = create_mock_interface(
            "eth0",
            vec![IpNetwork::V6("fe80::1/64".parse().unwrap())],
            IFF_UP,
        );
        assert_eq!(source_ipv4(&v6_only), None);
    }

    #[test]
    fn select_for_subnet_finds_containing_interface() {
        let interfaces = vec![
            create_mock_interface(
                "lo",
                vec![lan_ip([127, 0, 0, 1], 8)],
                IFF_UP | IFF_LOOPBACK,
            ),
            create_mock_interface("eth0", vec![lan_ip([192, 168, 1, 5], 24)], IFF_UP),
        ];

        let target = Ipv4Addr::new(192, 168, 1, 20);
        assert_eq!(select_for_subnet(&interfaces, target).unwrap().name, "eth0");

        let outside = Ipv4Addr::new(192, 168, 2, 20);
        assert!(select_for_subnet(&interfaces, outside).is_none());
    }

    #[test]
    fn select_for_subnet_ignores_down_interfaces() {
        let interfaces = vec![create_mock_interface(
            "eth0",
            vec![lan_ip([192, 168, 1, 5], 24)],
            IFF_BROADCAST,
        )];

        let target = Ipv4Addr::new(192, 168, 1, 20);
        assert!(select_for_subnet(&interfaces, target).is_none());
    }

    #[test]
    fn probe_source_is_none_for_unknown_interface() {
        // Interface names are OS-assigned; this one should never exist.
        assert_eq!(probe_source(Some("wakr-does-not-exist0")), None);
        assert_eq!(probe_source(None), None);
    }
}
