//! Hardware-address parsing helpers.
//!
//! Configuration sources write MAC addresses as text; everything downstream
//! works with [`MacAddr`]. Canonical form is lowercase colon-hex
//! (`aa:bb:cc:dd:ee:ff`), which is what `MacAddr`'s `Display` produces.

use pnet::util::MacAddr;

/// Parses a hardware address from its textual form.
///
/// Accepts colon- or hyphen-separated hex pairs in either case.
/// Returns `None` for anything that is not exactly six octets.
pub fn parse(raw: &str) -> Option<MacAddr> {
    let normalized = raw.trim().replace('-', ":");
    normalized.parse::<MacAddr>().ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
