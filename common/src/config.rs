//! # Host Configuration
//!
//! Defines the static registry of managed machines.
//!
//! Records are loaded **once** at process start, either from the `WAKR_HOSTS`
//! environment variable or from a JSON file, and are immutable afterwards.
//! All address validation happens here, at the boundary: the probing and wake
//! logic downstream always receives a well-formed [`HostRecord`] and never
//! performs a lookup by name itself.
//!
//! Expected shape (one object per host, keyed by name):
//!
//! ```json
//! {
//!   "office": { "mac": "aa:bb:cc:dd:ee:ff", "ip": "192.168.1.50", "interface": "eth0" },
//!   "attic":  { "mac": "00:11:22:33:44:55", "ip": "192.168.1.51" }
//! }
//! ```

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

use pnet::util::MacAddr;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::network::mac;

/// Environment variable holding the host map as a JSON object.
pub const HOSTS_ENV: &str = "WAKR_HOSTS";

/// Interface assumed when a host entry does not name one.
pub const DEFAULT_INTERFACE: &str = "eth0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("host '{host}': invalid MAC address '{value}'")]
    InvalidMac { host: String, value: String },
    #[error("host '{host}': invalid IP address '{value}'")]
    InvalidIp { host: String, value: String },
    #[error("invalid host configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read host configuration from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no host configuration found (set {HOSTS_ENV} or pass a config file)")]
    Missing,
}

/// One managed machine.
///
/// `mac` and `ip` are guaranteed well-formed for every record produced by
/// [`HostRegistry`]; `interface` always carries a concrete name (the loader
/// applies [`DEFAULT_INTERFACE`] when the entry omits it).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostRecord {
    pub name: String,
    pub mac: MacAddr,
    pub ip: IpAddr,
    pub interface: String,
}

impl HostRecord {
    pub fn new(name: impl Into<String>, mac: MacAddr, ip: IpAddr) -> Self {
        Self {
            name: name.into(),
            mac,
            ip,
            interface: DEFAULT_INTERFACE.to_string(),
        }
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }
}

/// Raw, unvalidated entry as it appears in the configuration source.
#[derive(Debug, Deserialize)]
struct RawHostEntry {
    mac: String,
    ip: String,
    interface: Option<String>,
}

/// The immutable name-keyed host table.
#[derive(Clone, Debug, Default)]
pub struct HostRegistry {
    hosts: BTreeMap<String, HostRecord>,
}

impl HostRegistry {
    /// Loads the registry from [`HOSTS_ENV`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var(HOSTS_ENV).map_err(|_| ConfigError::Missing)?;
        Self::from_json(&raw)
    }

    /// Loads the registry from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Prefers the file when one is given, otherwise falls back to the
    /// environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        match config_file {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    /// Parses and validates a JSON host map.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let entries: BTreeMap<String, RawHostEntry> = serde_json::from_str(raw)?;

        let mut hosts = BTreeMap::new();
        for (name, entry) in entries {
            let record = validate_entry(&name, entry)?;
            hosts.insert(name, record);
        }

        debug!("loaded {} host record(s)", hosts.len());
        Ok(Self { hosts })
    }

    pub fn get(&self, name: &str) -> Option<&HostRecord> {
        self.hosts.get(name)
    }

    /// Host names in stable (sorted) order.
    pub fn names(&self) -> Vec<String> {
        self.hosts.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostRecord> {
        self.hosts.values()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

fn validate_entry(name: &str, entry: RawHostEntry) -> Result<HostRecord, ConfigError> {
    let mac: MacAddr = mac::parse(&entry.mac).ok_or_else(|| ConfigError::InvalidMac {
        host: name.to_string(),
        value: entry.mac.clone(),
    })?;

    let ip: IpAddr = entry.ip.parse().map_err(|_| ConfigError::InvalidIp {
        host: name.to_string(),
        value: entry.ip.clone(),
    })?;

    let interface = entry
        .interface
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| DEFAULT_INTERFACE.to_string());

    Ok(HostRecord {
        name: name.to_string(),
        mac,
        ip,
        interface,
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
