pub mod hosts;
pub mod serve;
pub mod status;
pub mod wake;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wakr_common::config::HostRegistry;
use wakr_core::probe::ProbeStrategy;
use wakr_core::probe::tcp::DEFAULT_PROBE_PORT;

#[derive(Parser)]
#[command(name = "wakr")]
#[command(about = "Wake machines on your LAN and watch them come up.")]
pub struct CommandLine {
    /// Host configuration file (JSON). Falls back to the WAKR_HOSTS
    /// environment variable.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Liveness probe strategy: tcp, ping or arp
    #[arg(long, global = true, default_value = "tcp")]
    pub strategy: ProbeStrategy,

    /// Port the tcp strategy connects to
    #[arg(long, global = true, default_value_t = DEFAULT_PROBE_PORT)]
    pub probe_port: u16,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Listen port; falls back to WAKR_PORT, then 8080
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check whether a host is online
    #[command(alias = "s")]
    Status {
        name: String,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Wake a host and wait until it is confirmed online
    #[command(alias = "w")]
    Wake {
        name: String,
        /// Liveness checks before giving up
        #[arg(long)]
        retries: Option<u32>,
        /// Pause between checks
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Budget for each individual check
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// List configured hosts
    #[command(alias = "ls")]
    Hosts,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn load_registry(&self) -> anyhow::Result<HostRegistry> {
        Ok(HostRegistry::load(self.config.as_deref())?)
    }
}
