//! ICMP echo probe.
//!
//! Sends a single echo request through the system `ping` tool instead of a
//! raw ICMP socket: the tool is present on every deployment target and
//! already holds the privileges raw ICMP would require. Reachable means the
//! tool reported a reply (exit status 0) before the time budget ran out.

use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

#[cfg(target_os = "linux")]
use linux_impl::ping_args;
#[cfg(target_os = "macos")]
use macos_impl::ping_args;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use portable_impl::ping_args;

use super::{LivenessProbe, ProbeTarget};

#[derive(Clone, Debug)]
pub struct PingProbe {
    command: String,
}

impl PingProbe {
    pub fn new() -> Self {
        Self {
            command: "ping".to_string(),
        }
    }

    fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, target: &ProbeTarget) -> anyhow::Result<bool> {
        let args = ping_args(&target.ip, target.interface.as_deref(), target.timeout);

        let status = Command::new(&self.command)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            // The child must not outlive the probe's time budget.
            .kill_on_drop(true)
            .status()
            .await?;

        Ok(status.success())
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LivenessProbe for PingProbe {
    async fn probe(&self, target: &ProbeTarget) -> bool {
        match timeout(target.timeout, self.run(target)).await {
            Ok(Ok(alive)) => alive,
            Ok(Err(e)) => {
                debug!("icmp probe of {} inconclusive: {e}", target.ip);
                false
            }
            Err(_elapsed) => false,
        }
    }
}

/// Whole seconds for the tool's own reply deadline, rounded up and never zero.
fn timeout_secs(timeout: Duration) -> u64 {
    timeout.as_secs_f64().ceil().max(1.0) as u64
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;

    pub fn ping_args(ip: &IpAddr, interface: Option<&str>, timeout: Duration) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            timeout_secs(timeout).to_string(),
        ];
        if let Some(name) = interface {
            args.push("-I".to_string());
            args.push(name.to_string());
        }
        args.push(ip.to_string());
        args
    }
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;

    pub fn ping_args(ip: &IpAddr, interface: Option<&str>, timeout: Duration) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            "1".to_string(),
            "-t".to_string(),
            timeout_secs(timeout).to_string(),
        ];
        if let Some(name) = interface {
            args.push("-b".to_string());
            args.push(name.to_string());
        }
        args.push(ip.to_string());
        args
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod portable_impl {
    use super::*;

    pub fn ping_args(ip: &IpAddr, _interface: Option<&str>, _timeout: Duration) -> Vec<String> {
        vec!["-c".to_string(), "1".to_string(), ip.to_string()]
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Instant;

    #[test]
    fn timeout_rounds_up_to_whole_seconds() {
        assert_eq!(timeout_secs(Duration::from_millis(100)), 1);
        assert_eq!(timeout_secs(Duration::from_millis(5_000)), 5);
        assert_eq!(timeout_secs(Duration::from_millis(5_001)), 6);
        assert_eq!(timeout_secs(Duration::ZERO), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn args_carry_count_deadline_and_interface() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
        let args = ping_args(&ip, Some("eth0"), Duration::from_millis(5_000));
        assert_eq!(args, vec!["-c", "1", "-W", "5", "-I", "eth0", "10.0.0.5"]);

        let args = ping_args(&ip, None, Duration::from_millis(1_000));
        assert_eq!(args, vec!["-c", "1", "-W", "1", "10.0.0.5"]);
    }

    #[tokio::test]
    async fn missing_tool_collapses_to_unreachable() {
        let probe = PingProbe::with_command("wakr-no-such-ping-binary");
        let target = ProbeTarget::new(IpAddr::V4(Ipv4Addr::LOCALHOST));

        assert!(!probe.probe(&target).await);
    }

    #[tokio::test]
    async fn unreachable_target_resolves_within_budget() {
        let probe = PingProbe::new();
        let target = ProbeTarget::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)))
            .with_timeout(Duration::from_millis(200));

        let start = Instant::now();
        assert!(!probe.probe(&target).await);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    #[ignore]
    async fn loopback_answers_echo() {
        let probe = PingProbe::new();
        let target = ProbeTarget::new(IpAddr::V4(Ipv4Addr::LOCALHOST));

        assert!(probe.probe(&target).await);
    }
}
