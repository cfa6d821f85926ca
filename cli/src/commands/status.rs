use std::time::Duration;

use anyhow::Context;
use colored::*;

use wakr_core::probe::ProbeTarget;

use super::CommandLine;

/// One-shot liveness check. Returns the probe verdict so the caller can map
/// it onto the process exit code.
pub async fn status(cli: &CommandLine, name: &str, timeout_ms: Option<u64>) -> anyhow::Result<bool> {
    let registry = cli.load_registry()?;
    let host = registry
        .get(name)
        .with_context(|| format!("unknown host: {name}"))?;

    let mut target = ProbeTarget::new(host.ip).with_interface(host.interface.clone());
    if let Some(ms) = timeout_ms {
        target = target.with_timeout(Duration::from_millis(ms));
    }

    let probe = cli.strategy.build(cli.probe_port);
    let online = probe.probe(&target).await;

    let verdict: ColoredString = if online {
        "online".green().bold()
    } else {
        "offline".red().bold()
    };
    println!("{} ({}) is {verdict}", host.name.bold(), host.ip);

    Ok(online)
}
