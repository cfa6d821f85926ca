use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use wakr_core::probe::{LivenessProbe, ProbeTarget};
use wakr_core::wake::{self, UdpBroadcastSender, WakeOptions};

use super::CommandLine;

/// Forwards to the configured probe while narrating each polling attempt on
/// the spinner. The orchestrator stays unaware of the terminal.
struct ReportingProbe {
    inner: Box<dyn LivenessProbe>,
    bar: ProgressBar,
    attempts: AtomicU32,
    total: u32,
    host: String,
}

#[async_trait]
impl LivenessProbe for ReportingProbe {
    async fn probe(&self, target: &ProbeTarget) -> bool {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.set_message(format!(
            "waiting for {}... check {attempt}/{}",
            self.host, self.total
        ));
        self.inner.probe(target).await
    }
}

pub async fn wake(
    cli: &CommandLine,
    name: &str,
    retries: Option<u32>,
    delay_ms: Option<u64>,
    timeout_ms: Option<u64>,
) -> anyhow::Result<()> {
    let registry = cli.load_registry()?;
    let host = registry
        .get(name)
        .with_context(|| format!("unknown host: {name}"))?
        .clone();

    let mut opts = WakeOptions::default();
    if let Some(retries) = retries {
        opts.retries = retries;
    }
    if let Some(ms) = delay_ms {
        opts.delay = Duration::from_millis(ms);
    }
    if let Some(ms) = timeout_ms {
        opts.probe_timeout = Duration::from_millis(ms);
    }

    let bar = start_spinner(cli.quiet);
    bar.set_message(format!("sending magic packet to {}...", host.name));

    let probe = ReportingProbe {
        inner: cli.strategy.build(cli.probe_port),
        bar: bar.clone(),
        attempts: AtomicU32::new(0),
        total: opts.retries,
        host: host.name.clone(),
    };
    let sender = UdpBroadcastSender::default();

    let result = wake::wake(&host, &sender, &probe, opts).await;
    bar.finish_and_clear();

    result.with_context(|| format!("failed to wake '{}'", host.name))?;

    println!(
        "{} is {} and ready for remote access.",
        host.name.bold(),
        "awake".green().bold()
    );
    Ok(())
}

fn start_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .expect("spinner template is static")
        .tick_strings(&["▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁"]);
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
