//! The full wake sequence driven through a real TCP probe on loopback,
//! with only the magic-packet transmission stubbed out.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pnet::util::MacAddr;
use tokio::net::TcpListener;

use wakr_common::config::HostRecord;
use wakr_core::probe::TcpProbe;
use wakr_core::wake::{self, MagicPacketSender, WakeError, WakeOptions};

struct RecordingSender {
    sends: AtomicU32,
}

impl RecordingSender {
    fn new() -> Self {
        Self {
            sends: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl MagicPacketSender for RecordingSender {
    async fn send(&self, _mac: MacAddr, _iface: &str) -> anyhow::Result<()> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn loopback_host() -> HostRecord {
    HostRecord::new(
        "testbox",
        MacAddr(0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
    )
    .with_interface("lo")
}

fn fast_opts(retries: u32, delay_ms: u64) -> WakeOptions {
    WakeOptions {
        retries,
        delay: Duration::from_millis(delay_ms),
        probe_timeout: Duration::from_millis(200),
    }
}

#[tokio::test]
async fn wake_confirms_a_host_that_is_already_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    let sender = RecordingSender::new();
    let probe = TcpProbe::new(port);

    let result = wake::wake(&loopback_host(), &sender, &probe, fast_opts(3, 50)).await;

    assert!(result.is_ok());
    assert_eq!(sender.sends.load(Ordering::SeqCst), 1);
    server.abort();
}

#[tokio::test]
async fn wake_confirms_a_host_that_boots_mid_poll() {
    // Reserve a port, release it, and "boot" the machine a few polls later.
    let placeholder = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = placeholder.local_addr().unwrap().port();
    drop(placeholder);

    let booted = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    let sender = RecordingSender::new();
    let probe = TcpProbe::new(port);

    let result = wake::wake(&loopback_host(), &sender, &probe, fast_opts(10, 50)).await;

    assert!(result.is_ok(), "wake failed: {:?}", result.err());
    booted.abort();
}

#[tokio::test]
async fn wake_times_out_on_a_host_that_never_boots() {
    // Bind-then-drop leaves the port closed for the whole run.
    let placeholder = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = placeholder.local_addr().unwrap().port();
    drop(placeholder);

    let sender = RecordingSender::new();
    let probe = TcpProbe::new(port);

    let result = wake::wake(&loopback_host(), &sender, &probe, fast_opts(3, 20)).await;

    assert!(matches!(result, Err(WakeError::Timeout { attempts: 3 })));
    assert_eq!(sender.sends.load(Ordering::SeqCst), 1);
}
