//! Probe behavior against real sockets on the loopback interface.

use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use tokio::net::TcpListener;

use wakr_core::probe::{LivenessProbe, ProbeStrategy, ProbeTarget, TcpProbe};

/// A listener that keeps accepting (and dropping) connections, standing in
/// for a booted machine with its remote-desktop port open.
async fn accepting_listener() -> (tokio::task::JoinHandle<()>, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    (handle, port)
}

#[tokio::test]
async fn tcp_probe_confirms_live_listener() {
    let (server, port) = accepting_listener().await;

    let probe = TcpProbe::new(port);
    let target = ProbeTarget::new(IpAddr::V4(Ipv4Addr::LOCALHOST));

    assert!(probe.probe(&target).await);
    server.abort();
}

#[tokio::test]
async fn tcp_probe_stays_within_its_time_budget() {
    // TEST-NET-1 never routes; the probe must give up on its own clock.
    let target = ProbeTarget::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)))
        .with_timeout(Duration::from_millis(150));
    let probe = TcpProbe::new(3389);

    let start = Instant::now();
    assert!(!probe.probe(&target).await);
    assert!(
        start.elapsed() < Duration::from_millis(1_000),
        "probe exceeded its budget: {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn repeated_probes_agree_with_each_other() {
    let (server, port) = accepting_listener().await;

    let probe = TcpProbe::new(port);
    let target = ProbeTarget::new(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let first = probe.probe(&target).await;
    for _ in 0..4 {
        assert_eq!(probe.probe(&target).await, first);
    }
    server.abort();
}

#[tokio::test]
async fn every_strategy_absorbs_an_unreachable_target() {
    let target = ProbeTarget::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)))
        .with_timeout(Duration::from_millis(150));

    for strategy in [ProbeStrategy::Tcp, ProbeStrategy::Ping, ProbeStrategy::Arp] {
        let probe = strategy.build(3389);
        let start = Instant::now();
        assert!(
            !probe.probe(&target).await,
            "{strategy:?} reported an unrouteable address as reachable"
        );
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "{strategy:?} exceeded its budget: {:?}",
            start.elapsed()
        );
    }
}
