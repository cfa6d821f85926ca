use tracing::{info, warn};

use wakr_server::{AppState, server};

use super::CommandLine;

pub async fn serve(cli: &CommandLine, port: Option<u16>) -> anyhow::Result<()> {
    let registry = cli.load_registry()?;
    if registry.is_empty() {
        warn!("no hosts configured; /status and /wake will reject every name");
    }

    info!(
        "serving {} host(s) with the {:?} probe strategy",
        registry.len(),
        cli.strategy
    );

    let state = AppState::new(registry, cli.strategy, cli.probe_port);
    let port = port.unwrap_or_else(server::port_from_env);

    server::run(state, port).await
}
