use colored::*;
use tracing::warn;

use super::CommandLine;

pub fn hosts(cli: &CommandLine) -> anyhow::Result<()> {
    let registry = cli.load_registry()?;

    if registry.is_empty() {
        warn!("no hosts configured");
        return Ok(());
    }

    for record in registry.iter() {
        println!(
            "{}  {}  {}  via {}",
            record.name.bold(),
            record.ip.to_string().yellow(),
            record.mac.to_string().dimmed(),
            record.interface
        );
    }

    Ok(())
}
