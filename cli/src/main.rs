mod commands;
mod terminal;

use commands::{CommandLine, Commands, hosts, serve, status, wake};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse_args();

    terminal::logging::init(cli.quiet);

    match &cli.command {
        Commands::Serve { port } => serve::serve(&cli, *port).await,
        Commands::Status { name, timeout_ms } => {
            let online = status::status(&cli, name, *timeout_ms).await?;
            if !online {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Wake {
            name,
            retries,
            delay_ms,
            timeout_ms,
        } => wake::wake(&cli, name, *retries, *delay_ms, *timeout_ms).await,
        Commands::Hosts => hosts::hosts(&cli),
    }
}
