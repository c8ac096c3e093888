//! svcreg - Entry Point

// Force-link svcreg-providers to ensure linkme inventory registrations are included
extern crate svcreg_providers;

use clap::Parser;
use svcreg::cli::Cli;
use svcreg_infrastructure::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(&config.logging)?;

    let mut stdout = std::io::stdout().lock();
    cli.execute(config, &mut stdout).await
}
