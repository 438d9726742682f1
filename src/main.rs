use clap::Parser;
use extsort::cli::{Cli, run_cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.setup_logging();

    tracing::debug!("extsort starting");
    run_cli(cli.command, cli.config.as_deref())
}
