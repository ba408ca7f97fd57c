use anyhow::Result;
use clap::Parser;
use commitmap::cli::Cli;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cli.execute()
}
