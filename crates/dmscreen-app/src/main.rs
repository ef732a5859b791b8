//! DM screen command-line entry point.

mod cli;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting dmscreen");

    let cli = cli::Cli::parse();
    let output = pollster::block_on(cli::run(cli))?;
    println!("{}", output);
    Ok(())
}
