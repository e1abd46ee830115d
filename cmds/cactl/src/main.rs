use anyhow::{Context, Result};
use cactl::{output::BrokenPipeGuard, telemetry, Cli};
use clap::Parser;

fn main() -> Result<()> {
	let cli = Cli::parse();

	telemetry::init(cli.global.log_level)?;

	let stdout = BrokenPipeGuard::new(std::io::stdout());

	tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("failed to build tokio runtime")?
		.block_on(cactl::run(cli, stdout))
}
