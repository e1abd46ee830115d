//! Command-line access to secrets, service accounts and namespaces.

pub mod commands;
pub mod output;
pub mod telemetry;

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use cluster_access::{ClusterAccessor, KubeAccessor};
use commands::{namespaces, secret, service_account, Command, GlobalArgs};
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "cactl")]
#[command(about = "Read and write cluster secrets and service accounts", long_about = None)]
#[command(version)]
pub struct Cli {
	#[command(flatten)]
	pub global: GlobalArgs,

	#[command(subcommand)]
	pub command: Command,
}

/// Connect to the cluster described by the global flags and run the command.
pub async fn run<W: Write>(cli: Cli, writer: W) -> Result<()> {
	let config = cli.global.access_config()?;
	let accessor = KubeAccessor::connect_with(&config)
		.await
		.context("connecting to cluster")?;
	execute(&accessor, cli.command, cli.global.output, writer).await
}

/// Run a command against any accessor.
///
/// Failed calls have already been logged by the accessor, so errors are only
/// propagated here.
pub async fn execute<A, W>(
	accessor: &A,
	command: Command,
	output: Option<OutputFormat>,
	writer: W,
) -> Result<()>
where
	A: ClusterAccessor + ?Sized,
	W: Write,
{
	match command {
		Command::Namespaces => namespaces::run(accessor, output, writer).await,
		Command::Secret(command) => secret::run(accessor, command, output, writer).await,
		Command::ServiceAccount(command) => {
			service_account::run(accessor, command, output, writer).await
		}
	}
}
