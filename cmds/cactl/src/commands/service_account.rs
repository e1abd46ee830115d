//! Service account subcommand handlers.

use std::io::Write;

use anyhow::Result;
use clap::Subcommand;
use cluster_access::ClusterAccessor;
use k8s_openapi::api::core::v1::ServiceAccount;

use super::read_manifest;
use crate::output::{write_object, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum ServiceAccountCommand {
	/// Print a service account
	Get { namespace: String, name: String },

	/// Replace an existing service account with the one in a manifest
	Update {
		namespace: String,

		/// YAML or JSON manifest, `-` for stdin
		#[arg(short = 'f', long)]
		filename: String,
	},
}

/// Run a service account subcommand.
pub async fn run<A, W>(
	accessor: &A,
	command: ServiceAccountCommand,
	output: Option<OutputFormat>,
	mut writer: W,
) -> Result<()>
where
	A: ClusterAccessor + ?Sized,
	W: Write,
{
	match command {
		ServiceAccountCommand::Get { namespace, name } => {
			let service_account = accessor.get_service_account(&namespace, &name).await?;
			write_object(writer, output.unwrap_or_default(), &service_account)
		}
		ServiceAccountCommand::Update {
			namespace,
			filename,
		} => {
			let service_account: ServiceAccount = read_manifest(&filename)?;
			let updated = accessor
				.update_service_account(&namespace, &service_account)
				.await?;
			writeln!(
				writer,
				"serviceaccount/{} updated",
				updated.metadata.name.as_deref().unwrap_or_default()
			)?;
			Ok(())
		}
	}
}
