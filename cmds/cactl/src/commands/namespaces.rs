//! Namespaces command handler.

use std::io::Write;

use anyhow::Result;
use cluster_access::ClusterAccessor;
use k8s_openapi::api::core::v1::Namespace;
use tabwriter::TabWriter;

use crate::output::{write_object, OutputFormat};

/// List namespaces as a table, or as a list of objects when an output format is given.
pub async fn run<A, W>(accessor: &A, output: Option<OutputFormat>, writer: W) -> Result<()>
where
	A: ClusterAccessor + ?Sized,
	W: Write,
{
	let namespaces = accessor.list_namespaces().await?;

	match output {
		Some(format) => write_object(writer, format, &namespaces.items),
		None => write_table(writer, &namespaces.items),
	}
}

fn write_table<W: Write>(writer: W, namespaces: &[Namespace]) -> Result<()> {
	let mut tw = TabWriter::new(writer);
	writeln!(tw, "NAME\tSTATUS")?;
	for namespace in namespaces {
		let phase = namespace
			.status
			.as_ref()
			.and_then(|status| status.phase.as_deref())
			.unwrap_or("Unknown");
		writeln!(
			tw,
			"{}\t{}",
			namespace.metadata.name.as_deref().unwrap_or_default(),
			phase
		)?;
	}
	tw.flush()?;
	Ok(())
}
