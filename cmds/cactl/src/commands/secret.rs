//! Secret subcommand handlers.

use std::{collections::BTreeMap, io::Write};

use anyhow::Result;
use clap::Subcommand;
use cluster_access::ClusterAccessor;
use k8s_openapi::{
	api::core::v1::Secret, apimachinery::pkg::apis::meta::v1::ObjectMeta, ByteString,
};

use super::read_manifest;
use crate::output::{write_object, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum SecretCommand {
	/// Print a secret
	Get {
		namespace: String,
		name: String,

		/// Print only the data, base64-decoded
		#[arg(long)]
		decode: bool,
	},

	/// Create a secret from literal values. Fails if it already exists
	Create {
		namespace: String,
		name: String,

		/// Key and value to store (Format: key=value). May be repeated
		#[arg(long = "from-literal", value_name = "KEY=VALUE", value_parser = parse_literal)]
		literals: Vec<(String, String)>,

		/// Secret type
		#[arg(long = "type", default_value = "Opaque")]
		secret_type: String,
	},

	/// Replace an existing secret with the one in a manifest
	Update {
		namespace: String,

		/// YAML or JSON manifest, `-` for stdin
		#[arg(short = 'f', long)]
		filename: String,
	},
}

/// Run a secret subcommand.
pub async fn run<A, W>(
	accessor: &A,
	command: SecretCommand,
	output: Option<OutputFormat>,
	mut writer: W,
) -> Result<()>
where
	A: ClusterAccessor + ?Sized,
	W: Write,
{
	match command {
		SecretCommand::Get {
			namespace,
			name,
			decode,
		} => {
			let secret = accessor.get_secret(&namespace, &name).await?;
			let format = output.unwrap_or_default();
			if decode {
				write_object(writer, format, &decoded_data(&secret))
			} else {
				write_object(writer, format, &secret)
			}
		}
		SecretCommand::Create {
			namespace,
			name,
			literals,
			secret_type,
		} => {
			let secret = build_secret(&name, &secret_type, literals);
			accessor.create_secret(&namespace, &secret).await?;
			writeln!(writer, "secret/{name} created")?;
			Ok(())
		}
		SecretCommand::Update {
			namespace,
			filename,
		} => {
			let secret: Secret = read_manifest(&filename)?;
			let updated = accessor.update_secret(&namespace, &secret).await?;
			writeln!(
				writer,
				"secret/{} updated",
				updated.metadata.name.as_deref().unwrap_or_default()
			)?;
			Ok(())
		}
	}
}

/// Parse a `key=value` literal. The value may itself contain `=`.
pub fn parse_literal(s: &str) -> Result<(String, String), String> {
	match s.split_once('=') {
		Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
		_ => Err(format!("expected KEY=VALUE, got `{s}`")),
	}
}

fn build_secret(name: &str, secret_type: &str, literals: Vec<(String, String)>) -> Secret {
	Secret {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			..ObjectMeta::default()
		},
		type_: Some(secret_type.to_string()),
		data: Some(
			literals
				.into_iter()
				.map(|(key, value)| (key, ByteString(value.into_bytes())))
				.collect(),
		),
		..Secret::default()
	}
}

/// Secret data as text. Values that are not UTF-8 are replaced lossily.
fn decoded_data(secret: &Secret) -> BTreeMap<String, String> {
	secret
		.data
		.iter()
		.flatten()
		.map(|(key, value)| (key.clone(), String::from_utf8_lossy(&value.0).into_owned()))
		.collect()
}
