//! Command handlers.

pub mod namespaces;
pub mod secret;
pub mod service_account;

use std::{
	fs,
	io::{self, Read},
	path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use cluster_access::AccessConfig;
use serde::de::DeserializeOwned;
use tracing::Level;

use crate::output::OutputFormat;

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
	/// Path to a kubeconfig file. In-cluster credentials are used when neither
	/// this nor `kubeconfig` in --config is set
	#[arg(long, global = true)]
	pub kubeconfig: Option<PathBuf>,

	/// Kubeconfig context to use instead of current-context
	#[arg(long, global = true)]
	pub context: Option<String>,

	/// YAML file with accessor settings (kubeconfig, context, readTimeoutSeconds)
	#[arg(long, global = true, env = "CACTL_CONFIG")]
	pub config: Option<PathBuf>,

	/// Per-request read timeout in seconds
	#[arg(long, global = true)]
	pub timeout: Option<u64>,

	/// Log level (trace, debug, info, warn, error). Overrides RUST_LOG
	#[arg(long, global = true)]
	pub log_level: Option<Level>,

	/// Output format for objects
	#[arg(short = 'o', long, global = true, value_enum)]
	pub output: Option<OutputFormat>,
}

impl GlobalArgs {
	/// Settings from --config, overridden by flags given on the command line.
	pub fn access_config(&self) -> Result<AccessConfig> {
		let mut config = match &self.config {
			Some(path) => AccessConfig::load_from_file(path)?,
			None => AccessConfig::default(),
		};
		config.merge_from(&AccessConfig {
			kubeconfig: self.kubeconfig.clone(),
			context: self.context.clone(),
			read_timeout_seconds: self.timeout,
		});
		Ok(config)
	}
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// List namespaces
	Namespaces,

	/// Read and write secrets
	#[command(subcommand)]
	Secret(secret::SecretCommand),

	/// Read and write service accounts
	#[command(subcommand, alias = "sa")]
	ServiceAccount(service_account::ServiceAccountCommand),
}

/// Read a YAML or JSON manifest from a file, or from stdin when the path is `-`.
pub fn read_manifest<T: DeserializeOwned>(path: &str) -> Result<T> {
	let content = if path == "-" {
		let mut buf = String::new();
		io::stdin()
			.read_to_string(&mut buf)
			.context("reading manifest from stdin")?;
		buf
	} else {
		fs::read_to_string(path).with_context(|| format!("reading manifest {path}"))?
	};
	serde_yaml::from_str(&content).with_context(|| format!("parsing manifest {path}"))
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use k8s_openapi::api::core::v1::Secret;

	use super::*;

	#[test]
	fn test_flags_override_config_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(b"kubeconfig: /from/file\ncontext: file\nreadTimeoutSeconds: 3\n")
			.unwrap();

		let args = GlobalArgs {
			config: Some(file.path().to_path_buf()),
			context: Some("flag".to_string()),
			..GlobalArgs::default()
		};
		let config = args.access_config().unwrap();

		assert_eq!(config.kubeconfig, Some(PathBuf::from("/from/file")));
		assert_eq!(config.context.as_deref(), Some("flag"));
		assert_eq!(config.read_timeout_seconds, Some(3));
	}

	#[test]
	fn test_no_flags_is_in_cluster() {
		let config = GlobalArgs::default().access_config().unwrap();
		assert!(config.credential_source().is_in_cluster());
	}

	#[test]
	fn test_read_manifest_yaml() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(b"apiVersion: v1\nkind: Secret\nmetadata:\n  name: s1\nstringData:\n  k: v\n")
			.unwrap();

		let secret: Secret = read_manifest(file.path().to_str().unwrap()).unwrap();
		assert_eq!(secret.metadata.name.as_deref(), Some("s1"));
		assert_eq!(secret.string_data.unwrap()["k"], "v");
	}
}
