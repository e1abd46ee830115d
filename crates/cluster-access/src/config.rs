//! Accessor configuration.
//!
//! Configuration can come from command-line flags or from a YAML file:
//!
//! ```yaml
//! kubeconfig: /home/me/.kube/config
//! context: staging
//! readTimeoutSeconds: 10
//! ```
//!
//! Leaving `kubeconfig` unset selects in-cluster credentials.

use std::{
	fs, io,
	path::{Path, PathBuf},
	time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use crate::credentials::CredentialSource;

/// Default timeout for Kubernetes API requests.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file: {}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("failed to parse config file: {}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_yaml::Error,
	},
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccessConfig {
	/// Kubeconfig file to read. In-cluster credentials are used when unset or empty.
	#[serde(default)]
	pub kubeconfig: Option<PathBuf>,

	/// Kubeconfig context to use instead of `current-context`.
	#[serde(default)]
	pub context: Option<String>,

	#[serde(default)]
	pub read_timeout_seconds: Option<u64>,
}

impl AccessConfig {
	pub fn from_config_path(path: Option<&Path>) -> Self {
		Self {
			kubeconfig: path.map(Path::to_path_buf),
			..Self::default()
		}
	}

	pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
		let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		if content.trim().is_empty() {
			return Ok(Self::default());
		}
		serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Overlay `other` on top of this config; values set in `other` win.
	pub fn merge_from(&mut self, other: &AccessConfig) {
		if other.kubeconfig.is_some() {
			self.kubeconfig.clone_from(&other.kubeconfig);
		}
		if other.context.is_some() {
			self.context.clone_from(&other.context);
		}
		if other.read_timeout_seconds.is_some() {
			self.read_timeout_seconds = other.read_timeout_seconds;
		}
	}

	pub fn credential_source(&self) -> CredentialSource {
		CredentialSource::from_config_path(self.kubeconfig.as_deref())
			.with_context(self.context.clone())
	}

	pub fn read_timeout(&self) -> Duration {
		self.read_timeout_seconds
			.map_or(DEFAULT_READ_TIMEOUT, Duration::from_secs)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use assert_matches::assert_matches;
	use indoc::indoc;

	use super::*;

	#[test]
	fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(
			indoc! {"
				kubeconfig: /home/me/.kube/config
				context: staging
				readTimeoutSeconds: 10
			"}
			.as_bytes(),
		)
		.unwrap();

		let config = AccessConfig::load_from_file(file.path()).unwrap();
		assert_eq!(
			config,
			AccessConfig {
				kubeconfig: Some(PathBuf::from("/home/me/.kube/config")),
				context: Some("staging".to_string()),
				read_timeout_seconds: Some(10),
			}
		);
		assert_eq!(config.read_timeout(), Duration::from_secs(10));
	}

	#[test]
	fn test_empty_file_means_in_cluster() {
		let file = tempfile::NamedTempFile::new().unwrap();
		let config = AccessConfig::load_from_file(file.path()).unwrap();
		assert!(config.credential_source().is_in_cluster());
		assert_eq!(config.read_timeout(), DEFAULT_READ_TIMEOUT);
	}

	#[test]
	fn test_unknown_key_rejected() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(b"kubeConfig: /typo\n").unwrap();

		let result = AccessConfig::load_from_file(file.path());
		assert_matches!(result, Err(ConfigError::Parse { .. }));
	}

	#[test]
	fn test_missing_file() {
		let result = AccessConfig::load_from_file(Path::new("/nonexistent/cluster-access.yaml"));
		assert_matches!(result, Err(ConfigError::Read { .. }));
	}

	#[test]
	fn test_merge_prefers_set_values() {
		let mut base = AccessConfig {
			kubeconfig: Some(PathBuf::from("/from/file")),
			context: Some("file-context".to_string()),
			read_timeout_seconds: Some(5),
		};
		base.merge_from(&AccessConfig {
			context: Some("flag-context".to_string()),
			..AccessConfig::default()
		});

		assert_eq!(base.kubeconfig, Some(PathBuf::from("/from/file")));
		assert_eq!(base.context.as_deref(), Some("flag-context"));
		assert_eq!(base.read_timeout_seconds, Some(5));
	}

	#[test]
	fn test_credential_source_carries_context() {
		let config = AccessConfig {
			kubeconfig: Some(PathBuf::from("/kube/config")),
			context: Some("dev".to_string()),
			read_timeout_seconds: None,
		};
		assert_eq!(
			config.credential_source(),
			CredentialSource::Kubeconfig {
				path: PathBuf::from("/kube/config"),
				context: Some("dev".to_string()),
			}
		);
	}
}
