//! Credential strategy selection.

use std::{
	fmt,
	path::{Path, PathBuf},
};

use kube::{
	config::{KubeConfigOptions, Kubeconfig},
	Config,
};

use crate::error::CredentialLoadError;

/// Where the accessor takes its cluster connection parameters from.
///
/// Resolved once when the accessor is built and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
	/// The service account token and CA mounted into pods, plus the
	/// `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT` environment.
	InCluster,

	/// A kubeconfig file. `context` overrides the file's `current-context`.
	Kubeconfig {
		path: PathBuf,
		context: Option<String>,
	},
}

impl CredentialSource {
	/// An empty or absent path selects in-cluster credentials; anything else is
	/// read as a kubeconfig file.
	pub fn from_config_path(path: Option<&Path>) -> Self {
		match path {
			Some(path) if !path.as_os_str().is_empty() => Self::Kubeconfig {
				path: path.to_path_buf(),
				context: None,
			},
			_ => Self::InCluster,
		}
	}

	/// Use the named kubeconfig context. Has no effect on in-cluster credentials.
	#[must_use]
	pub fn with_context(self, context: Option<String>) -> Self {
		match self {
			Self::Kubeconfig { path, .. } => Self::Kubeconfig { path, context },
			Self::InCluster => Self::InCluster,
		}
	}

	pub fn is_in_cluster(&self) -> bool {
		matches!(self, Self::InCluster)
	}

	/// Produce client configuration from this source.
	pub async fn load(&self) -> Result<Config, CredentialLoadError> {
		match self {
			Self::InCluster => Config::incluster().map_err(CredentialLoadError::InCluster),
			Self::Kubeconfig { path, context } => {
				let kubeconfig_error = |source| CredentialLoadError::Kubeconfig {
					path: path.clone(),
					source,
				};

				let kubeconfig = Kubeconfig::read_from(path).map_err(kubeconfig_error)?;
				Config::from_custom_kubeconfig(
					kubeconfig,
					&KubeConfigOptions {
						context: context.clone(),
						..Default::default()
					},
				)
				.await
				.map_err(kubeconfig_error)
			}
		}
	}
}

impl fmt::Display for CredentialSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InCluster => f.write_str("in-cluster"),
			Self::Kubeconfig {
				path,
				context: Some(context),
			} => write!(f, "kubeconfig {} (context:{})", path.display(), context),
			Self::Kubeconfig {
				path,
				context: None,
			} => write!(f, "kubeconfig {}", path.display()),
		}
	}
}
