//! Error types returned by the accessor.

use std::{fmt, path::PathBuf};

use kube::config::{InClusterError, KubeconfigError};
use thiserror::Error;

/// Construction-time failure to obtain cluster connection parameters.
///
/// No accessor is produced when this is returned.
#[derive(Debug, Error)]
pub enum CredentialLoadError {
	#[error("loading in-cluster credentials")]
	InCluster(#[source] InClusterError),

	#[error("loading kubeconfig `{}`", path.display())]
	Kubeconfig {
		path: PathBuf,
		#[source]
		source: KubeconfigError,
	},

	#[error("building cluster client")]
	Client(#[source] kube::Error),
}

/// The kind of request that was issued against the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
	List,
	Get,
	Create,
	Update,
}

impl fmt::Display for Verb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::List => "listing",
			Self::Get => "getting",
			Self::Create => "creating",
			Self::Update => "updating",
		})
	}
}

/// Identifies the object (or collection) a request was about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
	pub kind: &'static str,
	pub namespace: Option<String>,
	pub name: Option<String>,
}

impl ResourceRef {
	/// A cluster-wide collection such as `namespaces`.
	pub fn collection(kind: &'static str) -> Self {
		Self {
			kind,
			namespace: None,
			name: None,
		}
	}

	/// A namespaced object. `name` may be absent for creates relying on `generateName`.
	pub fn namespaced(kind: &'static str, namespace: &str, name: Option<&str>) -> Self {
		Self {
			kind,
			namespace: Some(namespace.to_string()),
			name: name.map(str::to_string),
		}
	}
}

impl fmt::Display for ResourceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match (&self.namespace, &self.name) {
			(Some(namespace), Some(name)) => write!(f, "{} {}/{}", self.kind, namespace, name),
			(Some(namespace), None) => write!(f, "{} in namespace {}", self.kind, namespace),
			(None, Some(name)) => write!(f, "{} {}", self.kind, name),
			(None, None) => f.write_str(self.kind),
		}
	}
}

/// Coarse classification of a failed remote call, as reported by the API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
	/// 404: the object (or its namespace) does not exist.
	NotFound,
	/// 409 on create: an object with the same namespace and name exists.
	AlreadyExists,
	/// 409 on update: the caller's resourceVersion is stale.
	Conflict,
	/// 401 or 403.
	Unauthorized,
	/// Any other status returned by the API server.
	Rejected,
	/// The request never produced an API status (connection, TLS, decoding...).
	Transport,
}

/// A failed get/create/update/list call.
///
/// The error reported by the kube client is kept intact as the source.
#[derive(Debug, Error)]
#[error("{verb} {resource}")]
pub struct RemoteCallError {
	verb: Verb,
	resource: ResourceRef,
	#[source]
	source: Box<kube::Error>,
}

impl RemoteCallError {
	pub fn new(verb: Verb, resource: ResourceRef, source: kube::Error) -> Self {
		Self {
			verb,
			resource,
			source: Box::new(source),
		}
	}

	pub fn verb(&self) -> Verb {
		self.verb
	}

	pub fn resource(&self) -> &ResourceRef {
		&self.resource
	}

	/// The untouched client error.
	pub fn kube_error(&self) -> &kube::Error {
		&self.source
	}

	pub fn into_source(self) -> kube::Error {
		*self.source
	}

	/// HTTP status code of the API response, if the server answered at all.
	pub fn status_code(&self) -> Option<u16> {
		match &*self.source {
			kube::Error::Api(status) => Some(status.code),
			_ => None,
		}
	}

	pub fn class(&self) -> ErrorClass {
		match self.status_code() {
			None => ErrorClass::Transport,
			Some(404) => ErrorClass::NotFound,
			// The API server answers 409 with reason AlreadyExists on POST and
			// Conflict on PUT, so the verb is enough to tell them apart.
			Some(409) if self.verb == Verb::Create => ErrorClass::AlreadyExists,
			Some(409) => ErrorClass::Conflict,
			Some(401 | 403) => ErrorClass::Unauthorized,
			Some(_) => ErrorClass::Rejected,
		}
	}

	pub fn is_not_found(&self) -> bool {
		self.class() == ErrorClass::NotFound
	}

	pub fn is_already_exists(&self) -> bool {
		self.class() == ErrorClass::AlreadyExists
	}

	pub fn is_conflict(&self) -> bool {
		self.class() == ErrorClass::Conflict
	}
}

/// Error returned by update operations.
#[derive(Debug, Error)]
pub enum AccessError {
	/// Updates address the object by `metadata.name`, which was not set.
	#[error("{kind} in namespace {namespace} has no metadata.name")]
	MissingName {
		kind: &'static str,
		namespace: String,
	},

	#[error(transparent)]
	Remote(#[from] RemoteCallError),
}

impl AccessError {
	/// Classification of the remote failure; `None` for local errors.
	pub fn class(&self) -> Option<ErrorClass> {
		match self {
			Self::MissingName { .. } => None,
			Self::Remote(err) => Some(err.class()),
		}
	}

	pub fn is_not_found(&self) -> bool {
		self.class() == Some(ErrorClass::NotFound)
	}

	pub fn is_conflict(&self) -> bool {
		self.class() == Some(ErrorClass::Conflict)
	}
}
