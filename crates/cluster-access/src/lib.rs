//! Typed access to a handful of core Kubernetes resources.
//!
//! [`KubeAccessor`] authenticates either with in-cluster credentials or with a
//! kubeconfig file and forwards each call to the API server as a single
//! request. Secrets and service accounts can be read and written, namespaces
//! can be listed. Nothing is cached and nothing is retried; failed calls are
//! logged once and returned.
//!
//! Code that only needs the operations should depend on the
//! [`ClusterAccessor`] trait so tests can substitute a fake.

pub mod accessor;
pub mod config;
pub mod credentials;
pub mod error;

pub use accessor::{ClusterAccessor, KubeAccessor};
pub use config::AccessConfig;
pub use credentials::CredentialSource;
pub use error::{AccessError, CredentialLoadError, ErrorClass, RemoteCallError};
