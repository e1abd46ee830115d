//! Mock Kubernetes API server for testing.
//!
//! Provides an HTTP server that can be used with kubeconfig-based connections.
//! Namespaces, secrets, service accounts and config maps are stored in memory
//! and served under `/api/v1`.

pub mod http;
pub mod resources;

pub use http::{kubeconfig_for, HttpMockK8sServer, RunningHttpMockK8sServer};
pub use resources::{MockApiResource, ResourceTable, Target};
