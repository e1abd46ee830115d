//! Credential strategy selection at construction time.

mod common;

use std::{io::Write, path::Path};

use assert_matches::assert_matches;
use cluster_access::{AccessConfig, ClusterAccessor, CredentialLoadError, CredentialSource, KubeAccessor};
use common::{capture_logs, write_kubeconfig};
use k8s_mock::HttpMockK8sServer;
use rstest::rstest;
use tracing::Level;

fn running_in_cluster() -> bool {
	std::env::var_os("KUBERNETES_SERVICE_HOST").is_some()
}

#[rstest]
#[case::absent(None)]
#[case::empty(Some(Path::new("")))]
#[tokio::test]
async fn test_in_cluster_outside_cluster_fails(#[case] path: Option<&Path>) {
	if running_in_cluster() {
		return;
	}

	let (logs, _guard) = capture_logs();
	let result = KubeAccessor::connect(path).await;

	assert_matches!(result, Err(CredentialLoadError::InCluster(_)));
	let infos = logs.at_level(Level::INFO);
	assert_eq!(infos.len(), 1);
	assert_eq!(infos[0].message, "using in-cluster credentials");
	assert_eq!(logs.errors().len(), 1);
}

#[tokio::test]
async fn test_kubeconfig_path_selects_file_strategy() {
	let server = HttpMockK8sServer::builder().build().start().await;
	let file = write_kubeconfig(&server.kubeconfig());

	let (logs, _guard) = capture_logs();
	let accessor = KubeAccessor::connect(Some(file.path())).await.unwrap();

	assert_eq!(
		accessor.credential_source(),
		Some(&CredentialSource::Kubeconfig {
			path: file.path().to_path_buf(),
			context: None,
		})
	);
	let infos = logs.at_level(Level::INFO);
	assert_eq!(infos.len(), 1);
	assert_eq!(infos[0].message, "using out-of-cluster credentials");
	assert!(logs.errors().is_empty());
}

#[tokio::test]
async fn test_named_context() {
	let server = HttpMockK8sServer::builder().build().start().await;
	let mut kubeconfig = server.kubeconfig_with_context("staging");
	// current-context points elsewhere; only the explicit context works.
	kubeconfig.current_context = Some("missing".to_string());
	let file = write_kubeconfig(&kubeconfig);

	let config = AccessConfig {
		kubeconfig: Some(file.path().to_path_buf()),
		context: Some("staging".to_string()),
		read_timeout_seconds: Some(5),
	};
	let accessor = KubeAccessor::connect_with(&config).await.unwrap();
	assert_eq!(accessor.list_namespaces().await.unwrap().items.len(), 1);

	let unknown = AccessConfig {
		context: Some("production".to_string()),
		..config
	};
	let result = KubeAccessor::connect_with(&unknown).await;
	assert_matches!(result, Err(CredentialLoadError::Kubeconfig { .. }));
}

#[tokio::test]
async fn test_missing_kubeconfig_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("kubeconfig");

	let (logs, _guard) = capture_logs();
	let result = KubeAccessor::connect(Some(path.as_path())).await;

	assert_matches!(
		result,
		Err(CredentialLoadError::Kubeconfig { path: ref failed, .. }) if *failed == path
	);
	assert_eq!(logs.errors().len(), 1);
}

#[tokio::test]
async fn test_malformed_kubeconfig_file() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(b"clusters: [this is: not valid").unwrap();

	let result = KubeAccessor::connect(Some(file.path())).await;
	assert_matches!(result, Err(CredentialLoadError::Kubeconfig { .. }));
}
