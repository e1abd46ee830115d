//! Secret, service account and namespace access over a kube client.

use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::{
	api::core::v1::{Namespace, Secret, ServiceAccount},
	apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::{
	api::{Api, ListParams, ObjectList, PostParams},
	Client,
};
use tracing::{error, info, instrument};

use crate::{
	config::AccessConfig,
	credentials::CredentialSource,
	error::{AccessError, CredentialLoadError, RemoteCallError, ResourceRef, Verb},
};

const SECRET: &str = "secret";
const SERVICE_ACCOUNT: &str = "service account";
const NAMESPACES: &str = "namespaces";

/// Operations available against a cluster.
///
/// Every call is a single request to the API server. Failures are logged once
/// by the implementation and then returned to the caller; callers should not
/// log them again.
#[async_trait]
pub trait ClusterAccessor: Send + Sync {
	/// List all namespaces visible to the credentials. An empty cluster yields
	/// an empty list.
	async fn list_namespaces(&self) -> Result<ObjectList<Namespace>, RemoteCallError>;

	async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, RemoteCallError>;

	/// Create a secret. Fails with an already-exists error if a secret with the
	/// same name is present; there is no upsert.
	async fn create_secret(
		&self,
		namespace: &str,
		secret: &Secret,
	) -> Result<Secret, RemoteCallError>;

	/// Replace an existing secret. Never creates one.
	async fn update_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, AccessError>;

	async fn get_service_account(
		&self,
		namespace: &str,
		name: &str,
	) -> Result<ServiceAccount, RemoteCallError>;

	/// Replace an existing service account. Never creates one.
	async fn update_service_account(
		&self,
		namespace: &str,
		service_account: &ServiceAccount,
	) -> Result<ServiceAccount, AccessError>;
}

/// [`ClusterAccessor`] backed by a [`kube::Client`].
///
/// Cloning is cheap and clones share the underlying connection pool, so one
/// instance can serve concurrent callers.
#[derive(Clone)]
pub struct KubeAccessor {
	client: Client,
	credential_source: Option<CredentialSource>,
}

impl std::fmt::Debug for KubeAccessor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("KubeAccessor")
			.field("credential_source", &self.credential_source)
			.finish_non_exhaustive()
	}
}

impl KubeAccessor {
	/// Connect using the kubeconfig at `config_path`, or in-cluster credentials
	/// when the path is absent or empty.
	pub async fn connect(config_path: Option<&Path>) -> Result<Self, CredentialLoadError> {
		Self::connect_with(&AccessConfig::from_config_path(config_path)).await
	}

	/// Connect using a full [`AccessConfig`].
	#[instrument(skip_all)]
	pub async fn connect_with(config: &AccessConfig) -> Result<Self, CredentialLoadError> {
		let source = config.credential_source();
		match &source {
			CredentialSource::InCluster => info!("using in-cluster credentials"),
			CredentialSource::Kubeconfig { path, context } => info!(
				kubeconfig = %path.display(),
				context = context.as_deref(),
				"using out-of-cluster credentials"
			),
		}

		match Self::build_client(&source, config).await {
			Ok(client) => Ok(Self {
				client,
				credential_source: Some(source),
			}),
			Err(err) => {
				error!(
					credentials = %source,
					error = %err,
					cause = ?std::error::Error::source(&err),
					"failed to load cluster credentials"
				);
				Err(err)
			}
		}
	}

	async fn build_client(
		source: &CredentialSource,
		config: &AccessConfig,
	) -> Result<Client, CredentialLoadError> {
		let mut client_config = source.load().await?;
		client_config.read_timeout = Some(config.read_timeout());
		Client::try_from(client_config).map_err(CredentialLoadError::Client)
	}

	/// Wrap an already constructed client.
	pub fn from_client(client: Client) -> Self {
		Self {
			client,
			credential_source: None,
		}
	}

	pub fn client(&self) -> &Client {
		&self.client
	}

	/// How the credentials were obtained; `None` when built with [`Self::from_client`].
	pub fn credential_source(&self) -> Option<&CredentialSource> {
		self.credential_source.as_ref()
	}

	fn secrets(&self, namespace: &str) -> Api<Secret> {
		Api::namespaced(self.client.clone(), namespace)
	}

	fn service_accounts(&self, namespace: &str) -> Api<ServiceAccount> {
		Api::namespaced(self.client.clone(), namespace)
	}
}

#[async_trait]
impl ClusterAccessor for KubeAccessor {
	#[instrument(skip(self))]
	async fn list_namespaces(&self) -> Result<ObjectList<Namespace>, RemoteCallError> {
		let result = Api::<Namespace>::all(self.client.clone())
			.list(&ListParams::default())
			.await;
		logged(result, Verb::List, ResourceRef::collection(NAMESPACES))
	}

	#[instrument(skip(self))]
	async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, RemoteCallError> {
		let result = self.secrets(namespace).get(name).await;
		logged(
			result,
			Verb::Get,
			ResourceRef::namespaced(SECRET, namespace, Some(name)),
		)
	}

	#[instrument(skip(self, secret), fields(name = secret.metadata.name.as_deref()))]
	async fn create_secret(
		&self,
		namespace: &str,
		secret: &Secret,
	) -> Result<Secret, RemoteCallError> {
		let result = self
			.secrets(namespace)
			.create(&PostParams::default(), secret)
			.await;
		logged(
			result,
			Verb::Create,
			ResourceRef::namespaced(SECRET, namespace, secret.metadata.name.as_deref()),
		)
	}

	#[instrument(skip(self, secret), fields(name = secret.metadata.name.as_deref()))]
	async fn update_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, AccessError> {
		let name = required_name(&secret.metadata, SECRET, namespace)?;
		let result = self
			.secrets(namespace)
			.replace(name, &PostParams::default(), secret)
			.await;
		Ok(logged(
			result,
			Verb::Update,
			ResourceRef::namespaced(SECRET, namespace, Some(name)),
		)?)
	}

	#[instrument(skip(self))]
	async fn get_service_account(
		&self,
		namespace: &str,
		name: &str,
	) -> Result<ServiceAccount, RemoteCallError> {
		let result = self.service_accounts(namespace).get(name).await;
		logged(
			result,
			Verb::Get,
			ResourceRef::namespaced(SERVICE_ACCOUNT, namespace, Some(name)),
		)
	}

	#[instrument(
		skip(self, service_account),
		fields(name = service_account.metadata.name.as_deref())
	)]
	async fn update_service_account(
		&self,
		namespace: &str,
		service_account: &ServiceAccount,
	) -> Result<ServiceAccount, AccessError> {
		let name = required_name(&service_account.metadata, SERVICE_ACCOUNT, namespace)?;
		let result = self
			.service_accounts(namespace)
			.replace(name, &PostParams::default(), service_account)
			.await;
		Ok(logged(
			result,
			Verb::Update,
			ResourceRef::namespaced(SERVICE_ACCOUNT, namespace, Some(name)),
		)?)
	}
}

/// Log a failed call once, then hand the error back for propagation.
fn logged<T>(
	result: Result<T, kube::Error>,
	verb: Verb,
	resource: ResourceRef,
) -> Result<T, RemoteCallError> {
	result.map_err(|source| {
		let err = RemoteCallError::new(verb, resource, source);
		error!(
			class = ?err.class(),
			status = err.status_code(),
			error = %err.kube_error(),
			"error {} {}",
			err.verb(),
			err.resource()
		);
		err
	})
}

fn required_name<'a>(
	metadata: &'a ObjectMeta,
	kind: &'static str,
	namespace: &str,
) -> Result<&'a str, AccessError> {
	metadata.name.as_deref().ok_or_else(|| {
		let err = AccessError::MissingName {
			kind,
			namespace: namespace.to_string(),
		};
		error!(error = %err, "error {} {} in namespace {}", Verb::Update, kind, namespace);
		err
	})
}
