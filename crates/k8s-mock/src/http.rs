//! HTTP-based mock Kubernetes server using wiremock.
//!
//! The server keeps core/v1 objects in memory and answers get, list, create
//! and replace requests against them the way the API server does, including
//! `AlreadyExists` on duplicate creates and `Conflict` on stale
//! `resourceVersion`s.

use std::{
	collections::BTreeMap,
	sync::{Arc, RwLock},
};

use bon::Builder;
use kube::config::{
	AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
};
use serde_json::{json, Value};
use tracing::{debug, trace};
use wiremock::{
	matchers::{method, path_regex},
	Mock, MockServer, Request, ResponseTemplate,
};

use super::resources::{MockApiResource, ObjectKey, ResourceTable, Target};

/// In-memory object store shared by all request handlers.
#[derive(Debug, Default)]
pub struct Store {
	objects: BTreeMap<ObjectKey, Value>,
	revision: u64,
}

impl Store {
	fn next_revision(&mut self) -> String {
		self.revision += 1;
		self.revision.to_string()
	}

	fn insert_stamped(&mut self, key: ObjectKey, mut object: Value) -> Value {
		object["metadata"]["resourceVersion"] = Value::String(self.next_revision());
		self.objects.insert(key, object.clone());
		object
	}

	fn namespace_exists(&self, namespace: &str) -> bool {
		self.objects.contains_key(&namespace_key(namespace))
	}
}

/// Type alias for the shared mutable store.
pub type SharedStore = Arc<RwLock<Store>>;

/// A mock Kubernetes server exposed over HTTP.
#[derive(Builder)]
pub struct HttpMockK8sServer {
	/// Objects present when the server starts, as raw manifests.
	#[builder(default)]
	resources: Vec<Value>,
	/// Seed a `default` namespace unless the manifests already contain one.
	#[builder(default = true)]
	default_namespace: bool,
}

/// A running HTTP mock server instance.
pub struct RunningHttpMockK8sServer {
	server: MockServer,
	store: SharedStore,
}

impl HttpMockK8sServer {
	/// Start the mock server with all configured resources.
	pub async fn start(self) -> RunningHttpMockK8sServer {
		let server = MockServer::start().await;
		let table = ResourceTable::default();

		debug!(uri = %server.uri(), "Started mock K8s server");

		let mut store = Store::default();
		for manifest in self.resources {
			if let Some(key) = key_for_manifest(&manifest, &table) {
				trace!(?key, "Registered resource");
				store.insert_stamped(key, manifest);
			}
		}

		if self.default_namespace && !store.namespace_exists("default") {
			store.insert_stamped(namespace_key("default"), namespace_manifest("default"));
		}

		let store = Arc::new(RwLock::new(store));
		mount_resources(&server, &store, &table).await;

		RunningHttpMockK8sServer { server, store }
	}
}

impl RunningHttpMockK8sServer {
	/// Get the server's URI (e.g., "http://127.0.0.1:12345").
	pub fn uri(&self) -> String {
		self.server.uri()
	}

	/// Current state of a stored object.
	pub fn object(&self, plural: &str, namespace: Option<&str>, name: &str) -> Option<Value> {
		let key = (
			plural.to_string(),
			namespace.map(str::to_string),
			name.to_string(),
		);
		self.store.read().unwrap().objects.get(&key).cloned()
	}

	/// Number of stored objects of the given plural across all namespaces.
	pub fn count(&self, plural: &str) -> usize {
		self.store
			.read()
			.unwrap()
			.objects
			.keys()
			.filter(|(p, _, _)| p == plural)
			.count()
	}

	/// Create a Kubeconfig pointing to this mock server.
	pub fn kubeconfig(&self) -> Kubeconfig {
		self.kubeconfig_with_context("mock-context")
	}

	/// Create a Kubeconfig pointing to this mock server with a custom context name.
	pub fn kubeconfig_with_context(&self, context_name: &str) -> Kubeconfig {
		kubeconfig_for(&self.uri(), context_name)
	}
}

/// A kubeconfig with a single cluster, user and context pointing at `server`.
pub fn kubeconfig_for(server: &str, context_name: &str) -> Kubeconfig {
	let cluster_name = "mock-cluster";
	let user_name = "mock-user";

	Kubeconfig {
		clusters: vec![NamedCluster {
			name: cluster_name.to_string(),
			cluster: Some(Cluster {
				server: Some(server.to_string()),
				insecure_skip_tls_verify: Some(true),
				..Default::default()
			}),
		}],
		contexts: vec![NamedContext {
			name: context_name.to_string(),
			context: Some(Context {
				cluster: cluster_name.to_string(),
				user: Some(user_name.to_string()),
				namespace: Some("default".to_string()),
				..Default::default()
			}),
		}],
		auth_infos: vec![NamedAuthInfo {
			name: user_name.to_string(),
			auth_info: Some(AuthInfo::default()),
		}],
		current_context: Some(context_name.to_string()),
		..Default::default()
	}
}

fn namespace_key(name: &str) -> ObjectKey {
	("namespaces".to_string(), None, name.to_string())
}

fn namespace_manifest(name: &str) -> Value {
	json!({
		"apiVersion": "v1",
		"kind": "Namespace",
		"metadata": {
			"name": name
		}
	})
}

/// Derive the storage key for a seed manifest.
fn key_for_manifest(manifest: &Value, table: &ResourceTable) -> Option<ObjectKey> {
	let kind = manifest.get("kind")?.as_str()?;
	let name = manifest.pointer("/metadata/name")?.as_str()?.to_string();
	let resource = table.by_kind(kind)?;

	let namespace = resource.namespaced.then(|| {
		manifest
			.pointer("/metadata/namespace")
			.and_then(Value::as_str)
			.unwrap_or("default")
			.to_string()
	});

	Some((resource.plural.clone(), namespace, name))
}

async fn mount_resources(server: &MockServer, store: &SharedStore, table: &ResourceTable) {
	let get_store = Arc::clone(store);
	let get_table = table.clone();
	Mock::given(method("GET"))
		.and(path_regex(r"^/api/v1/.*"))
		.respond_with(move |req: &Request| handle_get(&get_store, &get_table, req))
		.mount(server)
		.await;

	let post_store = Arc::clone(store);
	let post_table = table.clone();
	Mock::given(method("POST"))
		.and(path_regex(r"^/api/v1/.*"))
		.respond_with(move |req: &Request| handle_create(&post_store, &post_table, req))
		.mount(server)
		.await;

	let put_store = Arc::clone(store);
	let put_table = table.clone();
	Mock::given(method("PUT"))
		.and(path_regex(r"^/api/v1/.*"))
		.respond_with(move |req: &Request| handle_replace(&put_store, &put_table, req))
		.mount(server)
		.await;
}

fn handle_get(store: &SharedStore, table: &ResourceTable, req: &Request) -> ResponseTemplate {
	let Some((target, resource)) = resolve(table, req) else {
		return unknown_path(req);
	};
	let store = store.read().unwrap();

	match target {
		Target::Object {
			plural,
			namespace,
			name,
		} => match store.objects.get(&(plural, namespace, name.clone())) {
			Some(object) => ResponseTemplate::new(200).set_body_json(object),
			None => not_found(resource, &name),
		},
		Target::Collection { plural, namespace } => {
			// A cluster-level path on a namespaced resource lists every namespace.
			let items: Vec<_> = store
				.objects
				.iter()
				.filter(|((p, ns, _), _)| {
					*p == plural && (namespace.is_none() || *ns == namespace)
				})
				.map(|(_, v)| v.clone())
				.collect();

			ResponseTemplate::new(200).set_body_json(json!({
				"kind": format!("{}List", resource.kind),
				"apiVersion": "v1",
				"metadata": {"resourceVersion": store.revision.to_string()},
				"items": items
			}))
		}
	}
}

fn handle_create(store: &SharedStore, table: &ResourceTable, req: &Request) -> ResponseTemplate {
	let Some((target, resource)) = resolve(table, req) else {
		return unknown_path(req);
	};
	let Target::Collection { plural, namespace } = target else {
		return method_not_allowed(req);
	};
	if resource.namespaced != namespace.is_some() {
		return method_not_allowed(req);
	}

	let mut body = match parse_body(req) {
		Ok(body) => body,
		Err(response) => return response,
	};
	let Some(name) = body
		.pointer("/metadata/name")
		.and_then(Value::as_str)
		.map(str::to_string)
	else {
		return status(
			422,
			"Invalid",
			format!("{} is invalid: metadata.name: Required value: name is required", resource.kind),
		);
	};
	if let Err(response) = check_namespace(&mut body, namespace.as_deref()) {
		return response;
	}

	let mut store = store.write().unwrap();
	if let Some(ns) = &namespace {
		if !store.namespace_exists(ns) {
			return status(404, "NotFound", format!("namespaces \"{ns}\" not found"));
		}
	}

	let key = (plural, namespace, name.clone());
	if store.objects.contains_key(&key) {
		return status(
			409,
			"AlreadyExists",
			format!("{} \"{}\" already exists", resource.plural, name),
		);
	}

	if is_dry_run(req) {
		return ResponseTemplate::new(201).set_body_json(body);
	}

	let created = store.insert_stamped(key, body);
	ResponseTemplate::new(201).set_body_json(created)
}

fn handle_replace(store: &SharedStore, table: &ResourceTable, req: &Request) -> ResponseTemplate {
	let Some((target, resource)) = resolve(table, req) else {
		return unknown_path(req);
	};
	let Target::Object {
		plural,
		namespace,
		name,
	} = target
	else {
		return method_not_allowed(req);
	};

	let mut body = match parse_body(req) {
		Ok(body) => body,
		Err(response) => return response,
	};
	let body_name = body.pointer("/metadata/name").and_then(Value::as_str);
	if body_name != Some(name.as_str()) {
		return status(
			400,
			"BadRequest",
			format!(
				"the name of the object ({}) does not match the name on the URL ({})",
				body_name.unwrap_or_default(),
				name
			),
		);
	}
	if let Err(response) = check_namespace(&mut body, namespace.as_deref()) {
		return response;
	}

	let mut store = store.write().unwrap();
	let key = (plural, namespace, name.clone());
	let Some(existing) = store.objects.get(&key) else {
		return not_found(resource, &name);
	};

	// An empty resourceVersion means an unconditional update.
	let requested = body
		.pointer("/metadata/resourceVersion")
		.and_then(Value::as_str)
		.filter(|rv| !rv.is_empty());
	let current = existing
		.pointer("/metadata/resourceVersion")
		.and_then(Value::as_str);
	if requested.is_some() && requested != current {
		return status(
			409,
			"Conflict",
			format!(
				"Operation cannot be fulfilled on {} \"{}\": the object has been modified; \
				 please apply your changes to the latest version and try again",
				resource.plural, name
			),
		);
	}

	if is_dry_run(req) {
		return ResponseTemplate::new(200).set_body_json(body);
	}

	let replaced = store.insert_stamped(key, body);
	ResponseTemplate::new(200).set_body_json(replaced)
}

fn resolve<'t>(table: &'t ResourceTable, req: &Request) -> Option<(Target, &'t MockApiResource)> {
	let target = Target::parse(req.url.path())?;
	let resource = table.by_plural(target.plural())?;
	Some((target, resource))
}

fn parse_body(req: &Request) -> Result<Value, ResponseTemplate> {
	match serde_json::from_slice::<Value>(&req.body) {
		Ok(body) if body.is_object() => Ok(body),
		Ok(_) => Err(status(400, "BadRequest", "request body must be an object".to_string())),
		Err(e) => Err(status(400, "BadRequest", e.to_string())),
	}
}

/// Fill in the namespace from the URL, rejecting bodies that name another one.
fn check_namespace(body: &mut Value, namespace: Option<&str>) -> Result<(), ResponseTemplate> {
	let Some(namespace) = namespace else {
		return Ok(());
	};
	match body.pointer("/metadata/namespace").and_then(Value::as_str) {
		Some(ns) if ns != namespace => Err(status(
			400,
			"BadRequest",
			"the namespace of the provided object does not match the namespace sent on the request"
				.to_string(),
		)),
		Some(_) => Ok(()),
		None => {
			body["metadata"]["namespace"] = Value::String(namespace.to_string());
			Ok(())
		}
	}
}

fn is_dry_run(req: &Request) -> bool {
	req.url.query().unwrap_or("").contains("dryRun")
}

fn not_found(resource: &MockApiResource, name: &str) -> ResponseTemplate {
	status(
		404,
		"NotFound",
		format!("{} \"{}\" not found", resource.plural, name),
	)
}

fn unknown_path(req: &Request) -> ResponseTemplate {
	status(
		404,
		"NotFound",
		format!("the server could not find the requested resource ({})", req.url.path()),
	)
}

fn method_not_allowed(req: &Request) -> ResponseTemplate {
	status(
		405,
		"MethodNotAllowed",
		format!("the server does not allow this method on the requested resource ({})", req.url.path()),
	)
}

fn status(code: u16, reason: &str, message: String) -> ResponseTemplate {
	ResponseTemplate::new(code).set_body_json(json!({
		"kind": "Status",
		"apiVersion": "v1",
		"metadata": {},
		"status": "Failure",
		"message": message,
		"reason": reason,
		"code": code
	}))
}
