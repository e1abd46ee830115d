//! Resource kinds served by the mock server.

/// A core/v1 resource the mock knows how to store.
#[derive(Debug, Clone)]
pub struct MockApiResource {
	/// Plural name used in URL paths, e.g. `secrets`.
	pub plural: String,
	pub kind: String,
	pub namespaced: bool,
}

impl MockApiResource {
	pub fn namespaced(plural: &str, kind: &str) -> Self {
		Self {
			plural: plural.to_string(),
			kind: kind.to_string(),
			namespaced: true,
		}
	}

	pub fn cluster_scoped(plural: &str, kind: &str) -> Self {
		Self {
			plural: plural.to_string(),
			kind: kind.to_string(),
			namespaced: false,
		}
	}
}

/// Lookup table of the resources the mock serves under `/api/v1`.
#[derive(Debug, Clone)]
pub struct ResourceTable {
	resources: Vec<MockApiResource>,
}

impl Default for ResourceTable {
	fn default() -> Self {
		Self {
			resources: vec![
				MockApiResource::cluster_scoped("namespaces", "Namespace"),
				MockApiResource::namespaced("secrets", "Secret"),
				MockApiResource::namespaced("serviceaccounts", "ServiceAccount"),
				MockApiResource::namespaced("configmaps", "ConfigMap"),
			],
		}
	}
}

impl ResourceTable {
	pub fn by_plural(&self, plural: &str) -> Option<&MockApiResource> {
		self.resources.iter().find(|r| r.plural == plural)
	}

	pub fn by_kind(&self, kind: &str) -> Option<&MockApiResource> {
		self.resources.iter().find(|r| r.kind == kind)
	}
}

/// Where an API request points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
	/// A collection, e.g. `/api/v1/namespaces/ns1/secrets`.
	Collection {
		plural: String,
		namespace: Option<String>,
	},
	/// A single object, e.g. `/api/v1/namespaces/ns1/secrets/s1`.
	Object {
		plural: String,
		namespace: Option<String>,
		name: String,
	},
}

impl Target {
	/// Parse a core/v1 request path.
	///
	/// Examples:
	/// - `/api/v1/namespaces` -> collection of namespaces
	/// - `/api/v1/namespaces/ns1` -> namespace `ns1`
	/// - `/api/v1/secrets` -> secrets across all namespaces
	/// - `/api/v1/namespaces/ns1/secrets/s1` -> secret `s1` in `ns1`
	pub fn parse(path: &str) -> Option<Self> {
		let rest = path.trim_end_matches('/').strip_prefix("/api/v1/")?;
		let segments: Vec<&str> = rest.split('/').collect();

		match segments.as_slice() {
			[plural] => Some(Self::Collection {
				plural: (*plural).to_string(),
				namespace: None,
			}),
			[plural, name] => Some(Self::Object {
				plural: (*plural).to_string(),
				namespace: None,
				name: (*name).to_string(),
			}),
			["namespaces", namespace, plural] => Some(Self::Collection {
				plural: (*plural).to_string(),
				namespace: Some((*namespace).to_string()),
			}),
			["namespaces", namespace, plural, name] => Some(Self::Object {
				plural: (*plural).to_string(),
				namespace: Some((*namespace).to_string()),
				name: (*name).to_string(),
			}),
			_ => None,
		}
	}

	pub fn plural(&self) -> &str {
		match self {
			Self::Collection { plural, .. } | Self::Object { plural, .. } => plural,
		}
	}

	pub fn namespace(&self) -> Option<&str> {
		match self {
			Self::Collection { namespace, .. } | Self::Object { namespace, .. } => {
				namespace.as_deref()
			}
		}
	}
}

/// Storage key of an object: (plural, namespace, name).
pub type ObjectKey = (String, Option<String>, String);
