//! Shared helpers for the accessor integration tests.

#![allow(dead_code)]

use std::{
	collections::BTreeMap,
	fmt,
	io::Write,
	sync::{Arc, Mutex},
};

use cluster_access::KubeAccessor;
use k8s_mock::RunningHttpMockK8sServer;
use k8s_openapi::{
	api::core::v1::{Secret, ServiceAccount},
	apimachinery::pkg::apis::meta::v1::ObjectMeta,
	ByteString,
};
use kube::config::Kubeconfig;
use tempfile::NamedTempFile;
use tracing::{
	field::{Field, Visit},
	subscriber::DefaultGuard,
	Event, Level, Subscriber,
};
use tracing_subscriber::{layer::Context, layer::SubscriberExt, Layer};

/// One event recorded by [`capture_logs`].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
	pub level: Level,
	pub target: String,
	pub message: String,
}

#[derive(Clone, Default)]
pub struct CapturedEvents(Arc<Mutex<Vec<CapturedEvent>>>);

impl CapturedEvents {
	/// Events emitted by the accessor crate at the given level.
	pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
		self.0
			.lock()
			.unwrap()
			.iter()
			.filter(|e| e.level == level && e.target.starts_with("cluster_access"))
			.cloned()
			.collect()
	}

	pub fn errors(&self) -> Vec<CapturedEvent> {
		self.at_level(Level::ERROR)
	}
}

struct CaptureLayer {
	events: CapturedEvents,
}

#[derive(Default)]
struct MessageVisitor {
	message: String,
}

impl Visit for MessageVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			self.message = format!("{value:?}");
		}
	}
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let mut visitor = MessageVisitor::default();
		event.record(&mut visitor);
		self.events.0.lock().unwrap().push(CapturedEvent {
			level: *event.metadata().level(),
			target: event.metadata().target().to_string(),
			message: visitor.message,
		});
	}
}

/// Record tracing events on the current thread until the guard is dropped.
///
/// Only works with the current-thread runtime `#[tokio::test]` uses by default.
pub fn capture_logs() -> (CapturedEvents, DefaultGuard) {
	let events = CapturedEvents::default();
	let subscriber = tracing_subscriber::registry().with(CaptureLayer {
		events: events.clone(),
	});
	let guard = tracing::subscriber::set_default(subscriber);
	(events, guard)
}

/// Write a kubeconfig to a temporary file.
pub fn write_kubeconfig(kubeconfig: &Kubeconfig) -> NamedTempFile {
	let mut file = NamedTempFile::new().unwrap();
	let yaml = serde_yaml::to_string(kubeconfig).unwrap();
	file.write_all(yaml.as_bytes()).unwrap();
	file
}

/// Connect to the mock server the same way a user would: through a kubeconfig file.
pub async fn connect(server: &RunningHttpMockK8sServer) -> KubeAccessor {
	let file = write_kubeconfig(&server.kubeconfig());
	KubeAccessor::connect(Some(file.path()))
		.await
		.expect("connection should succeed")
}

pub fn namespace(name: &str) -> serde_json::Value {
	serde_json::json!({
		"apiVersion": "v1",
		"kind": "Namespace",
		"metadata": {"name": name}
	})
}

pub fn opaque_secret(name: &str, data: &[(&str, &str)]) -> Secret {
	Secret {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			..ObjectMeta::default()
		},
		type_: Some("Opaque".to_string()),
		data: Some(
			data.iter()
				.map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
				.collect(),
		),
		..Secret::default()
	}
}

pub fn secret_data(secret: &Secret) -> BTreeMap<String, String> {
	secret
		.data
		.iter()
		.flatten()
		.map(|(k, v)| (k.clone(), String::from_utf8(v.0.clone()).unwrap()))
		.collect()
}

pub fn service_account(name: &str) -> ServiceAccount {
	ServiceAccount {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			..ObjectMeta::default()
		},
		..ServiceAccount::default()
	}
}
