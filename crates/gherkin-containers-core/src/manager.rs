//! Per-scenario lifecycle manager
//!
//! A [`ContainerManager`] owns every resource started during one scenario.
//! At most one resource per kind is live at a time; the first request for a
//! kind starts it, later requests get the cached client back.
//!
//! ## Lifecycle
//!
//! ```text
//! start(kind) ──► registry.get ──► create_container ──► handle.start
//!                                                          │
//!      cache ◄── get_client ◄── on_start ◄─────────────────┘
//!
//! stop_all()  ──► for each entry, newest first: on_stop ──► handle.stop
//! ```
//!
//! Teardown never stops half way: every failure is collected and reported
//! together, and the cache is empty afterwards regardless of the outcome.

use crate::error::{BoxError, ContainerError, ContainerResult, LifecycleStage, TeardownErrors};
use crate::options::ContainerOptions;
use crate::plugin::{AnyHandle, Client, ResourceHandle};
use crate::registry::PluginRegistry;
use crate::settings::ContainerSettings;
use std::any::Any;
use std::sync::Arc;

struct RunningResource {
	kind: String,
	handle: Box<dyn AnyHandle>,
	client: Client,
}

/// Cache of running resources for one scenario.
///
/// # Examples
///
/// ```rust
/// use gherkin_containers_core::testing::{FakePlugin, FakeProbe};
/// use gherkin_containers_core::{ContainerManager, ContainerOptions, PluginRegistry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(PluginRegistry::without_discovery());
/// registry
/// 	.register_with("widget", FakePlugin::factory("widget", &FakeProbe::new()))
/// 	.unwrap();
///
/// let mut manager = ContainerManager::with_registry(registry);
/// let first = manager.get_client("widget", &ContainerOptions::new()).unwrap();
/// let second = manager.get_client("widget", &ContainerOptions::new()).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
///
/// manager.stop_all().unwrap();
/// assert!(manager.is_empty());
/// ```
pub struct ContainerManager {
	registry: Arc<PluginRegistry>,
	settings: ContainerSettings,
	running: Vec<RunningResource>,
}

impl ContainerManager {
	/// Manager backed by the global registry and environment settings.
	pub fn new() -> Self {
		Self::with_registry(PluginRegistry::global())
	}

	pub fn with_registry(registry: Arc<PluginRegistry>) -> Self {
		Self {
			registry,
			settings: ContainerSettings::from_env(),
			running: Vec::new(),
		}
	}

	pub fn with_settings(mut self, settings: ContainerSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn registry(&self) -> &Arc<PluginRegistry> {
		&self.registry
	}

	pub fn settings(&self) -> &ContainerSettings {
		&self.settings
	}

	/// Start `kind` unless it is already running, and return its client.
	///
	/// On a cache hit `options` are ignored. On failure nothing is cached and
	/// the partially built handle is dropped.
	pub fn start(&mut self, kind: &str, options: &ContainerOptions) -> ContainerResult<Client> {
		if let Some(resource) = self.find(kind) {
			tracing::debug!(kind, "resource already running; reusing client");
			return Ok(Arc::clone(&resource.client));
		}

		let plugin = self.registry.get(kind)?;
		let startup = |stage: LifecycleStage| {
			move |source: BoxError| ContainerError::Startup {
				kind: kind.to_string(),
				stage,
				source,
			}
		};

		tracing::debug!(kind, plugin_type = plugin.plugin_type(), "creating resource");
		let mut handle = plugin
			.create_resource(options)
			.map_err(startup(LifecycleStage::Create))?;
		handle.start().map_err(startup(LifecycleStage::Start))?;
		plugin
			.after_start(handle.as_mut())
			.map_err(startup(LifecycleStage::OnStart))?;
		let client = plugin
			.client_for(handle.as_ref())
			.map_err(startup(LifecycleStage::GetClient))?;

		tracing::info!(kind, "resource started");
		self.running.push(RunningResource {
			kind: kind.to_string(),
			handle,
			client: Arc::clone(&client),
		});
		Ok(client)
	}

	/// Typed [`ContainerManager::start`].
	pub fn start_as<C>(&mut self, kind: &str, options: &ContainerOptions) -> ContainerResult<Arc<C>>
	where
		C: Any + Send + Sync,
	{
		let client = self.start(kind, options)?;
		downcast_client(kind, client)
	}

	/// Cached client for `kind`, starting the resource on a miss.
	pub fn get_client(&mut self, kind: &str, options: &ContainerOptions) -> ContainerResult<Client> {
		if let Some(resource) = self.find(kind) {
			return Ok(Arc::clone(&resource.client));
		}
		self.start(kind, options)
	}

	/// Typed [`ContainerManager::get_client`].
	pub fn client<C>(&mut self, kind: &str, options: &ContainerOptions) -> ContainerResult<Arc<C>>
	where
		C: Any + Send + Sync,
	{
		let client = self.get_client(kind, options)?;
		downcast_client(kind, client)
	}

	/// Borrow the running handle of `kind` as its concrete type.
	pub fn handle<H: Any>(&self, kind: &str) -> Option<&H> {
		self.find(kind)
			.and_then(|resource| resource.handle.as_any().downcast_ref::<H>())
	}

	pub fn is_running(&self, kind: &str) -> bool {
		self.find(kind).is_some()
	}

	/// Running kinds in creation order.
	pub fn running_kinds(&self) -> Vec<&str> {
		self.running.iter().map(|r| r.kind.as_str()).collect()
	}

	pub fn len(&self) -> usize {
		self.running.len()
	}

	pub fn is_empty(&self) -> bool {
		self.running.is_empty()
	}

	/// Stop every running resource, newest first.
	///
	/// Each entry gets a freshly resolved plugin for its `on_stop` hook, then
	/// its handle is stopped with [`ContainerSettings::stop`]. Failures are
	/// collected and returned as [`ContainerError::Teardown`] once all
	/// entries were processed. The cache is always cleared.
	pub fn stop_all(&mut self) -> ContainerResult<()> {
		let running = std::mem::take(&mut self.running);
		let mut errors = TeardownErrors::default();

		for mut resource in running.into_iter().rev() {
			let kind = resource.kind.as_str();

			match self.registry.get(kind) {
				Ok(plugin) => {
					if let Err(source) = plugin.before_stop(resource.handle.as_mut()) {
						tracing::warn!(kind, error = %source, "on_stop hook failed");
						errors.push(kind, LifecycleStage::OnStop, source);
					}
				}
				Err(e) => {
					tracing::warn!(kind, error = %e, "plugin unavailable during teardown");
					errors.push(kind, LifecycleStage::Resolve, Box::new(e));
				}
			}

			match resource.handle.stop(self.settings.stop) {
				Ok(()) => tracing::info!(kind, "resource stopped"),
				Err(source) => {
					tracing::warn!(kind, error = %source, "resource stop failed");
					errors.push(kind, LifecycleStage::Stop, source);
				}
			}
		}

		if errors.is_empty() {
			Ok(())
		} else {
			Err(ContainerError::Teardown(errors))
		}
	}

	fn find(&self, kind: &str) -> Option<&RunningResource> {
		self.running.iter().find(|r| r.kind == kind)
	}
}

impl Default for ContainerManager {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for ContainerManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ContainerManager")
			.field("running", &self.running_kinds())
			.field("settings", &self.settings)
			.finish()
	}
}

impl Drop for ContainerManager {
	fn drop(&mut self) {
		if self.running.is_empty() {
			return;
		}
		tracing::warn!(
			kinds = ?self.running_kinds(),
			"container manager dropped with running resources; tearing down"
		);
		if let Err(e) = self.stop_all() {
			tracing::error!(error = %e, "teardown on drop failed");
		}
	}
}

/// Downcast a type-erased client, naming `kind` on mismatch.
pub fn downcast_client<C>(kind: &str, client: Client) -> ContainerResult<Arc<C>>
where
	C: Any + Send + Sync,
{
	client
		.downcast::<C>()
		.map_err(|_| ContainerError::ClientType {
			kind: kind.to_string(),
			expected: std::any::type_name::<C>(),
		})
}
