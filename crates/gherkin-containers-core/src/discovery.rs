//! Link-time plugin discovery
//!
//! Adapter crates advertise their plugins with [`submit_plugin!`], which
//! submits a [`PluginRegistration`] to the `inventory` collection of the
//! well-known [`PLUGIN_GROUP`]. The registry enumerates that collection the
//! first time a lookup needs it.
//!
//! A registration only carries a name and a loader function pointer: the
//! plugin itself is not constructed until a scenario actually asks for it.
//!
//! # Example
//!
//! ```rust,ignore
//! use gherkin_containers_core::submit_plugin;
//!
//! submit_plugin!("redis", RedisPlugin);
//!
//! // expands to:
//! // inventory::submit! {
//! //     PluginRegistration::new("redis", load::<RedisPlugin>)
//! // }
//! ```

use crate::plugin::{ContainerPlugin, DynContainerPlugin};
use crate::registry::PluginFactory;
use std::sync::Arc;

/// Identifier of the registration group enumerated by discovery.
pub const PLUGIN_GROUP: &str = "gherkin_containers.plugins";

/// Deferred constructor for a discovered plugin.
pub type PluginLoader = fn() -> Box<dyn DynContainerPlugin>;

/// A plugin advertised at link time.
pub struct PluginRegistration {
	/// Resource kind name the plugin is registered under
	pub name: &'static str,
	/// Constructor, only called on lookup
	pub loader: PluginLoader,
}

impl PluginRegistration {
	pub const fn new(name: &'static str, loader: PluginLoader) -> Self {
		Self { name, loader }
	}
}

inventory::collect!(PluginRegistration);

/// Loader used by [`submit_plugin!`].
pub fn load<P: ContainerPlugin + Default>() -> Box<dyn DynContainerPlugin> {
	Box::new(P::default())
}

/// Advertise a plugin type under a kind name for discovery.
#[macro_export]
macro_rules! submit_plugin {
	($name:expr, $plugin:ty) => {
		$crate::inventory::submit! {
			$crate::discovery::PluginRegistration::new($name, $crate::discovery::load::<$plugin>)
		}
	};
}

/// One entry produced by a [`DiscoverySource`].
#[derive(Clone)]
pub struct DiscoveredPlugin {
	pub name: String,
	pub factory: PluginFactory,
}

impl DiscoveredPlugin {
	pub fn new(name: impl Into<String>, factory: PluginFactory) -> Self {
		Self {
			name: name.into(),
			factory,
		}
	}

	/// Entry backed by a loader function pointer.
	pub fn from_loader(name: impl Into<String>, loader: PluginLoader) -> Self {
		Self::new(name, Arc::new(loader))
	}
}

impl std::fmt::Debug for DiscoveredPlugin {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DiscoveredPlugin")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Where a registry looks for plugins it was not explicitly given.
pub trait DiscoverySource: Send + Sync {
	fn group(&self) -> &str {
		PLUGIN_GROUP
	}

	fn entries(&self) -> Vec<DiscoveredPlugin>;
}

/// Enumerates every [`PluginRegistration`] linked into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventorySource;

impl DiscoverySource for InventorySource {
	fn entries(&self) -> Vec<DiscoveredPlugin> {
		inventory::iter::<PluginRegistration>
			.into_iter()
			.map(|registration| DiscoveredPlugin::from_loader(registration.name, registration.loader))
			.collect()
	}
}

/// A fixed list of entries, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
	entries: Vec<DiscoveredPlugin>,
}

impl StaticSource {
	pub fn new(entries: Vec<DiscoveredPlugin>) -> Self {
		Self { entries }
	}
}

impl DiscoverySource for StaticSource {
	fn entries(&self) -> Vec<DiscoveredPlugin> {
		self.entries.clone()
	}
}
