//! Plugin registry
//!
//! Maps resource kind names to plugin factories. Explicit registrations and
//! discovered plugins live in separate tables; on lookup an explicit
//! registration always wins, and discovery never overwrites one.
//!
//! Discovery is lazy: it runs at most once per registry, the first time a
//! lookup happens (or when [`PluginRegistry::discover`] is called directly).

use crate::discovery::{DiscoverySource, InventorySource};
use crate::error::{ContainerError, ContainerResult};
use crate::plugin::{ContainerPlugin, DynContainerPlugin};
use crate::settings::ContainerSettings;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

/// Builds a fresh plugin instance for every lookup.
pub type PluginFactory = Arc<dyn Fn() -> Box<dyn DynContainerPlugin> + Send + Sync>;

static GLOBAL_REGISTRY: OnceLock<Arc<PluginRegistry>> = OnceLock::new();

#[derive(Default)]
struct RegistryState {
	explicit: HashMap<String, PluginFactory>,
	discovered: HashMap<String, PluginFactory>,
	invalid: Vec<String>,
	discovery_ran: bool,
}

/// Name-to-plugin table shared by every container manager.
pub struct PluginRegistry {
	state: RwLock<RegistryState>,
	source: Box<dyn DiscoverySource>,
	discovery_enabled: bool,
}

impl PluginRegistry {
	/// Registry backed by link-time discovery.
	pub fn new() -> Self {
		Self::with_source(InventorySource)
	}

	/// Registry that discovers plugins from a custom source.
	pub fn with_source(source: impl DiscoverySource + 'static) -> Self {
		Self {
			state: RwLock::new(RegistryState::default()),
			source: Box::new(source),
			discovery_enabled: true,
		}
	}

	/// Registry that only knows explicitly registered plugins.
	pub fn without_discovery() -> Self {
		let mut registry = Self::new();
		registry.discovery_enabled = false;
		registry
	}

	/// Apply [`ContainerSettings::discovery`].
	pub fn with_settings(mut self, settings: &ContainerSettings) -> Self {
		self.discovery_enabled = settings.discovery;
		self
	}

	/// Process-wide registry, configured from the environment on first use.
	pub fn global() -> Arc<PluginRegistry> {
		GLOBAL_REGISTRY
			.get_or_init(|| Arc::new(Self::new().with_settings(&ContainerSettings::from_env())))
			.clone()
	}

	/// Register a plugin type that can be built with `Default`.
	pub fn register<P: ContainerPlugin + Default>(&self, name: &str) -> ContainerResult<()> {
		self.register_with(name, P::default)
	}

	/// Register a plugin built by a closure.
	///
	/// Registering the same name twice replaces the earlier entry. Names must
	/// be identifier-like because `#[use_container]` turns them into a
	/// `{kind}_client` parameter; `my-kafka` is rejected, `my_kafka` is not.
	pub fn register_with<P, F>(&self, name: &str, factory: F) -> ContainerResult<()>
	where
		P: ContainerPlugin,
		F: Fn() -> P + Send + Sync + 'static,
	{
		let factory: PluginFactory =
			Arc::new(move || Box::new(factory()) as Box<dyn DynContainerPlugin>);
		self.register_factory(name, factory)
	}

	/// Register an already type-erased factory.
	pub fn register_factory(&self, name: &str, factory: PluginFactory) -> ContainerResult<()> {
		validate_kind_name(name)?;

		let probe = factory();
		if probe.plugin_name().is_empty() {
			return Err(ContainerError::ContractViolation {
				name: name.to_string(),
				reason: format!("{} reports an empty name", probe.plugin_type()),
			});
		}
		if probe.plugin_name() != name {
			tracing::warn!(
				kind = name,
				plugin_name = probe.plugin_name(),
				plugin_type = probe.plugin_type(),
				"plugin registered under a different name than it reports"
			);
		}

		let replaced = self
			.state
			.write()
			.explicit
			.insert(name.to_string(), factory)
			.is_some();
		tracing::debug!(kind = name, replaced, "plugin registered");
		Ok(())
	}

	/// Remove an explicit registration. Discovered entries are kept.
	pub fn unregister(&self, name: &str) -> bool {
		self.state.write().explicit.remove(name).is_some()
	}

	/// Build a fresh plugin instance for `name`.
	///
	/// Triggers discovery on the first lookup. A miss is always
	/// [`ContainerError::PluginNotFound`]; registrations rejected by discovery
	/// are listed in it.
	pub fn get(&self, name: &str) -> ContainerResult<Box<dyn DynContainerPlugin>> {
		// invalid registrations are kept in the state and reported on a miss
		let _ = self.ensure_discovered();

		let factory = {
			let state = self.state.read();
			state
				.explicit
				.get(name)
				.or_else(|| state.discovered.get(name))
				.cloned()
		};

		match factory {
			Some(factory) => Ok(factory()),
			None => Err(ContainerError::PluginNotFound {
				name: name.to_string(),
				available: self.available(),
				invalid: self.state.read().invalid.clone(),
			}),
		}
	}

	/// Enumerate the discovery source and record every valid entry.
	///
	/// Runs at most once per registry (until [`PluginRegistry::reset`]) and
	/// returns the number of plugins recorded by this call.
	pub fn discover(&self) -> ContainerResult<usize> {
		{
			let mut state = self.state.write();
			if state.discovery_ran {
				return Ok(0);
			}
			state.discovery_ran = true;
		}

		if !self.discovery_enabled {
			tracing::debug!("plugin discovery disabled");
			return Ok(0);
		}

		// Loaders may touch the registry, so enumerate without holding the lock.
		let entries = self.source.entries();

		let mut invalid = Vec::new();
		let mut recorded = 0;
		{
			let mut state = self.state.write();
			for entry in entries {
				if validate_kind_name(&entry.name).is_err() {
					invalid.push(entry.name);
					continue;
				}
				if state.discovered.insert(entry.name.clone(), entry.factory).is_some() {
					tracing::warn!(kind = %entry.name, "plugin discovered more than once; last one wins");
				}
				recorded += 1;
			}
			state.invalid = invalid.clone();
		}

		tracing::info!(group = self.source.group(), recorded, "plugin discovery finished");

		if invalid.is_empty() {
			Ok(recorded)
		} else {
			tracing::warn!(?invalid, "ignoring invalid plugin registrations");
			Err(ContainerError::Discovery { invalid })
		}
	}

	fn ensure_discovered(&self) -> ContainerResult<()> {
		if self.state.read().discovery_ran {
			return Ok(());
		}
		self.discover().map(|_| ())
	}

	pub fn is_discovered(&self) -> bool {
		self.state.read().discovery_ran
	}

	/// Sorted names of every known plugin. Does not trigger discovery.
	pub fn available(&self) -> Vec<String> {
		let state = self.state.read();
		state
			.explicit
			.keys()
			.chain(state.discovered.keys())
			.cloned()
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect()
	}

	/// Whether `name` is known right now. Does not trigger discovery.
	pub fn contains(&self, name: &str) -> bool {
		let state = self.state.read();
		state.explicit.contains_key(name) || state.discovered.contains_key(name)
	}

	/// Forget every registration and allow discovery to run again.
	pub fn reset(&self) {
		let mut state = self.state.write();
		state.explicit.clear();
		state.discovered.clear();
		state.invalid.clear();
		state.discovery_ran = false;
	}
}

impl Default for PluginRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for PluginRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.read();
		f.debug_struct("PluginRegistry")
			.field("explicit", &state.explicit.keys().collect::<Vec<_>>())
			.field("discovered", &state.discovered.keys().collect::<Vec<_>>())
			.field("discovery_ran", &state.discovery_ran)
			.field("discovery_enabled", &self.discovery_enabled)
			.finish()
	}
}

/// Kind names are identifier-like: ASCII letters, digits and `_`, not
/// starting with a digit.
fn validate_kind_name(name: &str) -> ContainerResult<()> {
	let reason = if name.is_empty() {
		Some("name is empty")
	} else if name.starts_with(|c: char| c.is_ascii_digit()) {
		Some("name starts with a digit")
	} else if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		Some("name may only contain ASCII letters, digits and '_'")
	} else {
		None
	};

	match reason {
		Some(reason) => Err(ContainerError::ContractViolation {
			name: name.to_string(),
			reason: reason.to_string(),
		}),
		None => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("postgres", true)]
	#[case("google_pubsub", true)]
	#[case("", false)]
	#[case("9lives", false)]
	#[case("my-plugin", false)]
	#[case("with space", false)]
	fn test_validate_kind_name(#[case] name: &str, #[case] valid: bool) {
		assert_eq!(validate_kind_name(name).is_ok(), valid);
	}

	#[rstest]
	fn test_global_returns_same_instance() {
		let a = PluginRegistry::global();
		let b = PluginRegistry::global();
		assert!(Arc::ptr_eq(&a, &b));
	}
}
