//! Link-time discovery through `submit_plugin!` and the global registry.

use gherkin_containers_core::{
	BoxError, ContainerManager, ContainerOptions, ContainerPlugin, DiscoverySource,
	InventorySource, PLUGIN_GROUP, PluginRegistry, ResourceHandle, StopOptions, submit_plugin,
};
use rstest::rstest;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

struct Beacon;

impl ResourceHandle for Beacon {
	fn start(&mut self) -> Result<(), BoxError> {
		Ok(())
	}

	fn stop(&mut self, _options: StopOptions) -> Result<(), BoxError> {
		Ok(())
	}
}

struct LinkedPlugin;

impl Default for LinkedPlugin {
	fn default() -> Self {
		CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
		Self
	}
}

impl ContainerPlugin for LinkedPlugin {
	type Handle = Beacon;
	type Client = &'static str;

	fn name(&self) -> &str {
		"linked_widget"
	}

	fn create_container(&self, _options: &ContainerOptions) -> Result<Beacon, BoxError> {
		Ok(Beacon)
	}

	fn get_client(&self, _handle: &Beacon) -> Result<&'static str, BoxError> {
		Ok("beacon")
	}
}

submit_plugin!("linked_widget", LinkedPlugin);

#[rstest]
#[serial(global_registry)]
fn test_inventory_source_lists_submitted_plugins_without_loading_them() {
	let source = InventorySource;
	let before = CONSTRUCTED.load(Ordering::SeqCst);

	let entries = source.entries();

	assert_eq!(source.group(), PLUGIN_GROUP);
	assert_eq!(PLUGIN_GROUP, "gherkin_containers.plugins");
	assert!(entries.iter().any(|entry| entry.name == "linked_widget"));
	assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), before);
}

#[rstest]
#[serial(global_registry)]
fn test_global_registry_discovers_on_first_lookup() {
	let registry = PluginRegistry::global();
	registry.reset();
	assert!(!registry.contains("linked_widget"));

	let plugin = registry.get("linked_widget").unwrap();

	assert_eq!(plugin.plugin_name(), "linked_widget");
	assert!(registry.is_discovered());
	assert!(registry.available().contains(&"linked_widget".to_string()));
	registry.reset();
}

#[rstest]
#[serial(global_registry)]
fn test_default_manager_uses_discovered_plugin() {
	PluginRegistry::global().reset();
	let mut manager = ContainerManager::new();

	let client = manager
		.client::<&'static str>("linked_widget", &ContainerOptions::new())
		.unwrap();

	assert_eq!(*client, "beacon");
	manager.stop_all().unwrap();
	PluginRegistry::global().reset();
}
