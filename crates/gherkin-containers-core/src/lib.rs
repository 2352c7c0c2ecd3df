//! # gherkin-containers-core
//!
//! Plugin contract, plugin registry and per-scenario lifecycle manager.
//!
//! A test step asks a [`ContainerManager`] for a client of some resource kind
//! (`"postgres"`, `"kafka"`, ...). The manager looks the kind up in a
//! [`PluginRegistry`], lets the plugin create and start a resource, caches the
//! resulting client for the rest of the scenario and stops everything in
//! [`ContainerManager::stop_all`].
//!
//! ## Features
//!
//! - `testing`: [`testing::FakePlugin`] and friends for exercising the
//!   lifecycle without Docker.

pub mod discovery;
pub mod error;
pub mod manager;
pub mod options;
pub mod plugin;
pub mod registry;
pub mod settings;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use discovery::{
	DiscoveredPlugin, DiscoverySource, InventorySource, PLUGIN_GROUP, PluginRegistration,
	StaticSource,
};
pub use error::{
	BoxError, ContainerError, ContainerResult, LifecycleStage, TeardownErrors, TeardownFailure,
};
pub use manager::{ContainerManager, downcast_client};
pub use options::ContainerOptions;
pub use plugin::{AnyHandle, Client, ContainerPlugin, DynContainerPlugin, ResourceHandle};
pub use registry::{PluginFactory, PluginRegistry};
pub use settings::{ContainerSettings, StopOptions};

// Used by `submit_plugin!`.
#[doc(hidden)]
pub use inventory;
