//! Scenario context
//!
//! Any world type can carry a container manager by implementing
//! [`ContainerWorld`]. [`ScenarioContext`] is a ready-made world with a
//! manager slot and a typed attribute map for values shared between steps.

use gherkin_containers_core::{ContainerError, ContainerManager, ContainerResult, PluginRegistry};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A world that can hold the container manager of the running scenario.
///
/// # Examples
///
/// ```rust
/// use gherkin_containers_core::ContainerManager;
/// use gherkin_containers_scenario::ContainerWorld;
///
/// #[derive(Default)]
/// struct ShopWorld {
/// 	basket: Vec<String>,
/// 	containers: Option<ContainerManager>,
/// }
///
/// impl ContainerWorld for ShopWorld {
/// 	fn containers_slot(&mut self) -> &mut Option<ContainerManager> {
/// 		&mut self.containers
/// 	}
/// }
///
/// let mut world = ShopWorld::default();
/// assert!(world.containers().is_err());
/// ```
pub trait ContainerWorld {
	fn containers_slot(&mut self) -> &mut Option<ContainerManager>;

	/// The attached manager, or [`ContainerError::NoActiveScenario`].
	fn containers(&mut self) -> ContainerResult<&mut ContainerManager> {
		self.containers_slot()
			.as_mut()
			.ok_or(ContainerError::NoActiveScenario)
	}

	fn has_containers(&mut self) -> bool {
		self.containers_slot().is_some()
	}

	/// Called by the lifecycle hooks before each scenario.
	fn set_scenario_name(&mut self, name: &str) {
		let _ = name;
	}
}

/// Default world passed to step functions.
#[derive(Default)]
pub struct ScenarioContext {
	name: Option<String>,
	containers: Option<ContainerManager>,
	attributes: HashMap<String, Box<dyn Any + Send>>,
}

impl ScenarioContext {
	/// Context without a manager; hooks attach one.
	pub fn new() -> Self {
		Self::default()
	}

	/// Context with a manager on the given registry already attached.
	pub fn with_registry(registry: Arc<PluginRegistry>) -> Self {
		Self {
			containers: Some(ContainerManager::with_registry(registry)),
			..Self::default()
		}
	}

	/// Name of the running scenario, set by the hooks.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn set_name(&mut self, name: impl Into<String>) {
		self.name = Some(name.into());
	}

	/// Store a value under `key`, returning the previous one if it had type `T`.
	pub fn insert<T: Any + Send>(&mut self, key: impl Into<String>, value: T) -> Option<T> {
		self.attributes
			.insert(key.into(), Box::new(value))
			.and_then(|previous| previous.downcast::<T>().ok())
			.map(|previous| *previous)
	}

	pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
		self.attributes.get(key)?.downcast_ref::<T>()
	}

	pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
		self.attributes.get_mut(key)?.downcast_mut::<T>()
	}

	/// Remove the value under `key`. A value of another type is left in place.
	pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
		if !self.attributes.get(key)?.is::<T>() {
			return None;
		}
		self.attributes
			.remove(key)
			.and_then(|value| value.downcast::<T>().ok())
			.map(|value| *value)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.attributes.contains_key(key)
	}

	/// Drop every attribute, e.g. between scenarios sharing one context.
	pub fn clear_attributes(&mut self) {
		self.attributes.clear();
	}
}

impl ContainerWorld for ScenarioContext {
	fn containers_slot(&mut self) -> &mut Option<ContainerManager> {
		&mut self.containers
	}

	fn set_scenario_name(&mut self, name: &str) {
		self.set_name(name);
	}
}

impl std::fmt::Debug for ScenarioContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ScenarioContext")
			.field("name", &self.name)
			.field("containers", &self.containers)
			.field("attributes", &self.attributes.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_attributes_are_typed() {
		let mut ctx = ScenarioContext::new();
		assert_eq!(ctx.insert("count", 1u32), None);
		assert_eq!(ctx.insert("count", 2u32), Some(1));

		assert_eq!(ctx.get::<u32>("count"), Some(&2));
		assert_eq!(ctx.get::<String>("count"), None);

		*ctx.get_mut::<u32>("count").unwrap() += 1;
		assert_eq!(ctx.remove::<String>("count"), None);
		assert!(ctx.contains("count"));
		assert_eq!(ctx.remove::<u32>("count"), Some(3));
		assert!(!ctx.contains("count"));
	}

	#[rstest]
	fn test_containers_requires_attached_manager() {
		let mut ctx = ScenarioContext::new();
		assert!(matches!(
			ctx.containers(),
			Err(ContainerError::NoActiveScenario)
		));

		let mut ctx = ScenarioContext::with_registry(Arc::new(PluginRegistry::without_discovery()));
		assert!(ctx.has_containers());
		assert!(ctx.containers().unwrap().is_empty());
	}
}
