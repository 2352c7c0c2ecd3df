//! Client injection used by `#[use_container]`.

use crate::context::ContainerWorld;
use gherkin_containers_core::{ContainerOptions, ContainerResult};
use std::any::Any;
use std::sync::Arc;

/// Client of `kind` from the world's manager, starting it on first use.
///
/// Fails with `NoActiveScenario` when no manager is attached and with
/// `ClientType` when the running client is not a `C`.
///
/// # Examples
///
/// ```rust
/// use gherkin_containers_core::testing::{FakeClient, FakePlugin, FakeProbe};
/// use gherkin_containers_core::{ContainerOptions, PluginRegistry};
/// use gherkin_containers_scenario::{ScenarioContext, inject_client};
/// use std::sync::Arc;
///
/// let registry = Arc::new(PluginRegistry::without_discovery());
/// registry
/// 	.register_with("widget", FakePlugin::factory("widget", &FakeProbe::new()))
/// 	.unwrap();
/// let mut ctx = ScenarioContext::with_registry(registry);
///
/// let client: Arc<FakeClient> = inject_client(&mut ctx, "widget", &ContainerOptions::new()).unwrap();
/// assert_eq!(client.kind, "widget");
/// ```
pub fn inject_client<W, C>(world: &mut W, kind: &str, options: &ContainerOptions) -> ContainerResult<Arc<C>>
where
	W: ContainerWorld + ?Sized,
	C: Any + Send + Sync,
{
	tracing::debug!(kind, client_type = std::any::type_name::<C>(), "injecting client");
	world.containers()?.client::<C>(kind, options)
}
