use gherkin_containers::scenario::ContainerWorld;
use gherkin_containers::{
	BoxError, ContainerError, ContainerManager, ContainerOptions, ContainerPlugin, PluginRegistry,
	ResourceHandle, StopOptions, use_container,
};
use std::sync::Arc;

struct Greeter;

impl ResourceHandle for Greeter {
	fn start(&mut self) -> Result<(), BoxError> {
		Ok(())
	}

	fn stop(&mut self, _options: StopOptions) -> Result<(), BoxError> {
		Ok(())
	}
}

#[derive(Default)]
struct GreeterPlugin;

impl ContainerPlugin for GreeterPlugin {
	type Handle = Greeter;
	type Client = String;

	fn name(&self) -> &str {
		"greeter"
	}

	fn create_container(&self, _options: &ContainerOptions) -> Result<Greeter, BoxError> {
		Ok(Greeter)
	}

	fn get_client(&self, _handle: &Greeter) -> Result<String, BoxError> {
		Ok("hello".to_string())
	}
}

#[derive(Default)]
struct World {
	containers: Option<ContainerManager>,
}

impl ContainerWorld for World {
	fn containers_slot(&mut self) -> &mut Option<ContainerManager> {
		&mut self.containers
	}
}

#[use_container("greeter", r#type = "polite")]
fn greeting(world: &mut World, name: &str, greeter_client: Arc<String>) -> Result<String, ContainerError> {
	let _ = world;
	Ok(format!("{}, {}", greeter_client, name))
}

fn main() {
	let mut world = World::default();
	assert!(matches!(
		greeting(&mut world, "ada"),
		Err(ContainerError::NoActiveScenario)
	));

	let registry = Arc::new(PluginRegistry::without_discovery());
	registry.register::<GreeterPlugin>("greeter").unwrap();
	world.containers = Some(ContainerManager::with_registry(registry));
	assert_eq!(greeting(&mut world, "ada").unwrap(), "hello, ada");
}
