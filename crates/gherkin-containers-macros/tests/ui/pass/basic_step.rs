use gherkin_containers::scenario::{Scenario, ScenarioContext, ScenarioHooks, setup_hooks_with};
use gherkin_containers::{
	BoxError, ContainerOptions, ContainerPlugin, PluginRegistry, ResourceHandle, StopOptions,
	use_container,
};
use std::sync::Arc;

struct Counter {
	start: u64,
	running: bool,
}

impl ResourceHandle for Counter {
	fn start(&mut self) -> Result<(), BoxError> {
		self.running = true;
		Ok(())
	}

	fn stop(&mut self, _options: StopOptions) -> Result<(), BoxError> {
		self.running = false;
		Ok(())
	}
}

#[derive(Default)]
struct CounterPlugin;

impl ContainerPlugin for CounterPlugin {
	type Handle = Counter;
	type Client = u64;

	fn name(&self) -> &str {
		"counter"
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<Counter, BoxError> {
		Ok(Counter {
			start: options.get_u64("start").unwrap_or(0),
			running: false,
		})
	}

	fn get_client(&self, handle: &Counter) -> Result<u64, BoxError> {
		if !handle.running {
			return Err("counter not running".into());
		}
		Ok(handle.start)
	}
}

#[use_container("counter", start = 41)]
fn given_a_counter(ctx: &mut ScenarioContext, counter_client: Arc<u64>) {
	ctx.insert("value", *counter_client + 1);
}

fn main() {
	let registry = Arc::new(PluginRegistry::without_discovery());
	registry.register::<CounterPlugin>("counter").unwrap();

	let mut hooks = ScenarioHooks::new();
	setup_hooks_with(&mut hooks, registry);

	let mut ctx = ScenarioContext::new();
	hooks
		.run(&mut ctx, &Scenario::new("counting"), given_a_counter)
		.into_result()
		.unwrap();
	assert_eq!(ctx.get::<u64>("value"), Some(&42));
}
