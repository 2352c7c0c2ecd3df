//! Lifecycle manager tests
//!
//! These tests verify that:
//! 1. Each kind gets its own cached resource and client
//! 2. Repeated requests reuse the cached client, whatever the options
//! 3. Teardown runs newest first, survives failures and always empties the cache
//! 4. A failed start caches nothing and names the failing stage

use gherkin_containers_core::testing::{FakeClient, FakeHandle, FakePlugin, FakeProbe};
use gherkin_containers_core::{
	ContainerError, ContainerManager, ContainerOptions, ContainerSettings, LifecycleStage,
	PluginRegistry,
};
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn probe() -> FakeProbe {
	FakeProbe::new()
}

fn registry_with(probe: &FakeProbe, kinds: &[&str]) -> Arc<PluginRegistry> {
	let registry = Arc::new(PluginRegistry::without_discovery());
	for kind in kinds {
		registry
			.register_with(kind, FakePlugin::factory(kind, probe))
			.unwrap();
	}
	registry
}

fn manager_with(probe: &FakeProbe, kinds: &[&str]) -> ContainerManager {
	ContainerManager::with_registry(registry_with(probe, kinds))
		.with_settings(ContainerSettings::default())
}

#[rstest]
fn test_each_kind_gets_its_own_entry(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["alpha", "beta"]);

	let alpha = manager
		.client::<FakeClient>("alpha", &ContainerOptions::new())
		.unwrap();
	let beta = manager
		.client::<FakeClient>("beta", &ContainerOptions::new())
		.unwrap();

	assert_eq!(alpha.kind, "alpha");
	assert_eq!(beta.kind, "beta");
	assert_ne!(alpha.instance, beta.instance);
	assert_eq!(manager.running_kinds(), vec!["alpha", "beta"]);
	assert!(manager.is_running("alpha"));
	assert!(!manager.is_running("gamma"));
}

#[rstest]
fn test_get_client_is_idempotent_and_ignores_new_options(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["widget"]);

	let first = manager
		.get_client("widget", &ContainerOptions::new().with("size", 1))
		.unwrap();
	let second = manager
		.get_client("widget", &ContainerOptions::new().with("size", 2))
		.unwrap();

	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(probe.call_count("widget", LifecycleStage::Create), 1);

	let client = first.downcast::<FakeClient>().unwrap();
	assert_eq!(client.options.get_u64("size"), Some(1));
}

#[rstest]
fn test_start_returns_cached_client(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["widget"]);

	let started = manager
		.start_as::<FakeClient>("widget", &ContainerOptions::new())
		.unwrap();
	let again = manager
		.client::<FakeClient>("widget", &ContainerOptions::new())
		.unwrap();

	assert!(Arc::ptr_eq(&started, &again));
	assert_eq!(manager.len(), 1);
}

#[rstest]
fn test_stop_all_on_empty_manager_is_noop(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["widget"]);

	manager.stop_all().unwrap();
	manager.stop_all().unwrap();

	assert!(manager.is_empty());
	assert!(probe.calls().is_empty());
}

#[rstest]
fn test_fresh_resource_after_stop_all(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["widget"]);

	let before = manager
		.client::<FakeClient>("widget", &ContainerOptions::new())
		.unwrap();
	manager.stop_all().unwrap();
	assert!(!manager.is_running("widget"));

	let after = manager
		.client::<FakeClient>("widget", &ContainerOptions::new())
		.unwrap();

	assert_ne!(before.instance, after.instance);
	assert_eq!(probe.call_count("widget", LifecycleStage::Create), 2);
}

#[rstest]
fn test_unknown_kind_error_names_kind(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["widget"]);

	let err = manager
		.get_client("no_such_plugin", &ContainerOptions::new())
		.err()
		.unwrap();

	match &err {
		ContainerError::PluginNotFound {
			name, available, ..
		} => {
			assert_eq!(name, "no_such_plugin");
			assert_eq!(available, &vec!["widget".to_string()]);
		}
		other => panic!("expected PluginNotFound, got {:?}", other),
	}
	assert!(err.to_string().contains("no_such_plugin"));
	assert!(manager.is_empty());
}

#[rstest]
fn test_teardown_runs_hooks_then_stop_newest_first(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["first", "second"]);
	manager.get_client("first", &ContainerOptions::new()).unwrap();
	manager.get_client("second", &ContainerOptions::new()).unwrap();
	probe.reset();

	manager.stop_all().unwrap();

	assert_eq!(
		probe.sequence(),
		vec![
			("second".to_string(), LifecycleStage::OnStop),
			("second".to_string(), LifecycleStage::Stop),
			("first".to_string(), LifecycleStage::OnStop),
			("first".to_string(), LifecycleStage::Stop),
		]
	);
}

#[rstest]
fn test_teardown_continues_past_failures_and_aggregates(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["a", "b", "c"]);
	for kind in ["a", "b", "c"] {
		manager.get_client(kind, &ContainerOptions::new()).unwrap();
	}
	probe.fail_at("a", LifecycleStage::Stop);
	probe.fail_at("b", LifecycleStage::OnStop);

	let err = manager.stop_all().err().unwrap();

	let ContainerError::Teardown(errors) = err else {
		panic!("expected Teardown error");
	};
	assert_eq!(errors.len(), 2);
	assert_eq!(errors.kinds(), vec!["b", "a"]);
	assert_eq!(errors.failures()[0].stage, LifecycleStage::OnStop);
	assert_eq!(errors.failures()[1].stage, LifecycleStage::Stop);

	// b's handle is still stopped after its hook failed
	assert_eq!(probe.call_count("b", LifecycleStage::Stop), 1);
	assert_eq!(probe.call_count("c", LifecycleStage::Stop), 1);
	assert!(manager.is_empty());
}

#[rstest]
fn test_cache_is_cleared_after_failed_teardown(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["widget"]);
	manager.get_client("widget", &ContainerOptions::new()).unwrap();
	probe.fail_at("widget", LifecycleStage::Stop);

	assert!(manager.stop_all().is_err());
	assert!(manager.is_empty());

	// nothing left to fail on
	manager.stop_all().unwrap();
}

#[rstest]
#[case(LifecycleStage::Create)]
#[case(LifecycleStage::Start)]
#[case(LifecycleStage::OnStart)]
#[case(LifecycleStage::GetClient)]
fn test_failed_start_is_not_cached(probe: FakeProbe, #[case] stage: LifecycleStage) {
	let mut manager = manager_with(&probe, &["flaky"]);
	probe.fail_at("flaky", stage);

	let err = manager
		.get_client("flaky", &ContainerOptions::new())
		.err()
		.unwrap();

	assert_eq!(err.stage(), Some(stage));
	assert!(err.to_string().contains("'flaky'"));
	assert!(err.to_string().contains("injected failure"));
	assert!(!manager.is_running("flaky"));

	probe.clear_failures();
	manager.get_client("flaky", &ContainerOptions::new()).unwrap();
	assert!(manager.is_running("flaky"));
	assert_eq!(probe.call_count("flaky", LifecycleStage::Create), 2);
}

#[rstest]
fn test_client_type_mismatch(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["widget"]);

	let err = manager
		.client::<String>("widget", &ContainerOptions::new())
		.err()
		.unwrap();

	assert!(matches!(err, ContainerError::ClientType { ref kind, .. } if kind == "widget"));
	// the resource itself started fine and stays cached
	assert!(manager.is_running("widget"));
}

#[rstest]
fn test_handle_accessor_downcasts_running_handle(probe: FakeProbe) {
	let mut manager = manager_with(&probe, &["widget"]);
	manager
		.get_client("widget", &ContainerOptions::new().with("colour", "blue"))
		.unwrap();

	let handle = manager.handle::<FakeHandle>("widget").unwrap();
	assert!(handle.started);
	assert_eq!(handle.options.get_str("colour"), Some("blue"));
	assert!(manager.handle::<String>("widget").is_none());
	assert!(manager.handle::<FakeHandle>("other").is_none());
}

#[rstest]
fn test_drop_tears_down_remaining_resources(probe: FakeProbe) {
	{
		let mut manager = manager_with(&probe, &["widget"]);
		manager.get_client("widget", &ContainerOptions::new()).unwrap();
	}

	assert_eq!(probe.call_count("widget", LifecycleStage::OnStop), 1);
	assert_eq!(probe.call_count("widget", LifecycleStage::Stop), 1);
}

#[rstest]
fn test_teardown_uses_fresh_plugin_resolution(probe: FakeProbe) {
	let registry = registry_with(&probe, &["widget"]);
	let mut manager = ContainerManager::with_registry(Arc::clone(&registry));
	manager.get_client("widget", &ContainerOptions::new()).unwrap();

	registry.reset();
	let err = manager.stop_all().err().unwrap();

	let ContainerError::Teardown(errors) = err else {
		panic!("expected Teardown error");
	};
	assert_eq!(errors.failures()[0].stage, LifecycleStage::Resolve);
	// the handle is still stopped without its plugin
	assert_eq!(probe.call_count("widget", LifecycleStage::Stop), 1);
}
