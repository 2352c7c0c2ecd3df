//! Call-recording fake plugin for tests.
//!
//! [`FakePlugin`] starts nothing: every lifecycle call is appended to a shared
//! [`FakeProbe`], and any stage can be told to fail for a given kind.
//!
//! # Examples
//!
//! ```rust
//! use gherkin_containers_core::testing::{FakePlugin, FakeProbe};
//! use gherkin_containers_core::{ContainerManager, ContainerOptions, LifecycleStage, PluginRegistry};
//! use std::sync::Arc;
//!
//! let probe = FakeProbe::new();
//! let registry = Arc::new(PluginRegistry::without_discovery());
//! registry
//! 	.register_with("widget", FakePlugin::factory("widget", &probe))
//! 	.unwrap();
//!
//! let mut manager = ContainerManager::with_registry(registry);
//! manager.get_client("widget", &ContainerOptions::new()).unwrap();
//! manager.stop_all().unwrap();
//!
//! assert_eq!(
//! 	probe.stages_for("widget"),
//! 	vec![
//! 		LifecycleStage::Create,
//! 		LifecycleStage::Start,
//! 		LifecycleStage::OnStart,
//! 		LifecycleStage::GetClient,
//! 		LifecycleStage::OnStop,
//! 		LifecycleStage::Stop,
//! 	]
//! );
//! ```

use crate::error::{BoxError, LifecycleStage};
use crate::options::ContainerOptions;
use crate::plugin::{ContainerPlugin, ResourceHandle};
use crate::settings::StopOptions;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// One lifecycle call observed by a [`FakeProbe`].
#[derive(Debug, Clone)]
pub struct CallRecord {
	pub kind: String,
	pub stage: LifecycleStage,
	/// Sequence number of the handle the call concerned
	pub instance: u64,
	pub timestamp: std::time::Instant,
}

#[derive(Default)]
struct ProbeState {
	calls: Mutex<Vec<CallRecord>>,
	failures: Mutex<HashSet<(String, LifecycleStage)>>,
	instances: AtomicU64,
}

/// Shared recorder handed to every [`FakePlugin`] built by one factory.
#[derive(Clone, Default)]
pub struct FakeProbe {
	state: Arc<ProbeState>,
}

impl FakeProbe {
	pub fn new() -> Self {
		Self::default()
	}

	/// Make `stage` fail for `kind` until [`FakeProbe::clear_failures`].
	pub fn fail_at(&self, kind: &str, stage: LifecycleStage) {
		self.state.failures.lock().insert((kind.to_string(), stage));
	}

	pub fn clear_failures(&self) {
		self.state.failures.lock().clear();
	}

	pub fn calls(&self) -> Vec<CallRecord> {
		self.state.calls.lock().clone()
	}

	pub fn calls_for(&self, kind: &str) -> Vec<CallRecord> {
		self.state
			.calls
			.lock()
			.iter()
			.filter(|record| record.kind == kind)
			.cloned()
			.collect()
	}

	/// Stages called for `kind`, in call order.
	pub fn stages_for(&self, kind: &str) -> Vec<LifecycleStage> {
		self.calls_for(kind).into_iter().map(|r| r.stage).collect()
	}

	/// `(kind, stage)` pairs for every call, in call order.
	pub fn sequence(&self) -> Vec<(String, LifecycleStage)> {
		self.state
			.calls
			.lock()
			.iter()
			.map(|r| (r.kind.clone(), r.stage))
			.collect()
	}

	pub fn call_count(&self, kind: &str, stage: LifecycleStage) -> usize {
		self.state
			.calls
			.lock()
			.iter()
			.filter(|r| r.kind == kind && r.stage == stage)
			.count()
	}

	/// Number of handles created so far, across all kinds.
	pub fn instances_created(&self) -> u64 {
		self.state.instances.load(Ordering::SeqCst)
	}

	pub fn reset(&self) {
		self.state.calls.lock().clear();
		self.clear_failures();
	}

	fn next_instance(&self) -> u64 {
		self.state.instances.fetch_add(1, Ordering::SeqCst) + 1
	}

	fn record(&self, kind: &str, stage: LifecycleStage, instance: u64) -> Result<(), BoxError> {
		self.state.calls.lock().push(CallRecord {
			kind: kind.to_string(),
			stage,
			instance,
			timestamp: std::time::Instant::now(),
		});

		if self.state.failures.lock().contains(&(kind.to_string(), stage)) {
			return Err(format!("injected failure: {} '{}'", stage, kind).into());
		}
		Ok(())
	}
}

impl std::fmt::Debug for FakeProbe {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FakeProbe")
			.field("calls", &self.state.calls.lock().len())
			.field("instances", &self.instances_created())
			.finish()
	}
}

/// Handle produced by [`FakePlugin`].
#[derive(Debug)]
pub struct FakeHandle {
	pub kind: String,
	pub instance: u64,
	pub options: ContainerOptions,
	pub started: bool,
	pub stopped_with: Option<StopOptions>,
	probe: FakeProbe,
}

impl ResourceHandle for FakeHandle {
	fn start(&mut self) -> Result<(), BoxError> {
		self.probe.record(&self.kind, LifecycleStage::Start, self.instance)?;
		self.started = true;
		Ok(())
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.probe.record(&self.kind, LifecycleStage::Stop, self.instance)?;
		self.started = false;
		self.stopped_with = Some(options);
		Ok(())
	}
}

/// Client produced by [`FakePlugin`].
#[derive(Debug, Clone, PartialEq)]
pub struct FakeClient {
	pub kind: String,
	pub instance: u64,
	pub options: ContainerOptions,
}

/// Plugin that records calls instead of starting anything.
#[derive(Debug, Clone)]
pub struct FakePlugin {
	name: String,
	probe: FakeProbe,
}

impl FakePlugin {
	pub fn new(name: impl Into<String>, probe: FakeProbe) -> Self {
		Self {
			name: name.into(),
			probe,
		}
	}

	/// Factory for [`PluginRegistry::register_with`] sharing `probe`.
	///
	/// [`PluginRegistry::register_with`]: crate::registry::PluginRegistry::register_with
	pub fn factory(name: &str, probe: &FakeProbe) -> impl Fn() -> FakePlugin + Send + Sync + 'static {
		let name = name.to_string();
		let probe = probe.clone();
		move || FakePlugin::new(name.clone(), probe.clone())
	}

	pub fn probe(&self) -> &FakeProbe {
		&self.probe
	}
}

impl Default for FakePlugin {
	fn default() -> Self {
		Self::new("fake", FakeProbe::new())
	}
}

impl ContainerPlugin for FakePlugin {
	type Handle = FakeHandle;
	type Client = FakeClient;

	fn name(&self) -> &str {
		&self.name
	}

	fn create_container(&self, options: &ContainerOptions) -> Result<FakeHandle, BoxError> {
		let instance = self.probe.next_instance();
		self.probe.record(&self.name, LifecycleStage::Create, instance)?;
		Ok(FakeHandle {
			kind: self.name.clone(),
			instance,
			options: options.clone(),
			started: false,
			stopped_with: None,
			probe: self.probe.clone(),
		})
	}

	fn get_client(&self, handle: &FakeHandle) -> Result<FakeClient, BoxError> {
		self.probe
			.record(&handle.kind, LifecycleStage::GetClient, handle.instance)?;
		if !handle.started {
			return Err(format!("'{}' was not started", handle.kind).into());
		}
		Ok(FakeClient {
			kind: handle.kind.clone(),
			instance: handle.instance,
			options: handle.options.clone(),
		})
	}

	fn on_start(&self, handle: &mut FakeHandle) -> Result<(), BoxError> {
		self.probe
			.record(&handle.kind, LifecycleStage::OnStart, handle.instance)
	}

	fn on_stop(&self, handle: &mut FakeHandle) -> Result<(), BoxError> {
		self.probe
			.record(&handle.kind, LifecycleStage::OnStop, handle.instance)
	}
}
