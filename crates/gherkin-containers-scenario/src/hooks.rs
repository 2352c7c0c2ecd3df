//! Before/after scenario hooks
//!
//! [`ScenarioHooks`] is a small hook runner for Gherkin-style suites:
//! `before_scenario` hooks prepare the world, the scenario body runs,
//! `after_scenario` hooks clean up. [`setup_hooks`] installs the
//! pair that attaches a fresh [`ContainerManager`] to every scenario and
//! stops everything it started.
//!
//! ## Failure handling
//!
//! - A failing before hook skips the remaining before hooks and the body, but
//!   the after hooks still run.
//! - A panicking body is caught, the after hooks run, then the panic resumes.
//! - After-hook failures are reported in [`ScenarioReport::teardown`], apart
//!   from the body's own outcome.

use crate::context::ContainerWorld;
use gherkin_containers_core::{BoxError, ContainerManager, PluginRegistry};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::Arc;

/// Hook called with the world and the scenario it runs for.
pub type Hook<W> = Box<dyn Fn(&mut W, &Scenario) -> Result<(), BoxError> + Send + Sync>;

/// Identity of a scenario as seen by hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
	pub name: String,
	pub tags: Vec<String>,
}

impl Scenario {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			tags: Vec::new(),
		}
	}

	pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
		self.tags.push(tag.into());
		self
	}

	pub fn has_tag(&self, tag: &str) -> bool {
		self.tags.iter().any(|t| t == tag)
	}
}

/// Errors surfaced by [`ScenarioReport::into_result`].
///
/// A teardown failure keeps whatever the body returned in `output`, so a
/// failed assertion is still visible next to the cleanup problem.
#[derive(Debug)]
pub enum ScenarioError<R = ()> {
	Setup {
		scenario: String,
		source: BoxError,
	},
	Teardown {
		scenario: String,
		failures: Vec<BoxError>,
		output: Option<R>,
	},
}

impl<R> ScenarioError<R> {
	pub fn scenario(&self) -> &str {
		match self {
			Self::Setup { scenario, .. } | Self::Teardown { scenario, .. } => scenario,
		}
	}

	/// Body output carried by a teardown failure.
	pub fn into_output(self) -> Option<R> {
		match self {
			Self::Setup { .. } => None,
			Self::Teardown { output, .. } => output,
		}
	}
}

impl<R: fmt::Debug> fmt::Display for ScenarioError<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Setup { scenario, source } => {
				write!(f, "Setup of scenario '{}' failed: {}", scenario, source)
			}
			Self::Teardown {
				scenario,
				failures,
				output,
			} => {
				write!(
					f,
					"Teardown of scenario '{}' failed: {}",
					scenario,
					join_errors(failures)
				)?;
				if let Some(output) = output {
					write!(f, "; scenario body returned {:?}", output)?;
				}
				Ok(())
			}
		}
	}
}

impl<R: fmt::Debug> std::error::Error for ScenarioError<R> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Setup { source, .. } => Some(source.as_ref()),
			Self::Teardown { failures, .. } => failures
				.first()
				.map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
		}
	}
}

fn join_errors(errors: &[BoxError]) -> String {
	errors
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}

/// Result of one [`ScenarioHooks::run`].
#[derive(Debug)]
pub struct ScenarioReport<R> {
	pub scenario: String,
	/// First before-hook failure; the body did not run when set
	pub setup: Option<BoxError>,
	/// Value returned by the body
	pub output: Option<R>,
	/// Every after-hook failure, in hook order
	pub teardown: Vec<BoxError>,
}

impl<R> ScenarioReport<R> {
	/// Setup succeeded and teardown reported nothing.
	pub fn is_clean(&self) -> bool {
		self.setup.is_none() && self.teardown.is_empty()
	}

	/// The body output, unless setup or teardown failed.
	///
	/// A setup failure wins over teardown failures. A teardown failure still
	/// carries the body output.
	pub fn into_result(self) -> Result<R, ScenarioError<R>> {
		if let Some(source) = self.setup {
			return Err(ScenarioError::Setup {
				scenario: self.scenario,
				source,
			});
		}
		if !self.teardown.is_empty() {
			return Err(ScenarioError::Teardown {
				scenario: self.scenario,
				failures: self.teardown,
				output: self.output,
			});
		}
		match self.output {
			Some(output) => Ok(output),
			None => Err(ScenarioError::Setup {
				scenario: self.scenario,
				source: "scenario body did not run".into(),
			}),
		}
	}
}

/// Ordered before/after scenario hooks for worlds of type `W`.
pub struct ScenarioHooks<W> {
	before: Vec<Hook<W>>,
	after: Vec<Hook<W>>,
}

impl<W> Default for ScenarioHooks<W> {
	fn default() -> Self {
		Self {
			before: Vec::new(),
			after: Vec::new(),
		}
	}
}

impl<W> ScenarioHooks<W> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Run `hook` before every scenario, after the hooks added earlier.
	pub fn before_scenario<F>(&mut self, hook: F) -> &mut Self
	where
		F: Fn(&mut W, &Scenario) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.before.push(Box::new(hook));
		self
	}

	/// Run `hook` after every scenario, before the hooks added earlier.
	pub fn after_scenario<F>(&mut self, hook: F) -> &mut Self
	where
		F: Fn(&mut W, &Scenario) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.after.push(Box::new(hook));
		self
	}

	/// Run one scenario: before hooks, `body`, after hooks.
	///
	/// # Panics
	///
	/// Re-raises a panic from `body` once the after hooks have run.
	pub fn run<R>(
		&self,
		world: &mut W,
		scenario: &Scenario,
		body: impl FnOnce(&mut W) -> R,
	) -> ScenarioReport<R> {
		let span = tracing::info_span!("scenario", name = %scenario.name);
		let _entered = span.enter();

		let mut report = ScenarioReport {
			scenario: scenario.name.clone(),
			setup: None,
			output: None,
			teardown: Vec::new(),
		};

		for hook in &self.before {
			if let Err(e) = hook(world, scenario) {
				tracing::warn!(error = %e, "before_scenario hook failed; skipping scenario body");
				report.setup = Some(e);
				break;
			}
		}

		let mut panic = None;
		if report.setup.is_none() {
			match catch_unwind(AssertUnwindSafe(|| body(&mut *world))) {
				Ok(output) => report.output = Some(output),
				Err(payload) => panic = Some(payload),
			}
		}

		for hook in self.after.iter().rev() {
			if let Err(e) = hook(world, scenario) {
				tracing::warn!(error = %e, "after_scenario hook failed");
				report.teardown.push(e);
			}
		}

		if let Some(payload) = panic {
			if !report.teardown.is_empty() {
				tracing::error!(
					failures = %join_errors(&report.teardown),
					"teardown failed for a panicking scenario"
				);
			}
			resume_unwind(payload);
		}

		report
	}
}

/// Install the container lifecycle hooks backed by the global registry.
///
/// # Examples
///
/// ```rust
/// use gherkin_containers_scenario::{Scenario, ScenarioContext, ScenarioHooks, setup_hooks};
///
/// let mut hooks = ScenarioHooks::<ScenarioContext>::new();
/// setup_hooks(&mut hooks);
///
/// let mut ctx = ScenarioContext::new();
/// let report = hooks.run(&mut ctx, &Scenario::new("empty"), |ctx| {
/// 	ctx.name().map(str::to_string)
/// });
/// assert!(report.is_clean());
/// assert_eq!(report.output, Some(Some("empty".to_string())));
/// ```
pub fn setup_hooks<W: ContainerWorld + 'static>(hooks: &mut ScenarioHooks<W>) {
	install(hooks, PluginRegistry::global);
}

/// [`setup_hooks`] with a specific registry.
pub fn setup_hooks_with<W: ContainerWorld + 'static>(
	hooks: &mut ScenarioHooks<W>,
	registry: Arc<PluginRegistry>,
) {
	install(hooks, move || Arc::clone(&registry));
}

fn install<W, F>(hooks: &mut ScenarioHooks<W>, registry: F)
where
	W: ContainerWorld + 'static,
	F: Fn() -> Arc<PluginRegistry> + Send + Sync + 'static,
{
	hooks.before_scenario(move |world, scenario| {
		world.set_scenario_name(&scenario.name);
		let stale = world
			.containers_slot()
			.replace(ContainerManager::with_registry(registry()));
		if let Some(mut stale) = stale {
			tracing::warn!(
				kinds = ?stale.running_kinds(),
				"replacing container manager left over from a previous scenario"
			);
			// a stale failure belongs to the earlier scenario; do not block this one
			if let Err(e) = stale.stop_all() {
				tracing::warn!(error = %e, "failed to stop resources of a previous scenario");
			}
		}
		tracing::debug!(scenario = %scenario.name, "container manager attached");
		Ok(())
	});

	hooks.after_scenario(|world, scenario| {
		let Some(mut manager) = world.containers_slot().take() else {
			return Ok(());
		};
		tracing::debug!(
			scenario = %scenario.name,
			kinds = ?manager.running_kinds(),
			"stopping scenario resources"
		);
		manager.stop_all()?;
		Ok(())
	});
}
