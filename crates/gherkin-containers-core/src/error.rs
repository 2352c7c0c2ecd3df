//! Error types shared by the registry, the lifecycle manager and adapters.

use std::fmt;

/// Boxed error returned by plugins and resource handles.
///
/// Adapters wrap whatever their backing SDK reports; the manager keeps the
/// box intact as the `source` of a [`ContainerError::Startup`] so callers can
/// downcast to the original error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Step of the resource lifecycle at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
	/// Looking up the plugin in the registry
	Resolve,
	/// `ContainerPlugin::create_container`
	Create,
	/// `ResourceHandle::start`
	Start,
	/// `ContainerPlugin::on_start`
	OnStart,
	/// `ContainerPlugin::get_client`
	GetClient,
	/// `ContainerPlugin::on_stop`
	OnStop,
	/// `ResourceHandle::stop`
	Stop,
}

impl LifecycleStage {
	/// Short verb phrase used in error messages and log fields.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Resolve => "resolve plugin for",
			Self::Create => "create",
			Self::Start => "start",
			Self::OnStart => "run on_start hook for",
			Self::GetClient => "acquire client for",
			Self::OnStop => "run on_stop hook for",
			Self::Stop => "stop",
		}
	}
}

impl fmt::Display for LifecycleStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Errors raised by the plugin registry and the lifecycle manager.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
	#[error("Plugin '{name}' not found. Available: {available:?}{}", invalid_suffix(.invalid))]
	PluginNotFound {
		name: String,
		available: Vec<String>,
		/// Discovered registrations that were rejected, if any
		invalid: Vec<String>,
	},

	#[error("Plugin contract violation for '{name}': {reason}")]
	ContractViolation { name: String, reason: String },

	#[error("Failed to {stage} resource '{kind}': {source}")]
	Startup {
		kind: String,
		stage: LifecycleStage,
		source: BoxError,
	},

	#[error(transparent)]
	Teardown(#[from] TeardownErrors),

	#[error("Plugin discovery found invalid registrations: {invalid:?}")]
	Discovery { invalid: Vec<String> },

	#[error(
		"Resource '{kind}' requires the optional `{dependency}` dependency; enable the `{feature}` feature"
	)]
	MissingDependency {
		kind: String,
		dependency: String,
		feature: String,
	},

	#[error("Client for '{kind}' is not a `{expected}`")]
	ClientType { kind: String, expected: &'static str },

	#[error("Resource handle for '{kind}' is not a `{expected}`")]
	HandleType { kind: String, expected: &'static str },

	#[error("Invalid option '{key}': {reason}")]
	InvalidOption { key: String, reason: String },

	#[error("No container manager is attached to the scenario context")]
	NoActiveScenario,
}

impl ContainerError {
	/// Shorthand for [`ContainerError::MissingDependency`].
	pub fn missing_dependency(kind: &str, dependency: &str, feature: &str) -> Self {
		Self::MissingDependency {
			kind: kind.to_string(),
			dependency: dependency.to_string(),
			feature: feature.to_string(),
		}
	}

	/// Lifecycle stage for startup and teardown failures.
	pub fn stage(&self) -> Option<LifecycleStage> {
		match self {
			Self::Startup { stage, .. } => Some(*stage),
			_ => None,
		}
	}
}

fn invalid_suffix(invalid: &[String]) -> String {
	if invalid.is_empty() {
		String::new()
	} else {
		format!(" (ignored invalid registrations: {:?})", invalid)
	}
}

/// Result alias used throughout the crate.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// A single failure recorded while tearing down one cached resource.
#[derive(Debug)]
pub struct TeardownFailure {
	pub kind: String,
	pub stage: LifecycleStage,
	pub source: BoxError,
}

impl fmt::Display for TeardownFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "failed to {} '{}': {}", self.stage, self.kind, self.source)
	}
}

/// Every failure collected by one `stop_all` call.
///
/// Teardown keeps going after an error, so a single call can report several
/// kinds, and several stages of the same kind.
#[derive(Debug, Default)]
pub struct TeardownErrors {
	failures: Vec<TeardownFailure>,
}

impl TeardownErrors {
	pub(crate) fn push(&mut self, kind: &str, stage: LifecycleStage, source: BoxError) {
		self.failures.push(TeardownFailure {
			kind: kind.to_string(),
			stage,
			source,
		});
	}

	pub fn is_empty(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn len(&self) -> usize {
		self.failures.len()
	}

	pub fn failures(&self) -> &[TeardownFailure] {
		&self.failures
	}

	/// Kinds that failed, in the order they were torn down (deduplicated).
	pub fn kinds(&self) -> Vec<&str> {
		let mut kinds: Vec<&str> = Vec::new();
		for failure in &self.failures {
			if !kinds.contains(&failure.kind.as_str()) {
				kinds.push(&failure.kind);
			}
		}
		kinds
	}
}

impl fmt::Display for TeardownErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} teardown failure(s)", self.failures.len())?;
		for failure in &self.failures {
			write!(f, "; {}", failure)?;
		}
		Ok(())
	}
}

impl std::error::Error for TeardownErrors {}
