//! Errors raised by the built-in adapters.
//!
//! Adapters return [`AdapterError`] internally and box it across the plugin
//! boundary, so the lifecycle manager keeps it as the `source` of a
//! `ContainerError::Startup` or of a teardown failure.

use gherkin_containers_core::BoxError;

/// Result alias used inside the adapter crate.
pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
	#[cfg(feature = "docker")]
	#[error("Docker error: {0}")]
	Docker(#[from] testcontainers::TestcontainersError),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[cfg(feature = "sqlx")]
	#[error("SQL error: {0}")]
	Sql(#[from] sqlx::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Resource '{0}' has not been started")]
	NotStarted(&'static str),

	#[error("Resource '{0}' was already started")]
	AlreadyStarted(&'static str),

	/// Several cleanup steps of one resource failed
	#[error("Cleanup of '{kind}' failed: {}", .failures.join("; "))]
	Cleanup {
		kind: &'static str,
		failures: Vec<String>,
	},
}

impl AdapterError {
	/// Box for the plugin boundary.
	pub fn boxed(self) -> BoxError {
		Box::new(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_cleanup_lists_every_failure() {
		let err = AdapterError::Cleanup {
			kind: "eventhubs",
			failures: vec!["emulator: gone".to_string(), "azurite: gone".to_string()],
		};
		assert_eq!(
			err.to_string(),
			"Cleanup of 'eventhubs' failed: emulator: gone; azurite: gone"
		);
	}

	#[rstest]
	fn test_boxed_keeps_the_concrete_error() {
		let boxed = AdapterError::NotStarted("sqlite").boxed();
		assert!(matches!(
			boxed.downcast_ref::<AdapterError>(),
			Some(AdapterError::NotStarted("sqlite"))
		));
	}
}
