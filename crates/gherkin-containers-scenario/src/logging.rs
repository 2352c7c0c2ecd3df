//! Test logging utilities
//!
//! Provides utilities for initializing logging in test environments.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize logging for tests (call once)
///
/// This function ensures that logging is initialized only once across all tests.
/// It installs a `tracing-subscriber` fmt subscriber writing through the test
/// harness, filtered by `RUST_LOG` (default: `warn`).
///
/// # Examples
///
/// ```
/// use gherkin_containers_scenario::logging::init_test_logging;
///
/// // In your test:
/// init_test_logging();
/// // Your test code
/// ```
pub fn init_test_logging() {
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
		let _ = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_test_writer()
			.try_init();
	});
}
