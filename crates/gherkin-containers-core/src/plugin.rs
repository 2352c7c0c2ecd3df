//! Plugin contract every resource adapter implements.
//!
//! Adapters implement the typed [`ContainerPlugin`] trait, naming their own
//! handle and client types. The registry and the manager only ever see the
//! object-safe [`DynContainerPlugin`] mirror, which every `ContainerPlugin`
//! gets for free.
//!
//! # Examples
//!
//! ```rust
//! use gherkin_containers_core::{BoxError, ContainerOptions, ContainerPlugin, ResourceHandle, StopOptions};
//!
//! #[derive(Default)]
//! struct ScratchDir {
//! 	path: Option<std::path::PathBuf>,
//! }
//!
//! impl ResourceHandle for ScratchDir {
//! 	fn start(&mut self) -> Result<(), BoxError> {
//! 		self.path = Some(std::env::temp_dir());
//! 		Ok(())
//! 	}
//!
//! 	fn stop(&mut self, _options: StopOptions) -> Result<(), BoxError> {
//! 		self.path = None;
//! 		Ok(())
//! 	}
//! }
//!
//! #[derive(Default)]
//! struct ScratchPlugin;
//!
//! impl ContainerPlugin for ScratchPlugin {
//! 	type Handle = ScratchDir;
//! 	type Client = std::path::PathBuf;
//!
//! 	fn name(&self) -> &str {
//! 		"scratch"
//! 	}
//!
//! 	fn create_container(&self, _options: &ContainerOptions) -> Result<ScratchDir, BoxError> {
//! 		Ok(ScratchDir::default())
//! 	}
//!
//! 	fn get_client(&self, handle: &ScratchDir) -> Result<std::path::PathBuf, BoxError> {
//! 		handle.path.clone().ok_or_else(|| "scratch dir not started".into())
//! 	}
//! }
//! ```
//!
//! Leaving out a required operation is rejected when the plugin is compiled:
//!
//! ```compile_fail
//! use gherkin_containers_core::{BoxError, ContainerOptions, ContainerPlugin, ResourceHandle, StopOptions};
//!
//! struct Handle;
//!
//! impl ResourceHandle for Handle {
//! 	fn start(&mut self) -> Result<(), BoxError> { Ok(()) }
//! 	fn stop(&mut self, _options: StopOptions) -> Result<(), BoxError> { Ok(()) }
//! }
//!
//! struct Incomplete;
//!
//! impl ContainerPlugin for Incomplete {
//! 	type Handle = Handle;
//! 	type Client = ();
//!
//! 	fn name(&self) -> &str { "incomplete" }
//!
//! 	fn create_container(&self, _options: &ContainerOptions) -> Result<Handle, BoxError> {
//! 		Ok(Handle)
//! 	}
//! 	// get_client is missing
//! }
//! ```

use crate::error::{BoxError, ContainerError};
use crate::options::ContainerOptions;
use crate::settings::StopOptions;
use std::any::Any;
use std::sync::Arc;

/// Type-erased client shared between the manager cache and test steps.
pub type Client = Arc<dyn Any + Send + Sync>;

/// A running (or ready to run) instance of a backing service.
///
/// `start` blocks until the service is ready; readiness and timeouts are the
/// handle's own business.
pub trait ResourceHandle: Send + 'static {
	fn start(&mut self) -> Result<(), BoxError>;

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError>;
}

/// Capability set of one resource kind.
///
/// Implementations are stateless factories: the registry builds a fresh
/// instance for every lookup, so nothing may be carried across calls.
pub trait ContainerPlugin: Send + Sync + 'static {
	type Handle: ResourceHandle;
	type Client: Send + Sync + 'static;

	/// Stable identifier of the resource kind, e.g. `"postgres"`.
	fn name(&self) -> &str;

	/// Build and configure a handle. Must not start the resource.
	fn create_container(&self, options: &ContainerOptions) -> Result<Self::Handle, BoxError>;

	/// Open a client against a started handle.
	fn get_client(&self, handle: &Self::Handle) -> Result<Self::Client, BoxError>;

	/// Called once after `start` succeeds.
	fn on_start(&self, handle: &mut Self::Handle) -> Result<(), BoxError> {
		let _ = handle;
		Ok(())
	}

	/// Called once before `stop`.
	fn on_stop(&self, handle: &mut Self::Handle) -> Result<(), BoxError> {
		let _ = handle;
		Ok(())
	}
}

/// Object-safe view of a [`ResourceHandle`] that can be downcast again.
pub trait AnyHandle: ResourceHandle {
	fn as_any(&self) -> &dyn Any;

	fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ResourceHandle> AnyHandle for T {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// Object-safe mirror of [`ContainerPlugin`], used by the registry and the
/// lifecycle manager.
///
/// Method names differ from the typed trait so both can be in scope at once.
pub trait DynContainerPlugin: Send + Sync {
	fn plugin_name(&self) -> &str;

	/// `std::any::type_name` of the concrete plugin.
	fn plugin_type(&self) -> &'static str;

	fn create_resource(&self, options: &ContainerOptions) -> Result<Box<dyn AnyHandle>, BoxError>;

	fn client_for(&self, handle: &dyn AnyHandle) -> Result<Client, BoxError>;

	fn after_start(&self, handle: &mut dyn AnyHandle) -> Result<(), BoxError>;

	fn before_stop(&self, handle: &mut dyn AnyHandle) -> Result<(), BoxError>;
}

impl<P: ContainerPlugin> DynContainerPlugin for P {
	fn plugin_name(&self) -> &str {
		self.name()
	}

	fn plugin_type(&self) -> &'static str {
		std::any::type_name::<P>()
	}

	fn create_resource(&self, options: &ContainerOptions) -> Result<Box<dyn AnyHandle>, BoxError> {
		let handle = self.create_container(options)?;
		Ok(Box::new(handle))
	}

	fn client_for(&self, handle: &dyn AnyHandle) -> Result<Client, BoxError> {
		let handle = handle
			.as_any()
			.downcast_ref::<P::Handle>()
			.ok_or_else(|| handle_type_error::<P>(self.name()))?;
		let client = self.get_client(handle)?;
		Ok(Arc::new(client))
	}

	fn after_start(&self, handle: &mut dyn AnyHandle) -> Result<(), BoxError> {
		let handle = handle
			.as_any_mut()
			.downcast_mut::<P::Handle>()
			.ok_or_else(|| handle_type_error::<P>(self.name()))?;
		self.on_start(handle)
	}

	fn before_stop(&self, handle: &mut dyn AnyHandle) -> Result<(), BoxError> {
		let handle = handle
			.as_any_mut()
			.downcast_mut::<P::Handle>()
			.ok_or_else(|| handle_type_error::<P>(self.name()))?;
		self.on_stop(handle)
	}
}

fn handle_type_error<P: ContainerPlugin>(kind: &str) -> BoxError {
	Box::new(ContainerError::HandleType {
		kind: kind.to_string(),
		expected: std::any::type_name::<P::Handle>(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[derive(Debug, Default)]
	struct Lamp {
		lit: bool,
	}

	impl ResourceHandle for Lamp {
		fn start(&mut self) -> Result<(), BoxError> {
			self.lit = true;
			Ok(())
		}

		fn stop(&mut self, _options: StopOptions) -> Result<(), BoxError> {
			self.lit = false;
			Ok(())
		}
	}

	struct Other;

	impl ResourceHandle for Other {
		fn start(&mut self) -> Result<(), BoxError> {
			Ok(())
		}

		fn stop(&mut self, _options: StopOptions) -> Result<(), BoxError> {
			Ok(())
		}
	}

	#[derive(Default)]
	struct LampPlugin;

	impl ContainerPlugin for LampPlugin {
		type Handle = Lamp;
		type Client = String;

		fn name(&self) -> &str {
			"lamp"
		}

		fn create_container(&self, _options: &ContainerOptions) -> Result<Lamp, BoxError> {
			Ok(Lamp::default())
		}

		fn get_client(&self, handle: &Lamp) -> Result<String, BoxError> {
			Ok(format!("lamp lit={}", handle.lit))
		}
	}

	#[rstest]
	fn test_default_hooks_are_noops() {
		let plugin = LampPlugin;
		let mut lamp = Lamp::default();
		plugin.on_start(&mut lamp).unwrap();
		plugin.on_stop(&mut lamp).unwrap();
		assert!(!lamp.lit);
	}

	#[rstest]
	fn test_erased_plugin_round_trips_handle_and_client() {
		let plugin: Box<dyn DynContainerPlugin> = Box::new(LampPlugin);
		assert_eq!(plugin.plugin_name(), "lamp");
		assert!(plugin.plugin_type().ends_with("LampPlugin"));

		let mut handle = plugin.create_resource(&ContainerOptions::new()).unwrap();
		handle.start().unwrap();
		plugin.after_start(handle.as_mut()).unwrap();

		let client = plugin.client_for(handle.as_ref()).unwrap();
		let client = client.downcast::<String>().unwrap();
		assert_eq!(client.as_str(), "lamp lit=true");
		assert!(handle.as_any().downcast_ref::<Lamp>().unwrap().lit);
	}

	#[rstest]
	fn test_foreign_handle_is_rejected() {
		let plugin: Box<dyn DynContainerPlugin> = Box::new(LampPlugin);
		let foreign: Box<dyn AnyHandle> = Box::new(Other);

		let err = plugin.client_for(foreign.as_ref()).err().unwrap();
		let err = err.downcast::<ContainerError>().unwrap();
		assert!(matches!(*err, ContainerError::HandleType { ref kind, .. } if kind == "lamp"));
	}
}
