//! Docker-backed resource handle shared by the container adapters.
//!
//! [`DockerResource`] holds a fully configured `testcontainers` request until
//! [`ResourceHandle::start`] runs it on the synchronous runner, then the
//! running [`Container`]. Readiness is the image's own wait strategy, bounded
//! by the request's startup timeout.
//!
//! The synchronous runner drives its own tokio runtime, so these handles must
//! not be started or stopped from inside an async context.

use crate::error::{AdapterError, AdapterResult};
use gherkin_containers_core::{BoxError, ResourceHandle, StopOptions};
use std::fmt;
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, ContainerRequest, Image};

enum State<I: Image> {
	Pending(Box<ContainerRequest<I>>),
	Running(Container<I>),
	Stopped,
}

/// One container, from request to removal.
pub struct DockerResource<I: Image> {
	kind: &'static str,
	state: State<I>,
}

impl<I: Image> DockerResource<I> {
	pub fn new(kind: &'static str, request: impl Into<ContainerRequest<I>>) -> Self {
		Self {
			kind,
			state: State::Pending(Box::new(request.into())),
		}
	}

	pub fn kind(&self) -> &'static str {
		self.kind
	}

	pub fn is_running(&self) -> bool {
		matches!(self.state, State::Running(_))
	}

	/// The running container.
	pub fn container(&self) -> AdapterResult<&Container<I>> {
		match &self.state {
			State::Running(container) => Ok(container),
			_ => Err(AdapterError::NotStarted(self.kind)),
		}
	}

	/// Host the container's mapped ports are reachable on.
	pub fn host(&self) -> AdapterResult<String> {
		Ok(self.container()?.get_host()?.to_string())
	}

	/// Host port mapped to the container's TCP `port`.
	pub fn host_port(&self, port: u16) -> AdapterResult<u16> {
		Ok(self.container()?.get_host_port_ipv4(port)?)
	}

	/// `host:port` for the container's TCP `port`.
	pub fn address(&self, port: u16) -> AdapterResult<String> {
		Ok(format!("{}:{}", self.host()?, self.host_port(port)?))
	}

	/// Run the request and wait for readiness.
	pub fn start_container(&mut self) -> AdapterResult<()> {
		let request = match std::mem::replace(&mut self.state, State::Stopped) {
			State::Pending(request) => request,
			running @ State::Running(_) => {
				self.state = running;
				return Err(AdapterError::AlreadyStarted(self.kind));
			}
			State::Stopped => return Err(AdapterError::AlreadyStarted(self.kind)),
		};

		tracing::debug!(kind = self.kind, "starting container");
		let container = (*request).start()?;
		tracing::info!(kind = self.kind, id = container.id(), "container started");
		self.state = State::Running(container);
		Ok(())
	}

	/// Stop and remove the container. A handle that never started is a no-op.
	///
	/// `force` skips the graceful stop. Removal always deletes the container's
	/// anonymous volumes, so `delete_volume` cannot keep them.
	pub fn stop_container(&mut self, options: StopOptions) -> AdapterResult<()> {
		let State::Running(container) = std::mem::replace(&mut self.state, State::Stopped) else {
			return Ok(());
		};

		let id = container.id().to_string();
		if !options.delete_volume {
			tracing::debug!(kind = self.kind, id = %id, "volumes are removed with the container");
		}
		if !options.force {
			container.stop()?;
		}
		container.rm()?;
		tracing::info!(kind = self.kind, id = %id, "container removed");
		Ok(())
	}
}

impl<I: Image + 'static> ResourceHandle for DockerResource<I> {
	fn start(&mut self) -> Result<(), BoxError> {
		self.start_container().map_err(AdapterError::boxed)
	}

	fn stop(&mut self, options: StopOptions) -> Result<(), BoxError> {
		self.stop_container(options).map_err(AdapterError::boxed)
	}
}

impl<I: Image> fmt::Debug for DockerResource<I> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = match &self.state {
			State::Pending(_) => "pending",
			State::Running(_) => "running",
			State::Stopped => "stopped",
		};
		f.debug_struct("DockerResource")
			.field("kind", &self.kind)
			.field("state", &state)
			.finish()
	}
}
