use std::sync::Arc;

use tracing::debug;
use webview_dll_common::{Handle, Result, ShimError};

use crate::callbacks::HandleCallback;
use crate::dispatch::{DispatchJob, DispatchQueue};
use crate::engine::{LoopMessage, LoopRemote};
use crate::registry::{Registry, SharedRegistry};

/// The part of a runtime that may be used from any thread.
#[derive(Clone)]
pub struct RemoteHandle {
    registry: SharedRegistry,
    queue: DispatchQueue,
    remote: Arc<dyn LoopRemote>,
}

impl RemoteHandle {
    pub fn new(registry: SharedRegistry, queue: DispatchQueue, remote: Arc<dyn LoopRemote>) -> Self {
        Self {
            registry,
            queue,
            remote,
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &DispatchQueue {
        &self.queue
    }

    pub fn exists(&self, handle: Handle) -> bool {
        Registry::lock(&self.registry).contains(handle)
    }

    /// Ask the loop to stop. Safe from any thread.
    pub fn terminate(&self, handle: Handle) -> Result<()> {
        self.ensure_exists(handle)?;
        debug!(%handle, "terminate requested");
        self.remote.send(LoopMessage::Terminate)
    }

    /// Store `callback` as the handle's dispatch callback and queue it to
    /// run once on the loop thread. Safe from any thread.
    pub fn dispatch(&self, handle: Handle, callback: Arc<dyn HandleCallback>) -> Result<()> {
        Registry::lock(&self.registry).set_dispatch_callback(handle, Arc::clone(&callback))?;
        self.queue.push(DispatchJob { handle, callback });
        debug!(%handle, queued = self.queue.len(), "dispatch queued");
        self.remote.send(LoopMessage::Wake)
    }

    pub fn set_dispatch_callback(
        &self,
        handle: Handle,
        callback: Arc<dyn HandleCallback>,
    ) -> Result<()> {
        Registry::lock(&self.registry).set_dispatch_callback(handle, callback)
    }

    pub fn set_destroy_callback(
        &self,
        handle: Handle,
        callback: Arc<dyn HandleCallback>,
    ) -> Result<()> {
        Registry::lock(&self.registry).set_destroy_callback(handle, callback)
    }

    fn ensure_exists(&self, handle: Handle) -> Result<()> {
        if self.exists(handle) {
            Ok(())
        } else {
            Err(ShimError::UnknownHandle(handle))
        }
    }
}
