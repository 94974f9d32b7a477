//! Handle registry: one context record per live webview instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use webview_dll_common::{Handle, Result, ShimError};

use crate::callbacks::HandleCallback;

/// Per-instance record owned by the registry.
#[derive(Default)]
pub struct Context {
    /// Most recent dispatch callback. Each dispatch overwrites it.
    pub dispatch_callback: Option<Arc<dyn HandleCallback>>,
    /// Invoked once when the instance is destroyed.
    pub destroy_callback: Option<Arc<dyn HandleCallback>>,
}

/// Maps handles to context records. Handles come from a counter starting
/// at 1 and are never reused.
pub struct Registry {
    next: u64,
    contexts: HashMap<Handle, Context>,
}

pub type SharedRegistry = Arc<Mutex<Registry>>;

impl Registry {
    pub fn new() -> Self {
        Self {
            next: 1,
            contexts: HashMap::new(),
        }
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Lock a shared registry, recovering from a poisoned lock.
    pub fn lock(shared: &SharedRegistry) -> MutexGuard<'_, Registry> {
        shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserve the next handle value without registering it.
    pub fn next_handle(&mut self) -> Handle {
        let handle = Handle::from_raw(self.next);
        self.next += 1;
        handle
    }

    /// Register a fresh context for `handle`.
    pub fn insert(&mut self, handle: Handle) {
        debug!(%handle, "context registered");
        self.contexts.insert(handle, Context::default());
    }

    /// Remove the context for `handle`. Unknown handles are ignored.
    pub fn remove(&mut self, handle: Handle) -> Option<Context> {
        let removed = self.contexts.remove(&handle);
        if removed.is_some() {
            debug!(%handle, "context released");
        }
        removed
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.contexts.contains_key(&handle)
    }

    pub fn set_dispatch_callback(
        &mut self,
        handle: Handle,
        callback: Arc<dyn HandleCallback>,
    ) -> Result<()> {
        self.context_mut(handle)?.dispatch_callback = Some(callback);
        Ok(())
    }

    pub fn dispatch_callback(&self, handle: Handle) -> Option<Arc<dyn HandleCallback>> {
        self.contexts
            .get(&handle)
            .and_then(|c| c.dispatch_callback.clone())
    }

    pub fn set_destroy_callback(
        &mut self,
        handle: Handle,
        callback: Arc<dyn HandleCallback>,
    ) -> Result<()> {
        self.context_mut(handle)?.destroy_callback = Some(callback);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    fn context_mut(&mut self, handle: Handle) -> Result<&mut Context> {
        self.contexts
            .get_mut(&handle)
            .ok_or(ShimError::UnknownHandle(handle))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn handles_start_at_one_and_never_repeat() {
        let mut reg = Registry::new();
        let a = reg.next_handle();
        let b = reg.next_handle();
        assert_eq!(a.as_raw(), 1);
        assert_eq!(b.as_raw(), 2);

        reg.insert(a);
        reg.remove(a);
        assert_ne!(reg.next_handle(), a);
    }

    #[test]
    fn reserved_handle_is_not_registered() {
        let mut reg = Registry::new();
        let h = reg.next_handle();
        assert!(!reg.contains(h));
        reg.insert(h);
        assert!(reg.contains(h));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_unknown_is_benign() {
        let mut reg = Registry::new();
        assert!(reg.remove(Handle::from_raw(99)).is_none());
        let h = reg.next_handle();
        reg.insert(h);
        assert!(reg.remove(h).is_some());
        assert!(reg.remove(h).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn dispatch_callback_is_overwritten() {
        let mut reg = Registry::new();
        let h = reg.next_handle();
        reg.insert(h);

        let hits = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&hits);
        reg.set_dispatch_callback(h, Arc::new(move |_h: Handle| {
            first.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();
        let second = Arc::clone(&hits);
        reg.set_dispatch_callback(h, Arc::new(move |_h: Handle| {
            second.fetch_add(10, Ordering::SeqCst);
        }))
        .unwrap();

        reg.dispatch_callback(h).unwrap().invoke(h);
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn callbacks_on_unknown_handle_fail() {
        let mut reg = Registry::new();
        let err = reg
            .set_dispatch_callback(Handle::from_raw(7), Arc::new(|_h: Handle| {}))
            .unwrap_err();
        assert!(matches!(err, ShimError::UnknownHandle(h) if h.as_raw() == 7));
        assert!(reg
            .set_destroy_callback(Handle::from_raw(7), Arc::new(|_h: Handle| {}))
            .is_err());
    }

    #[test]
    fn shared_lock_survives_poison() {
        let shared = Registry::shared();
        let poisoner = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the registry");
        })
        .join();
        let mut reg = Registry::lock(&shared);
        let h = reg.next_handle();
        reg.insert(h);
        assert!(reg.contains(h));
    }
}
