//! The flat operation set over one engine.
//!
//! `Runtime` lives on the loop thread. It owns the engine and the views;
//! the handle registry and dispatch queue are shared with [`RemoteHandle`]
//! so that `exists`, `dispatch` and `terminate` work from other threads.
//! No borrow or lock is held while user callbacks run, so callbacks may
//! call back into the runtime.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, info, warn};
use webview_dll_common::{AccessKind, EngineVersion, Handle, Result, ShimError, SizeHint};
use webview_dll_config::ShimConfig;

use crate::bridge::{self, BindingTable, PageScripts, BRIDGE_INIT_SCRIPT};
use crate::callbacks::{BindCallback, HandleCallback};
use crate::dispatch::DispatchQueue;
use crate::engine::{Engine, ParentWindow, RunMode, ViewOptions, WebView};
use crate::files;
use crate::registry::Registry;
use crate::virtual_host;

mod remote;

pub use remote::RemoteHandle;

struct ViewSlot<V> {
    view: Rc<V>,
    bindings: BindingTable,
    scripts: PageScripts,
}

pub struct Runtime<E: Engine> {
    engine: E,
    config: ShimConfig,
    remote: RemoteHandle,
    views: RefCell<HashMap<Handle, ViewSlot<E::View>>>,
}

impl<E: Engine> Runtime<E> {
    pub fn new(engine: E, config: ShimConfig) -> Self {
        let remote = RemoteHandle::new(Registry::shared(), DispatchQueue::new(), engine.remote());
        Self {
            engine,
            config,
            remote,
            views: RefCell::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    /// Thread-safe part of this runtime.
    pub fn remote(&self) -> &RemoteHandle {
        &self.remote
    }

    pub fn version() -> EngineVersion {
        E::version()
    }

    // -------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------

    /// Create an instance. Returns [`Handle::NONE`] if the engine fails;
    /// the registry is untouched in that case.
    pub fn create(&self, debug: bool, parent: Option<ParentWindow>) -> Handle {
        let handle = Registry::lock(self.remote.registry()).next_handle();
        let bindings = BindingTable::new();
        let scripts = PageScripts::new(bindings.clone());
        let window = &self.config.window;
        let options = ViewOptions {
            debug: self.config.debug.devtools_for(debug),
            parent,
            title: window.title.clone(),
            width: window.width,
            height: window.height,
            user_agent: window.user_agent.clone(),
            bootstrap_script: BRIDGE_INIT_SCRIPT.to_string(),
            page_scripts: scripts.clone(),
        };

        let view = match self
            .engine
            .create_view(&options, bindings.message_handler(handle))
        {
            Ok(view) => view,
            Err(e) => {
                warn!(error = %e, "webview creation failed");
                return Handle::NONE;
            }
        };

        Registry::lock(self.remote.registry()).insert(handle);
        self.views.borrow_mut().insert(
            handle,
            ViewSlot {
                view: Rc::new(view),
                bindings,
                scripts,
            },
        );
        info!(%handle, embedded = parent.is_some(), devtools = options.debug, "webview created");
        handle
    }

    /// Release the context and tear the instance down. The destroy
    /// callback, if any, runs before the view is closed. Unknown handles
    /// are ignored.
    pub fn destroy(&self, handle: Handle) {
        let slot = self.views.borrow_mut().remove(&handle);
        let context = Registry::lock(self.remote.registry()).remove(handle);

        if let Some(callback) = context.and_then(|c| c.destroy_callback) {
            callback.invoke(handle);
        }
        if slot.is_some() {
            info!(%handle, "webview destroyed");
        } else {
            debug!(%handle, "destroy of unknown handle ignored");
        }
        drop(slot);
    }

    pub fn exists(&self, handle: Handle) -> bool {
        self.remote.exists(handle)
    }

    pub fn set_dispatch_callback(
        &self,
        handle: Handle,
        callback: Arc<dyn HandleCallback>,
    ) -> Result<()> {
        self.remote.set_dispatch_callback(handle, callback)
    }

    pub fn set_destroy_callback(
        &self,
        handle: Handle,
        callback: Arc<dyn HandleCallback>,
    ) -> Result<()> {
        self.remote.set_destroy_callback(handle, callback)
    }

    // -------------------------------------------------------------------
    // Event loop
    // -------------------------------------------------------------------

    /// Run the event loop until terminated. Blocks.
    pub fn run(&self, handle: Handle, mode: RunMode) -> Result<()> {
        self.view(handle)?;
        debug!(%handle, ?mode, "entering event loop");
        let result = self.engine.run(mode, &|| self.drain_dispatch());
        debug!(%handle, "event loop returned");
        result
    }

    pub fn terminate(&self, handle: Handle) -> Result<()> {
        self.remote.terminate(handle)
    }

    pub fn dispatch(&self, handle: Handle, callback: Arc<dyn HandleCallback>) -> Result<()> {
        self.remote.dispatch(handle, callback)
    }

    /// Run queued dispatch jobs in order. Jobs for destroyed handles are
    /// dropped.
    pub fn drain_dispatch(&self) {
        while let Some(job) = self.remote.queue().pop() {
            if self.exists(job.handle) {
                job.run();
            } else {
                debug!(handle = %job.handle, "dispatch for destroyed handle dropped");
            }
        }
    }

    // -------------------------------------------------------------------
    // Forwarding
    // -------------------------------------------------------------------

    pub fn window(&self, handle: Handle) -> Result<*mut c_void> {
        Ok(self.view(handle)?.window())
    }

    pub fn set_title(&self, handle: Handle, title: &str) -> Result<()> {
        self.view(handle)?.set_title(title)
    }

    pub fn set_size(&self, handle: Handle, width: i32, height: i32, hint: SizeHint) -> Result<()> {
        self.view(handle)?.set_size(width, height, hint)
    }

    pub fn navigate(&self, handle: Handle, url: &str) -> Result<()> {
        self.view(handle)?.navigate(url)
    }

    pub fn set_html(&self, handle: Handle, html: &str) -> Result<()> {
        self.view(handle)?.set_html(html)
    }

    /// Run `js` in every later document of this view, before its scripts.
    pub fn init(&self, handle: Handle, js: &str) -> Result<()> {
        self.slot(handle)?.scripts.add(js);
        Ok(())
    }

    pub fn eval(&self, handle: Handle, js: &str) -> Result<()> {
        self.view(handle)?.eval(js)
    }

    // -------------------------------------------------------------------
    // Bindings
    // -------------------------------------------------------------------

    /// Expose `name` as a global function in this and every later page.
    /// Later pages pick it up through the view's page scripts.
    pub fn bind(&self, handle: Handle, name: &str, callback: Arc<dyn BindCallback>) -> Result<()> {
        let slot = self.slot(handle)?;
        if slot.bindings.insert(name, callback) {
            debug!(%handle, name, "binding replaced");
        }
        slot.view.eval(&bridge::bind_script(name))
    }

    /// Remove `name` from this page and from every later one.
    pub fn unbind(&self, handle: Handle, name: &str) -> Result<()> {
        let slot = self.slot(handle)?;
        if !slot.bindings.remove(name) {
            debug!(%handle, name, "unbind of unknown name");
        }
        slot.view.eval(&bridge::unbind_script(name))
    }

    /// Settle the pending bound call `seq`.
    pub fn resolve(&self, handle: Handle, seq: &str, status: i32, result: &str) -> Result<()> {
        self.view(handle)?
            .eval(&bridge::reply_script(seq, status, result))
    }

    // -------------------------------------------------------------------
    // File-backed
    // -------------------------------------------------------------------

    /// Load a file's content as the page HTML. Nothing is forwarded if the
    /// file is missing or unreadable.
    pub fn set_html_from_file(&self, handle: Handle, path: &Path) -> Result<()> {
        let html = files::read_html_file(path)?;
        self.set_html(handle, &html)
    }

    /// Serve `url`'s host from `folder`. Nothing is forwarded if the folder
    /// does not exist.
    pub fn set_virtual_host_mapping(
        &self,
        handle: Handle,
        url: &str,
        folder: &Path,
        access: AccessKind,
    ) -> Result<()> {
        let folder = files::resolve_folder(folder)?;
        let host = virtual_host::host_from_url(url)?;
        if host == virtual_host::PAGE_SCRIPTS_HOST {
            return Err(ShimError::InvalidArgument(format!("{host} is reserved")));
        }
        let view = self.view(handle)?;
        info!(%handle, host = %host, folder = %folder.display(), %access, "virtual host mapped");
        view.map_virtual_host(&host, &folder, access)
    }

    // -------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------

    fn view(&self, handle: Handle) -> Result<Rc<E::View>> {
        self.slot(handle).map(|slot| slot.view)
    }

    /// Clone of the slot, so no borrow of `views` outlives the lookup.
    fn slot(&self, handle: Handle) -> Result<ViewSlot<E::View>> {
        self.views
            .borrow()
            .get(&handle)
            .cloned()
            .ok_or(ShimError::UnknownHandle(handle))
    }
}

impl<V> Clone for ViewSlot<V> {
    fn clone(&self) -> Self {
        Self {
            view: Rc::clone(&self.view),
            bindings: self.bindings.clone(),
            scripts: self.scripts.clone(),
        }
    }
}
