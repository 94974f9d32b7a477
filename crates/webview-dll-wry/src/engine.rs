//! The wry engine: owns the winit event loop and builds views.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use webview_dll_common::{EngineVersion, Result, ShimError};
use webview_dll_core::{Engine, LoopMessage, LoopRemote, MessageHandler, RunMode, ViewOptions};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;
use winit::window::{Window, WindowAttributes, WindowId};
use wry::WebViewBuilder;

use crate::event_loop::{LoopHandler, ProxyRemote};
use crate::geometry;
use crate::parent::ParentHandle;
use crate::view::{engine_error, ViewShared, WindowMap, WryView};

/// How long one pump iteration waits for native events.
const PUMP_TIMEOUT: Duration = Duration::from_millis(16);

/// Upper bound between GTK pumps while the loop is idle.
#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
pub(crate) const GTK_PUMP_INTERVAL: Duration = Duration::from_millis(8);

pub struct WryEngine {
    /// `None` while the loop is running.
    event_loop: RefCell<Option<EventLoop<LoopMessage>>>,
    remote: Arc<ProxyRemote>,
    /// The running loop, set only for the duration of a wake callback.
    active: Cell<*const ActiveEventLoop>,
    windows: WindowMap,
}

impl WryEngine {
    /// Create the event loop on the current thread.
    pub fn new() -> Result<Self> {
        #[cfg(any(
            target_os = "linux",
            target_os = "dragonfly",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        gtk::init().map_err(|e| ShimError::Engine(format!("gtk init failed: {e}")))?;

        #[allow(unused_mut)]
        let mut builder = EventLoop::<LoopMessage>::with_user_event();
        #[cfg(target_os = "windows")]
        winit::platform::windows::EventLoopBuilderExtWindows::with_any_thread(&mut builder, true);
        #[cfg(any(
            target_os = "linux",
            target_os = "dragonfly",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        winit::platform::x11::EventLoopBuilderExtX11::with_any_thread(&mut builder, true);

        let event_loop = builder
            .build()
            .map_err(|e| ShimError::Engine(format!("event loop creation failed: {e}")))?;
        let remote = Arc::new(ProxyRemote::new(event_loop.create_proxy()));
        info!("wry engine ready");

        Ok(Self {
            event_loop: RefCell::new(Some(event_loop)),
            remote,
            active: Cell::new(std::ptr::null()),
            windows: Rc::new(RefCell::new(HashMap::new())),
        })
    }

    /// Expose the running loop to window creation until the guard drops.
    pub(crate) fn enter<'a>(&'a self, event_loop: &ActiveEventLoop) -> ActiveGuard<'a> {
        let previous = self.active.replace(event_loop as *const ActiveEventLoop);
        ActiveGuard {
            cell: &self.active,
            previous,
        }
    }

    /// Resize the webview of a top-level window to its new client area.
    pub(crate) fn fit_to_window(&self, id: WindowId, size: PhysicalSize<u32>) {
        let webview = self.windows.borrow().get(&id).and_then(Weak::upgrade);
        if let Some(webview) = webview {
            if let Err(e) = webview.set_bounds(geometry::fill_physical(size)) {
                warn!(error = %e, "resizing webview failed");
            }
        }
    }

    fn create_window(&self, options: &ViewOptions) -> Result<Window> {
        let attrs = WindowAttributes::default()
            .with_title(options.title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(options.width),
                f64::from(options.height),
            ));

        let active = self.active.get();
        let window = if active.is_null() {
            let event_loop = self.event_loop.borrow();
            let Some(event_loop) = event_loop.as_ref() else {
                return Err(ShimError::LoopUnavailable(
                    "windows can only be created from a dispatch callback while the loop runs"
                        .into(),
                ));
            };
            #[allow(deprecated)]
            event_loop.create_window(attrs)
        } else {
            // SAFETY: `active` is only non-null inside `enter`, while the
            // loop callback that owns the reference is still on the stack.
            unsafe { &*active }.create_window(attrs)
        };
        window.map_err(|e| ShimError::Engine(format!("window creation failed: {e}")))
    }
}

impl Engine for WryEngine {
    type View = WryView;

    fn create_view(&self, options: &ViewOptions, on_message: MessageHandler) -> Result<WryView> {
        let shared = ViewShared::default();
        let builder = shared.configure(WebViewBuilder::new(), options, on_message);

        match options.parent {
            Some(parent) => {
                let handle = ParentHandle::new(parent);
                let webview = builder
                    .with_bounds(geometry::fill_logical(options.width, options.height))
                    .build_as_child(&handle)
                    .map_err(engine_error)?;
                debug!(parent = ?parent.as_ptr(), "embedded webview built");
                Ok(WryView::embedded(webview, parent, shared))
            }
            None => {
                let window = self.create_window(options)?;
                let webview = builder
                    .with_bounds(geometry::fill_physical(window.inner_size()))
                    .build_as_child(&window)
                    .map_err(engine_error)?;
                debug!(window = ?window.id(), "top-level webview built");
                Ok(WryView::top_level(webview, window, &self.windows, shared))
            }
        }
    }

    fn run(&self, mode: RunMode, on_wake: &dyn Fn()) -> Result<()> {
        let mut event_loop = self
            .event_loop
            .borrow_mut()
            .take()
            .ok_or_else(|| ShimError::LoopUnavailable("event loop is already running".into()))?;

        let mut handler = LoopHandler::new(self, on_wake);
        let result = match mode {
            RunMode::Blocking => event_loop
                .run_app_on_demand(&mut handler)
                .map_err(|e| ShimError::Engine(format!("event loop failed: {e}"))),
            RunMode::Pump => loop {
                if let PumpStatus::Exit(code) =
                    event_loop.pump_app_events(Some(PUMP_TIMEOUT), &mut handler)
                {
                    debug!(code, "pumped event loop exited");
                    break Ok(());
                }
                #[cfg(any(
                    target_os = "linux",
                    target_os = "dragonfly",
                    target_os = "freebsd",
                    target_os = "netbsd",
                    target_os = "openbsd"
                ))]
                pump_gtk();
            },
        };

        *self.event_loop.borrow_mut() = Some(event_loop);
        result
    }

    fn remote(&self) -> Arc<dyn LoopRemote> {
        Arc::clone(&self.remote) as Arc<dyn LoopRemote>
    }

    fn version() -> EngineVersion {
        crate_version()
    }
}

/// Version of this backend, with `+wry` build metadata.
fn crate_version() -> EngineVersion {
    let part = |s: &str| s.parse::<u32>().unwrap_or(0);
    EngineVersion::new(
        part(env!("CARGO_PKG_VERSION_MAJOR")),
        part(env!("CARGO_PKG_VERSION_MINOR")),
        part(env!("CARGO_PKG_VERSION_PATCH")),
    )
    .with_pre_release(env!("CARGO_PKG_VERSION_PRE"))
    .with_build_metadata("wry")
}

pub(crate) struct ActiveGuard<'a> {
    cell: &'a Cell<*const ActiveEventLoop>,
    previous: *const ActiveEventLoop,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.cell.set(self.previous);
    }
}

/// Run pending GTK work without blocking.
#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
pub(crate) fn pump_gtk() {
    while gtk::events_pending() {
        gtk::main_iteration_do(false);
    }
}
