//! One wry webview and, for top-level views, the winit window around it.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::path::Path;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};
use webview_dll_common::{AccessKind, Result, ShimError, SizeHint};
use webview_dll_core::bridge::page_scripts_loader;
use webview_dll_core::virtual_host::request_host;
use webview_dll_core::{
    MessageHandler, ParentWindow, VirtualHostTable, ViewOptions, WebView, PAGE_SCRIPTS_HOST,
    VIRTUAL_HOST_SCHEME,
};
use winit::window::{Window, WindowId};
use wry::WebViewBuilder;

use crate::geometry;
use crate::parent::native_pointer;
use crate::protocol;

pub(crate) type WindowMap = Rc<RefCell<HashMap<WindowId, Weak<wry::WebView>>>>;

pub(crate) fn engine_error(e: wry::Error) -> ShimError {
    ShimError::Engine(e.to_string())
}

/// State shared between a view and the handlers installed in its builder.
#[derive(Clone, Default)]
pub(crate) struct ViewShared {
    webview: Rc<OnceCell<Weak<wry::WebView>>>,
    hosts: Rc<RefCell<VirtualHostTable>>,
}

impl ViewShared {
    fn webview(&self) -> Option<Rc<wry::WebView>> {
        self.webview.get().and_then(Weak::upgrade)
    }

    /// Apply the options and wire page messages, page scripts and the
    /// virtual host scheme into `builder`.
    pub(crate) fn configure<'a>(
        &self,
        builder: WebViewBuilder<'a>,
        options: &'a ViewOptions,
        on_message: MessageHandler,
    ) -> WebViewBuilder<'a> {
        let mut builder = builder
            .with_devtools(options.debug)
            .with_focused(true)
            .with_initialization_script(&options.bootstrap_script)
            .with_initialization_script(&page_scripts_loader(&protocol::page_scripts_url()));

        #[cfg(target_os = "windows")]
        {
            use wry::WebViewBuilderExtWindows;
            builder = builder.with_https_scheme(true);
        }

        if let Some(ua) = &options.user_agent {
            builder = builder.with_user_agent(ua);
        }

        // Page -> native
        let ipc = self.clone();
        builder = builder.with_ipc_handler(move |request| {
            let Some(reply) = on_message(request.body().as_str()) else {
                return;
            };
            if let Some(webview) = ipc.webview() {
                if let Err(e) = webview.evaluate_script(&reply) {
                    warn!(error = %e, "reply script failed");
                }
            }
        });

        let hosts = Rc::clone(&self.hosts);
        let page_scripts = options.page_scripts.clone();
        builder.with_custom_protocol(VIRTUAL_HOST_SCHEME.to_string(), move |_id, request| {
            let uri = request.uri().to_string();
            if request_host(&uri).as_deref() == Some(PAGE_SCRIPTS_HOST) {
                return protocol::page_scripts_response(&page_scripts);
            }
            let response = hosts
                .borrow()
                .resolve(&uri, &protocol::request_source(&request));
            if response.status != 200 {
                debug!(uri = %uri, status = response.status, "virtual host request refused");
            }
            protocol::to_http(response)
        })
    }

    pub(crate) fn attach(&self, webview: &Rc<wry::WebView>) {
        let _ = self.webview.set(Rc::downgrade(webview));
    }
}

enum Host {
    TopLevel { window: Window, windows: WindowMap },
    Embedded(ParentWindow),
}

pub struct WryView {
    // Declared before `host` so the webview is torn down before its window.
    webview: Rc<wry::WebView>,
    host: Host,
    shared: ViewShared,
}

impl WryView {
    pub(crate) fn top_level(
        webview: wry::WebView,
        window: Window,
        windows: &WindowMap,
        shared: ViewShared,
    ) -> Self {
        let webview = Rc::new(webview);
        shared.attach(&webview);
        windows
            .borrow_mut()
            .insert(window.id(), Rc::downgrade(&webview));
        Self {
            webview,
            host: Host::TopLevel {
                window,
                windows: Rc::clone(windows),
            },
            shared,
        }
    }

    pub(crate) fn embedded(webview: wry::WebView, parent: ParentWindow, shared: ViewShared) -> Self {
        let webview = Rc::new(webview);
        shared.attach(&webview);
        Self {
            webview,
            host: Host::Embedded(parent),
            shared,
        }
    }
}

impl Drop for WryView {
    fn drop(&mut self) {
        if let Host::TopLevel { window, windows } = &self.host {
            windows.borrow_mut().remove(&window.id());
        }
    }
}

impl WebView for WryView {
    fn window(&self) -> *mut c_void {
        match &self.host {
            Host::TopLevel { window, .. } => native_pointer(window),
            Host::Embedded(parent) => parent.as_ptr(),
        }
    }

    fn set_title(&self, title: &str) -> Result<()> {
        match &self.host {
            Host::TopLevel { window, .. } => window.set_title(title),
            Host::Embedded(_) => debug!("title ignored for embedded view"),
        }
        Ok(())
    }

    fn set_size(&self, width: i32, height: i32, hint: SizeHint) -> Result<()> {
        let window = match &self.host {
            Host::TopLevel { window, .. } => window,
            Host::Embedded(_) => {
                if matches!(hint, SizeHint::None | SizeHint::Fixed) {
                    let bounds =
                        geometry::fill_logical(geometry::dimension(width), geometry::dimension(height));
                    self.webview.set_bounds(bounds).map_err(engine_error)?;
                }
                return Ok(());
            }
        };

        let sizing = geometry::window_sizing(width, height, hint);
        if let Some(resizable) = sizing.resizable {
            window.set_resizable(resizable);
        }
        if let Some(min) = sizing.min {
            window.set_min_inner_size(Some(min));
        }
        if let Some(max) = sizing.max {
            window.set_max_inner_size(Some(max));
        }
        if let Some(inner) = sizing.inner {
            if let Some(applied) = window.request_inner_size(inner) {
                self.webview
                    .set_bounds(geometry::fill_physical(applied))
                    .map_err(engine_error)?;
            }
        }
        Ok(())
    }

    fn navigate(&self, url: &str) -> Result<()> {
        let rewritten = self.shared.hosts.borrow().rewrite_url(url);
        let target = match rewritten {
            Some(mapped) => protocol::platform_url(mapped),
            None => url.to_string(),
        };
        debug!(url = %target, "navigate");
        self.webview.load_url(&target).map_err(engine_error)
    }

    fn set_html(&self, html: &str) -> Result<()> {
        self.webview.load_html(html).map_err(engine_error)
    }

    fn eval(&self, js: &str) -> Result<()> {
        self.webview.evaluate_script(js).map_err(engine_error)
    }

    fn map_virtual_host(&self, host: &str, folder: &Path, access: AccessKind) -> Result<()> {
        self.shared
            .hosts
            .borrow_mut()
            .insert(host, folder.to_path_buf(), access);
        Ok(())
    }
}
