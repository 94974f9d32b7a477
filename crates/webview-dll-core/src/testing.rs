//! Recording engine for tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use webview_dll_common::{AccessKind, EngineVersion, Result, ShimError, SizeHint};

use crate::engine::{
    Engine, LoopMessage, LoopRemote, MessageHandler, RunMode, ViewOptions, WebView,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    SetTitle(String),
    SetSize(i32, i32, SizeHint),
    Navigate(String),
    SetHtml(String),
    Eval(String),
    MapVirtualHost {
        host: String,
        folder: PathBuf,
        access: AccessKind,
    },
}

pub struct ViewState {
    pub index: usize,
    pub options: ViewOptions,
    pub calls: RefCell<Vec<ViewCall>>,
    pub destroyed: Cell<bool>,
    handler: MessageHandler,
}

impl ViewState {
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.borrow().clone()
    }

    /// Scripts a freshly loaded document runs before its own, in order.
    pub fn document_scripts(&self) -> Vec<String> {
        let mut scripts = vec![self.options.bootstrap_script.clone()];
        scripts.extend(self.options.page_scripts.scripts());
        scripts
    }

    fn record(&self, call: ViewCall) -> Result<()> {
        if self.destroyed.get() {
            return Err(ShimError::Engine("view used after teardown".into()));
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

pub struct MockView {
    state: Rc<ViewState>,
}

impl Drop for MockView {
    fn drop(&mut self) {
        self.state.destroyed.set(true);
    }
}

impl WebView for MockView {
    fn window(&self) -> *mut c_void {
        (0x1000 + self.state.index * 0x10) as *mut c_void
    }

    fn set_title(&self, title: &str) -> Result<()> {
        self.state.record(ViewCall::SetTitle(title.to_string()))
    }

    fn set_size(&self, width: i32, height: i32, hint: SizeHint) -> Result<()> {
        self.state.record(ViewCall::SetSize(width, height, hint))
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.state.record(ViewCall::Navigate(url.to_string()))
    }

    fn set_html(&self, html: &str) -> Result<()> {
        self.state.record(ViewCall::SetHtml(html.to_string()))
    }

    fn eval(&self, js: &str) -> Result<()> {
        self.state.record(ViewCall::Eval(js.to_string()))
    }

    fn map_virtual_host(&self, host: &str, folder: &Path, access: AccessKind) -> Result<()> {
        self.state.record(ViewCall::MapVirtualHost {
            host: host.to_string(),
            folder: folder.to_path_buf(),
            access,
        })
    }
}

#[derive(Default)]
pub struct MockRemote {
    pub messages: Mutex<VecDeque<LoopMessage>>,
}

impl LoopRemote for MockRemote {
    fn send(&self, message: LoopMessage) -> Result<()> {
        self.messages.lock().unwrap().push_back(message);
        Ok(())
    }
}

/// Engine double. Runs its "loop" by draining the messages sent so far.
#[derive(Default)]
pub struct MockEngine {
    pub fail_create: Cell<bool>,
    pub remote: Arc<MockRemote>,
    pub runs: RefCell<Vec<RunMode>>,
    views: RefCell<Vec<Rc<ViewState>>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, index: usize) -> Rc<ViewState> {
        Rc::clone(&self.views.borrow()[index])
    }

    pub fn created(&self) -> usize {
        self.views.borrow().len()
    }

    /// Simulate page script posting `raw`. A reply script is evaluated in
    /// the view, as a real engine would.
    pub fn post_from_page(&self, index: usize, raw: &str) {
        let state = self.view(index);
        if let Some(reply) = (state.handler)(raw) {
            let _ = state.record(ViewCall::Eval(reply));
        }
    }

    pub fn pending_messages(&self) -> Vec<LoopMessage> {
        self.remote.messages.lock().unwrap().iter().copied().collect()
    }
}

impl Engine for MockEngine {
    type View = MockView;

    fn create_view(&self, options: &ViewOptions, on_message: MessageHandler) -> Result<MockView> {
        if self.fail_create.get() {
            return Err(ShimError::Engine("no display".into()));
        }
        let mut views = self.views.borrow_mut();
        let state = Rc::new(ViewState {
            index: views.len(),
            options: options.clone(),
            calls: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
            handler: on_message,
        });
        views.push(Rc::clone(&state));
        Ok(MockView { state })
    }

    fn run(&self, mode: RunMode, on_wake: &dyn Fn()) -> Result<()> {
        self.runs.borrow_mut().push(mode);
        loop {
            let next = self.remote.messages.lock().unwrap().pop_front();
            match next {
                Some(LoopMessage::Wake) => on_wake(),
                Some(LoopMessage::Terminate) | None => return Ok(()),
            }
        }
    }

    fn remote(&self) -> Arc<dyn LoopRemote> {
        Arc::clone(&self.remote) as Arc<dyn LoopRemote>
    }

    fn version() -> EngineVersion {
        EngineVersion::new(0, 10, 0)
            .with_pre_release("test")
            .with_build_metadata("mock")
    }
}
