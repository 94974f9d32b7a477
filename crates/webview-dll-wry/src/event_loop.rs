//! winit event loop plumbing: the cross-thread proxy and the handler that
//! turns loop events into dispatch drains, resizes and exits.

use std::sync::Mutex;

use tracing::{debug, info};
use webview_dll_common::{Result, ShimError};
use webview_dll_core::{LoopMessage, LoopRemote};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::window::WindowId;

use crate::engine::WryEngine;

/// Sends [`LoopMessage`]s into a winit loop from any thread.
pub struct ProxyRemote {
    proxy: Mutex<EventLoopProxy<LoopMessage>>,
}

impl ProxyRemote {
    pub(crate) fn new(proxy: EventLoopProxy<LoopMessage>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
        }
    }
}

impl LoopRemote for ProxyRemote {
    fn send(&self, message: LoopMessage) -> Result<()> {
        self.proxy
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .send_event(message)
            .map_err(|_| ShimError::LoopUnavailable("event loop is closed".into()))
    }
}

pub(crate) struct LoopHandler<'a> {
    engine: &'a WryEngine,
    on_wake: &'a dyn Fn(),
}

impl<'a> LoopHandler<'a> {
    pub(crate) fn new(engine: &'a WryEngine, on_wake: &'a dyn Fn()) -> Self {
        Self { engine, on_wake }
    }
}

impl ApplicationHandler<LoopMessage> for LoopHandler<'_> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: LoopMessage) {
        match event {
            LoopMessage::Wake => {
                let _active = self.engine.enter(event_loop);
                (self.on_wake)();
            }
            LoopMessage::Terminate => {
                info!("terminate received, leaving event loop");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!(?window_id, "window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    self.engine.fit_to_window(window_id, size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        #[cfg(any(
            target_os = "linux",
            target_os = "dragonfly",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        {
            use std::time::Instant;
            use winit::event_loop::ControlFlow;

            crate::engine::pump_gtk();
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                Instant::now() + crate::engine::GTK_PUMP_INTERVAL,
            ));
        }
        #[cfg(not(any(
            target_os = "linux",
            target_os = "dragonfly",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd"
        )))]
        let _ = event_loop;
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        debug!("event loop exiting");
    }
}
