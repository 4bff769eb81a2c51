//! Frameless window example.
//!
//! Opens an undecorated window with a 32px title bar drawn by the
//! application. The caption drags the window, the edges resize it, a caption
//! double-click toggles maximize and a right-click opens the window menu.
//!
//! Run with: cargo run -p lattice-frameless --example frameless_window

use std::sync::Arc;

use lattice_frameless::{
    EngineOptions, Rect, SystemButtonId, WindowChromeConfig, WindowHandle, winit_bridge,
};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

const TITLE_BAR_HEIGHT: i32 = 32;
const BUTTON_WIDTH: i32 = 46;

#[derive(Default)]
struct FramelessApp {
    window: Option<Arc<Window>>,
}

fn caption_buttons(width: i32) -> [(SystemButtonId, Rect); 3] {
    let button = |slot: i32| Rect::new(width - slot * BUTTON_WIDTH, 0, BUTTON_WIDTH, TITLE_BAR_HEIGHT);
    [
        (SystemButtonId::Minimize, button(3)),
        (SystemButtonId::Maximize, button(2)),
        (SystemButtonId::Close, button(1)),
    ]
}

fn chrome_config(width: i32) -> WindowChromeConfig {
    caption_buttons(width).into_iter().fold(
        WindowChromeConfig::new()
            .with_title_bar_height(TITLE_BAR_HEIGHT)
            // Application menu button in the top-left corner
            .with_ignored_region(Rect::new(0, 0, 40, TITLE_BAR_HEIGHT)),
        |config, (id, rect)| config.with_system_button(id, rect),
    )
}

impl ApplicationHandler for FramelessApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Frameless")
            .with_decorations(false)
            .with_inner_size(winit::dpi::PhysicalSize::new(800, 600));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );

        let handle = WindowHandle::for_window(window.as_ref()).expect("Failed to get window handle");
        let width = window.inner_size().width as i32;
        if let Some(engine) = lattice_frameless::instance() {
            engine.register_window(handle, chrome_config(width));
        }

        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if winit_bridge::handle_window_event(window, &event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                // Keep the caption buttons pinned to the right edge
                if let (Some(engine), Ok(handle)) =
                    (lattice_frameless::instance(), WindowHandle::for_window(window.as_ref()))
                {
                    for (id, rect) in caption_buttons(size.width as i32) {
                        engine.set_system_button(handle, id, Some(rect));
                    }
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("lattice_frameless=debug")
        .init();

    let engine = lattice_frameless::initialize(EngineOptions::default());
    engine.window_state_changed().connect(|(window, state)| {
        tracing::info!(%window, ?state, "window state changed");
    });
    engine.system_theme_changed().connect(|theme| {
        tracing::info!(?theme, "system theme changed");
    });

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = FramelessApp::default();
    event_loop.run_app(&mut app).expect("Event loop error");

    lattice_frameless::shutdown();
}
