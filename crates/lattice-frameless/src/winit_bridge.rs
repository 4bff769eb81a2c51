//! winit event routing.
//!
//! On platforms where the engine has no native message hook of its own
//! (X11 through winit, macOS), the toolkit's window events are the message
//! stream. Feed every [`WindowEvent`] of a registered window through
//! [`handle_window_event`]:
//!
//! ```ignore
//! fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
//!     if lattice_frameless::winit_bridge::handle_window_event(&self.window, &event) {
//!         return;
//!     }
//!     // Application handling
//! }
//! ```
//!
//! When the backend intercepts native messages itself (Windows), every
//! event is left alone and the function returns `false`.

use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::window::Window;

use lattice_frameless_core::logging::targets;
use lattice_frameless_core::{Point, Size};

use crate::chrome::{ChromeEngine, instance};
use crate::event::{
    ChromeMessage, Disposition, EnvironmentChange, MessageReply, NoDefaultProcessing,
    PointerAction, PointerButton,
};
use crate::handle::WindowHandle;
use crate::metrics::REFERENCE_DPI;
use crate::state::WindowState;

/// Route one winit event through the process-wide engine.
///
/// Returns `true` if the event was consumed by the chrome (a move, resize,
/// maximize toggle or system menu was started) and the application should
/// not handle it further.
pub fn handle_window_event(window: &Window, event: &WindowEvent) -> bool {
    match instance() {
        Some(engine) => handle_window_event_with(&engine, window, event),
        None => false,
    }
}

/// Route one winit event through a specific engine.
pub fn handle_window_event_with(engine: &ChromeEngine, window: &Window, event: &WindowEvent) -> bool {
    if engine.backend().intercepts_native_messages() {
        return false;
    }
    let Ok(handle) = WindowHandle::for_window(window) else {
        return false;
    };
    if !engine.is_registered(handle) {
        return false;
    }

    match event {
        WindowEvent::CursorMoved { position, .. } => {
            let pos = physical_to_point(*position);
            engine.set_pointer_position(handle, Some(pos));
            if let Some(region) = engine.hit_test(handle, pos, window_size(window)) {
                window.set_cursor(region.cursor());
            }
            false
        }
        WindowEvent::CursorLeft { .. } => {
            engine.set_pointer_position(handle, None);
            false
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let Some(pos) = engine.pointer_position(handle) else {
                return false;
            };
            let Some((button, action)) = pointer_input(*button, *state) else {
                return false;
            };
            let message = ChromeMessage::Pointer {
                pos,
                window_size: window_size(window),
                button,
                action,
            };
            match engine.dispatch(handle, message, &mut NoDefaultProcessing) {
                Disposition::Handled(reply) => execute(window, handle, reply),
                Disposition::PassThrough => false,
            }
        }
        WindowEvent::Resized(size) => {
            let message = ChromeMessage::SizeChanged {
                state: window_state(window),
                size: Size::from((size.width, size.height)),
            };
            engine.dispatch(handle, message, &mut NoDefaultProcessing);
            false
        }
        WindowEvent::Focused(active) => {
            engine.dispatch(handle, ChromeMessage::Activate { active: *active }, &mut NoDefaultProcessing);
            false
        }
        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
            let change = EnvironmentChange::Dpi {
                dpi: dpi_for_scale_factor(*scale_factor),
            };
            engine.dispatch(handle, ChromeMessage::EnvironmentChanged(change), &mut NoDefaultProcessing);
            false
        }
        WindowEvent::ThemeChanged(_) => {
            engine.dispatch(
                handle,
                ChromeMessage::EnvironmentChanged(EnvironmentChange::Theme),
                &mut NoDefaultProcessing,
            );
            false
        }
        WindowEvent::Destroyed => {
            engine.dispatch(handle, ChromeMessage::Destroyed, &mut NoDefaultProcessing);
            false
        }
        _ => false,
    }
}

/// Carry out a handled pointer reply on the winit window.
fn execute(window: &Window, handle: WindowHandle, reply: MessageReply) -> bool {
    let result = match reply {
        MessageReply::BeginSystemMove => window.drag_window(),
        MessageReply::BeginSystemResize(edge) => window.drag_resize_window(edge.into()),
        MessageReply::ToggleMaximize => {
            window.set_maximized(!window.is_maximized());
            Ok(())
        }
        MessageReply::ShowSystemMenu(pos) => {
            window.show_window_menu(PhysicalPosition::new(pos.x, pos.y));
            Ok(())
        }
        MessageReply::ClientArea { .. } | MessageReply::HitTest(_) | MessageReply::SuppressPaint => {
            return false;
        }
    };
    if let Err(err) = result {
        tracing::warn!(target: targets::BACKEND, window = %handle, ?reply, error = %err, "winit window action failed");
        return false;
    }
    true
}

/// The window's state as winit reports it.
pub fn window_state(window: &Window) -> WindowState {
    if window.is_minimized() == Some(true) {
        WindowState::Minimized
    } else if window.fullscreen().is_some() {
        WindowState::FullScreen
    } else if window.is_maximized() {
        WindowState::Maximized
    } else {
        WindowState::Normal
    }
}

fn window_size(window: &Window) -> Size {
    let size = window.inner_size();
    Size::from((size.width, size.height))
}

fn physical_to_point(position: PhysicalPosition<f64>) -> Point {
    Point::new(position.x.round() as i32, position.y.round() as i32)
}

/// Map a winit button event to a chrome pointer event.
pub fn pointer_input(button: MouseButton, state: ElementState) -> Option<(PointerButton, PointerAction)> {
    let button = match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Right => PointerButton::Right,
        _ => return None,
    };
    let action = match state {
        ElementState::Pressed => PointerAction::Press,
        ElementState::Released => PointerAction::Release,
    };
    Some((button, action))
}

/// DPI equivalent of a winit scale factor.
pub fn dpi_for_scale_factor(scale_factor: f64) -> u32 {
    (scale_factor * f64::from(REFERENCE_DPI)).round().max(1.0) as u32
}
