//! macOS backend.
//!
//! AppKit keeps its own window frame, shadow and edge resizing, so
//! "frameless" here means a full-size content view under a transparent,
//! title-less title bar with the traffic-light buttons hidden. Window
//! handles are the `NSView` pointers winit reports; every call resolves the
//! owning `NSWindow` first.
//!
//! AppKit must be driven from the main thread. Calls from any other thread
//! fail with a platform error instead of touching the window.

use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{MainThreadMarker, class, msg_send};
use objc2_app_kit::NSWindow;

use lattice_frameless_core::logging::targets;
use lattice_frameless_core::{Capability, ChromeError, ChromeResult, Point};

use super::{PlatformChromeBackend, StyleRequest, SystemMetric, TaskbarEdges, TaskbarPlacement};
use crate::handle::WindowHandle;
use crate::metrics::REFERENCE_DPI;
use crate::region::ResizeEdge;
use crate::theme::RgbColor;

// NSWindowStyleMask
const STYLE_RESIZABLE: usize = 1 << 3;
const STYLE_FULL_SIZE_CONTENT_VIEW: usize = 1 << 15;

const TITLE_VISIBLE: isize = 0;
const TITLE_HIDDEN: isize = 1;

// NSWindowButton
const CLOSE_BUTTON: isize = 0;
const MINIATURIZE_BUTTON: isize = 1;
const ZOOM_BUTTON: isize = 2;

/// Height of the standard title bar, in points.
const TITLE_BAR_POINTS: i32 = 28;

fn dpi_for_backing_scale(scale: f64) -> u32 {
    (scale * f64::from(REFERENCE_DPI)).round().max(1.0) as u32
}

fn style_mask(current: usize, request: StyleRequest) -> usize {
    let mut mask = current;
    if request.preserve_native_frame {
        mask &= !STYLE_FULL_SIZE_CONTENT_VIEW;
    } else {
        mask |= STYLE_FULL_SIZE_CONTENT_VIEW;
    }
    if request.fixed_size {
        mask &= !STYLE_RESIZABLE;
    } else {
        mask |= STYLE_RESIZABLE;
    }
    mask
}

fn main_thread(api: &'static str) -> ChromeResult<MainThreadMarker> {
    MainThreadMarker::new().ok_or_else(|| ChromeError::platform(api, "must be called on the main thread"))
}

/// Resolve the `NSWindow` that owns the handle's `NSView`.
fn ns_window(window: WindowHandle) -> ChromeResult<Retained<NSWindow>> {
    let ns_view = window.as_raw() as usize as *mut AnyObject;
    if ns_view.is_null() {
        return Err(ChromeError::InvalidHandle(window.as_raw()));
    }
    // SAFETY: the handle is an NSView pointer handed out by the windowing
    // toolkit; `window` returns its owning NSWindow or nil.
    unsafe {
        let ns_window: *mut NSWindow = msg_send![ns_view, window];
        Retained::retain(ns_window).ok_or(ChromeError::InvalidHandle(window.as_raw()))
    }
}

/// [`PlatformChromeBackend`] for AppKit.
#[derive(Debug, Default)]
pub struct MacosBackend {
    _private: (),
}

impl MacosBackend {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl PlatformChromeBackend for MacosBackend {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn window_dpi(&self, window: WindowHandle) -> ChromeResult<u32> {
        main_thread("backingScaleFactor")?;
        let ns_window = ns_window(window)?;
        // SAFETY: plain property read on a live window.
        let scale: f64 = unsafe { msg_send![&ns_window, backingScaleFactor] };
        Ok(dpi_for_backing_scale(scale))
    }

    fn monitor_dpi(&self, window: WindowHandle) -> ChromeResult<u32> {
        main_thread("backingScaleFactor")?;
        let ns_window = ns_window(window)?;
        // SAFETY: `screen` returns nil for off-screen windows, checked below.
        unsafe {
            let screen: *mut AnyObject = msg_send![&ns_window, screen];
            if screen.is_null() {
                return Err(ChromeError::CapabilityAbsent(Capability::MonitorDpi));
            }
            let scale: f64 = msg_send![screen, backingScaleFactor];
            Ok(dpi_for_backing_scale(scale))
        }
    }

    fn system_dpi(&self) -> ChromeResult<u32> {
        main_thread("backingScaleFactor")?;
        // SAFETY: `mainScreen` returns nil without a display, checked below.
        unsafe {
            let screen: *mut AnyObject = msg_send![class!(NSScreen), mainScreen];
            if screen.is_null() {
                return Err(ChromeError::CapabilityAbsent(Capability::SystemDpi));
            }
            let scale: f64 = msg_send![screen, backingScaleFactor];
            Ok(dpi_for_backing_scale(scale))
        }
    }

    fn platform_default_metric(&self, metric: SystemMetric) -> Option<i32> {
        match metric {
            // AppKit resizes from the window edge itself
            SystemMetric::ResizeBorderHorizontal | SystemMetric::ResizeBorderVertical => Some(0),
            SystemMetric::CaptionHeight => Some(TITLE_BAR_POINTS),
            SystemMetric::FrameBorder => Some(1),
        }
    }

    fn query_system_metric(&self, _metric: SystemMetric, _dpi: u32) -> ChromeResult<i32> {
        Err(ChromeError::CapabilityAbsent(Capability::DpiAwareMetrics))
    }

    fn auto_hide_taskbar_edges(&self, _window: WindowHandle) -> ChromeResult<TaskbarEdges> {
        Err(ChromeError::CapabilityAbsent(Capability::AutoHideTaskbarEdges))
    }

    fn taskbar_placement(&self, _window: WindowHandle) -> ChromeResult<Option<TaskbarPlacement>> {
        Err(ChromeError::CapabilityAbsent(Capability::TaskbarPlacement))
    }

    fn native_border_suppressed(&self, _window: WindowHandle) -> bool {
        false
    }

    fn normalize_window_style(&self, window: WindowHandle, request: StyleRequest) -> ChromeResult<()> {
        main_thread("setStyleMask")?;
        let ns_window = ns_window(window)?;
        let frameless = !request.preserve_native_frame;

        // SAFETY: property writes on a live window from the main thread.
        unsafe {
            let current: usize = msg_send![&ns_window, styleMask];
            let _: () = msg_send![&ns_window, setStyleMask: style_mask(current, request)];
            let _: () = msg_send![&ns_window, setTitlebarAppearsTransparent: frameless];
            let visibility = if frameless { TITLE_HIDDEN } else { TITLE_VISIBLE };
            let _: () = msg_send![&ns_window, setTitleVisibility: visibility];

            for button in [CLOSE_BUTTON, MINIATURIZE_BUTTON, ZOOM_BUTTON] {
                let button: *mut AnyObject = msg_send![&ns_window, standardWindowButton: button];
                if !button.is_null() {
                    let _: () = msg_send![button, setHidden: frameless];
                }
            }
        }
        tracing::debug!(target: targets::BACKEND, %window, ?request, "window style normalized");
        Ok(())
    }

    fn refresh_frame(&self, _window: WindowHandle) -> ChromeResult<()> {
        // The content view already spans the frame
        Ok(())
    }

    fn start_system_move(&self, window: WindowHandle, _pos: Point) -> ChromeResult<()> {
        main_thread("performWindowDragWithEvent")?;
        let ns_window = ns_window(window)?;
        // SAFETY: the drag needs the mouse-down event being dispatched;
        // `currentEvent` is nil outside event handling, checked below.
        unsafe {
            let app: *mut AnyObject = msg_send![class!(NSApplication), sharedApplication];
            let event: *mut AnyObject = msg_send![app, currentEvent];
            if event.is_null() {
                return Err(ChromeError::platform(
                    "performWindowDragWithEvent",
                    "no event is being dispatched",
                ));
            }
            let _: () = msg_send![&ns_window, performWindowDragWithEvent: event];
        }
        Ok(())
    }

    fn start_system_resize(
        &self,
        _window: WindowHandle,
        _edge: ResizeEdge,
        _pos: Point,
    ) -> ChromeResult<()> {
        Err(ChromeError::CapabilityAbsent(Capability::SystemResize))
    }

    fn toggle_maximized(&self, window: WindowHandle) -> ChromeResult<()> {
        main_thread("zoom")?;
        let ns_window = ns_window(window)?;
        // SAFETY: `zoom:` accepts a nil sender.
        unsafe {
            let _: () = msg_send![&ns_window, zoom: std::ptr::null::<AnyObject>()];
        }
        Ok(())
    }

    fn show_system_menu(&self, _window: WindowHandle, _pos: Point) -> ChromeResult<()> {
        Err(ChromeError::CapabilityAbsent(Capability::SystemMenu))
    }

    fn accent_color(&self) -> ChromeResult<RgbColor> {
        use objc2_app_kit::{NSColor, NSColorSpace};

        let accent = NSColor::controlAccentColor();
        let srgb_space = NSColorSpace::sRGBColorSpace();
        let converted = accent
            .colorUsingColorSpace(&srgb_space)
            .ok_or(ChromeError::CapabilityAbsent(Capability::AccentColor))?;

        Ok(RgbColor::new(
            (converted.redComponent() * 255.0) as u8,
            (converted.greenComponent() * 255.0) as u8,
            (converted.blueComponent() * 255.0) as u8,
        ))
    }
}
