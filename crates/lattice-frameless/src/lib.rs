//! Frameless window chrome for Lattice.
//!
//! This crate lets an application draw its own title bar and borders while
//! keeping everything the OS does for decorated windows: drag-to-move,
//! edge and corner resizing, snapping, maximize/restore, drop shadows,
//! per-monitor DPI and auto-hide taskbar access.
//!
//! - **Metrics** ([`metrics`]): DPI-aware resize border, caption and title
//!   bar sizes, with override and fallback tiers
//! - **Hit-testing** ([`hit_test`]): maps a pointer position to a
//!   [`ChromeRegion`]
//! - **Client area** ([`client_area`]): the insets that remove the native
//!   chrome and compensate for maximize overshoot and auto-hide taskbars
//! - **Interception** ([`ChromeEngine::dispatch`]): decides which native
//!   messages are fully handled and which continue to the OS
//! - **Registry** ([`registry`]): the windows opted into frameless behavior
//! - **State machine** ([`state_machine`]): one refresh pass per state
//!   notification
//! - **Backends** ([`backend`]): Windows, X11, macOS and an in-memory
//!   backend for tests
//!
//! # Example
//!
//! ```ignore
//! use lattice_frameless::{EngineOptions, SystemButtonId, WindowChromeConfig, WindowHandle};
//! use lattice_frameless_core::Rect;
//!
//! let engine = lattice_frameless::initialize(EngineOptions::default());
//!
//! let handle = WindowHandle::for_window(&window)?;
//! let config = WindowChromeConfig::new()
//!     .with_title_bar_height(32)
//!     .with_ignored_region(Rect::new(8, 4, 160, 24))
//!     .with_system_button(SystemButtonId::Close, Rect::new(754, 0, 46, 32));
//! engine.register_window(handle, config);
//!
//! engine.window_state_changed().connect(|(window, state)| {
//!     tracing::info!(%window, ?state, "window state changed");
//! });
//! ```

pub mod backend;
mod chrome;
pub mod client_area;
pub mod config;
pub mod event;
pub mod handle;
mod interceptor;
pub mod metrics;
pub mod region;
pub mod registry;
pub mod state;
pub mod state_machine;
pub mod theme;
#[cfg(feature = "winit")]
pub mod winit_bridge;

pub use backend::{HeadlessBackend, PlatformChromeBackend};
pub use chrome::{ChromeEngine, initialize, initialize_with_backend, instance, shutdown, try_instance};
pub use client_area::{ClientInsets, RedrawHint};
pub use config::{EngineOptions, MetricOverrides, WindowChromeConfig};
pub use event::{ChromeMessage, DefaultProcessing, Disposition, MessageReply, NoDefaultProcessing};
pub use handle::WindowHandle;
pub use metrics::{Axis, ChromeMetrics, Scaling};
pub use region::{ChromeRegion, ResizeEdge, SystemButtonId};
pub use state::{WindowRuntimeState, WindowState};
pub use state_machine::{ChromeRenderer, FrameBorder, MaximizeAffordance};
pub use theme::{ColorScheme, RgbColor, ThemeInfo};

pub use lattice_frameless_core::{Capability, ChromeError, ChromeResult, Insets, Point, Rect, Size};
