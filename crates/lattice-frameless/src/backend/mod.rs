//! Platform chrome backends.
//!
//! The classifier, client-area rewriter, registry and state machine are
//! platform-agnostic. Everything that needs the native windowing system goes
//! through [`PlatformChromeBackend`], with one implementation per platform:
//!
//! - **Windows**: [`win32::WindowsBackend`] subclasses each registered
//!   window and answers non-client messages directly.
//! - **Linux/X11**: [`x11::X11Backend`] speaks EWMH client messages through
//!   `x11rb`; pointer events arrive through the winit bridge.
//! - **macOS**: [`macos::MacosBackend`] configures `NSWindow` for a
//!   full-size content view; pointer events arrive through the winit bridge.
//! - **Anywhere**: [`headless::HeadlessBackend`] keeps everything in memory
//!   and is what the test suite drives.
//!
//! [`platform_backend`] picks the implementation for the target at build time.

use std::fmt;

use lattice_frameless_core::{ChromeResult, Point, Rect};

use crate::event::EnvironmentChange;
use crate::handle::WindowHandle;
use crate::region::ResizeEdge;
use crate::theme::RgbColor;

pub mod headless;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "windows")]
pub mod win32;
#[cfg(target_os = "linux")]
pub mod x11;

pub use headless::{BackendCall, HeadlessBackend};

/// A system metric the backend may be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemMetric {
    /// Resize border thickness on the left and right edges.
    ResizeBorderHorizontal,
    /// Resize border thickness on the top and bottom edges.
    ResizeBorderVertical,
    /// Height of the caption, excluding the resize border.
    CaptionHeight,
    /// Thickness of the one-pixel decorative frame border.
    FrameBorder,
}

impl SystemMetric {
    pub const ALL: [SystemMetric; 4] = [
        SystemMetric::ResizeBorderHorizontal,
        SystemMetric::ResizeBorderVertical,
        SystemMetric::CaptionHeight,
        SystemMetric::FrameBorder,
    ];

    /// Position in [`SystemMetric::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A screen edge an auto-hide taskbar can be docked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskbarEdge {
    Top,
    Bottom,
    Left,
    Right,
}

impl TaskbarEdge {
    pub const ALL: [TaskbarEdge; 4] = [
        TaskbarEdge::Top,
        TaskbarEdge::Bottom,
        TaskbarEdge::Left,
        TaskbarEdge::Right,
    ];

    const fn bit(self) -> u8 {
        match self {
            TaskbarEdge::Top => 1,
            TaskbarEdge::Bottom => 2,
            TaskbarEdge::Left => 4,
            TaskbarEdge::Right => 8,
        }
    }
}

/// The set of monitor edges that host an auto-hide taskbar.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TaskbarEdges(u8);

impl TaskbarEdges {
    /// No auto-hide taskbar.
    pub const NONE: Self = Self(0);

    /// A set holding a single edge.
    pub const fn only(edge: TaskbarEdge) -> Self {
        Self(edge.bit())
    }

    pub fn insert(&mut self, edge: TaskbarEdge) {
        self.0 |= edge.bit();
    }

    pub fn contains(&self, edge: TaskbarEdge) -> bool {
        self.0 & edge.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskbarEdge> + '_ {
        TaskbarEdge::ALL
            .into_iter()
            .filter(move |edge| self.contains(*edge))
    }
}

impl FromIterator<TaskbarEdge> for TaskbarEdges {
    fn from_iter<I: IntoIterator<Item = TaskbarEdge>>(iter: I) -> Self {
        let mut edges = TaskbarEdges::NONE;
        for edge in iter {
            edges.insert(edge);
        }
        edges
    }
}

impl fmt::Debug for TaskbarEdges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Where the shell's taskbar sits, as reported by the legacy query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskbarPlacement {
    /// The taskbar window's rectangle in screen coordinates.
    pub taskbar_rect: Rect,
    /// The rectangle of the monitor hosting our window.
    pub monitor_rect: Rect,
    /// Whether the taskbar is set to auto-hide.
    pub auto_hide: bool,
    /// Whether the taskbar lives on the same monitor as our window.
    pub same_monitor: bool,
}

/// What the backend needs to know when normalizing a window's native style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleRequest {
    pub preserve_native_frame: bool,
    pub fixed_size: bool,
}

/// Platform capability interface used by the chrome engine.
///
/// Every method that talks to the OS returns a [`ChromeResult`]. A
/// [`ChromeError::CapabilityAbsent`](lattice_frameless_core::ChromeError::CapabilityAbsent)
/// moves the engine to its next fallback tier; any other error falls back
/// to the last known good value.
///
/// The engine holds no lock while calling into the backend, so an
/// implementation may synchronously trigger native messages that are
/// dispatched back into the engine (Win32 `SetWindowPos` does exactly that).
pub trait PlatformChromeBackend: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether the backend receives the native message stream itself.
    ///
    /// When `true`, pointer handling (move/resize initiation) happens in the
    /// OS through hit-test codes, and toolkit events must not be fed to the
    /// engine a second time.
    fn intercepts_native_messages(&self) -> bool {
        false
    }

    /// Install the native message hook for a newly registered window.
    fn attach(&self, _window: WindowHandle) -> ChromeResult<()> {
        Ok(())
    }

    /// Remove the native message hook.
    fn detach(&self, _window: WindowHandle) -> ChromeResult<()> {
        Ok(())
    }

    /// DPI reported for the window itself.
    fn window_dpi(&self, window: WindowHandle) -> ChromeResult<u32>;

    /// Effective DPI of the monitor that hosts the window.
    fn monitor_dpi(&self, window: WindowHandle) -> ChromeResult<u32>;

    /// System-wide DPI.
    fn system_dpi(&self) -> ChromeResult<u32>;

    /// A fixed platform value for `metric`, in unscaled pixels.
    ///
    /// Backends return `None` when the value must be queried.
    fn platform_default_metric(&self, _metric: SystemMetric) -> Option<i32> {
        None
    }

    /// Query `metric` from the OS, in device pixels at `dpi`.
    fn query_system_metric(&self, metric: SystemMetric, dpi: u32) -> ChromeResult<i32>;

    /// Direct per-edge auto-hide taskbar query for the window's monitor.
    fn auto_hide_taskbar_edges(&self, window: WindowHandle) -> ChromeResult<TaskbarEdges>;

    /// Legacy taskbar placement query.
    fn taskbar_placement(&self, window: WindowHandle) -> ChromeResult<Option<TaskbarPlacement>>;

    /// Whether the OS's own border rendering is suppressed for this window.
    fn native_border_suppressed(&self, window: WindowHandle) -> bool;

    /// Restore a known-good base style, then apply the frameless flags.
    ///
    /// Must be safe to call more than once.
    fn normalize_window_style(&self, window: WindowHandle, request: StyleRequest) -> ChromeResult<()>;

    /// Make the OS re-run its client-area computation for the window.
    fn refresh_frame(&self, window: WindowHandle) -> ChromeResult<()>;

    /// Start an interactive move. `pos` is window-local.
    fn start_system_move(&self, window: WindowHandle, pos: Point) -> ChromeResult<()>;

    /// Start an interactive resize from `edge`. `pos` is window-local.
    fn start_system_resize(
        &self,
        window: WindowHandle,
        edge: ResizeEdge,
        pos: Point,
    ) -> ChromeResult<()>;

    /// Toggle between maximized and restored.
    fn toggle_maximized(&self, window: WindowHandle) -> ChromeResult<()>;

    /// Open the native window menu at the window-local `pos`.
    fn show_system_menu(&self, window: WindowHandle, pos: Point) -> ChromeResult<()>;

    /// The system accent color.
    fn accent_color(&self) -> ChromeResult<RgbColor>;

    /// A theme, colorization or DPI change reached the engine.
    ///
    /// Backends drop any platform values they cache.
    fn environment_changed(&self, _change: EnvironmentChange) {}
}

/// Create the backend for the platform this crate was built for.
pub fn platform_backend() -> Box<dyn PlatformChromeBackend> {
    #[cfg(target_os = "windows")]
    {
        Box::new(win32::WindowsBackend::new())
    }

    #[cfg(target_os = "linux")]
    {
        Box::new(x11::X11Backend::new())
    }

    #[cfg(target_os = "macos")]
    {
        Box::new(macos::MacosBackend::new())
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        Box::new(HeadlessBackend::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taskbar_edges_set() {
        let mut edges = TaskbarEdges::NONE;
        assert!(edges.is_empty());

        edges.insert(TaskbarEdge::Bottom);
        edges.insert(TaskbarEdge::Left);
        edges.insert(TaskbarEdge::Bottom);

        assert_eq!(edges.len(), 2);
        assert!(edges.contains(TaskbarEdge::Left));
        assert!(!edges.contains(TaskbarEdge::Top));
        assert_eq!(
            edges.iter().collect::<Vec<_>>(),
            vec![TaskbarEdge::Bottom, TaskbarEdge::Left]
        );
    }

    #[test]
    fn test_metric_indices_match_table() {
        for (i, metric) in SystemMetric::ALL.into_iter().enumerate() {
            assert_eq!(metric.index(), i);
        }
    }
}
