//! Client-area computation.
//!
//! When the OS asks for a window's client rectangle, the engine answers with
//! the proposed window rectangle shrunk by a set of [`Insets`]. A `Normal`
//! window reserves nothing, which removes the native caption and border
//! entirely. A maximized window reserves the resize border on every side,
//! because the OS positions it that far beyond the monitor's work area.
//!
//! An auto-hide taskbar is only revealed when the pointer reaches the
//! monitor edge, and a maximized or fullscreen window covering that edge
//! would swallow the pointer. Such windows give up a thin strip on every
//! edge that hosts an auto-hide taskbar.

use lattice_frameless_core::logging::targets;
use lattice_frameless_core::{ChromeError, Insets, Rect, log_capability_absent};

use crate::backend::{PlatformChromeBackend, TaskbarEdge, TaskbarEdges};
use crate::handle::WindowHandle;
use crate::metrics::ChromeMetrics;
use crate::state::WindowState;

/// How the OS should treat existing window content after a client-area change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawHint {
    /// Invalidate everything.
    RedrawAll,
    /// Keep the existing pixels; the caller repaints itself.
    NoRedraw,
}

impl RedrawHint {
    /// Zero insets redraw everything, anything else asks for no redraw.
    pub fn for_insets(insets: &Insets) -> Self {
        if insets.is_zero() {
            RedrawHint::RedrawAll
        } else {
            RedrawHint::NoRedraw
        }
    }
}

/// Result of a client-area computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInsets {
    pub insets: Insets,
    pub redraw: RedrawHint,
}

impl ClientInsets {
    pub fn new(insets: Insets) -> Self {
        Self {
            insets,
            redraw: RedrawHint::for_insets(&insets),
        }
    }

    /// Shrink `proposed` to the client rectangle.
    pub fn apply(&self, proposed: Rect) -> Rect {
        self.insets.apply(proposed)
    }
}

/// Client insets for a frameless window.
///
/// `metrics` must be in device pixels. `auto_hide` lists the monitor edges
/// hosting an auto-hide taskbar; it only matters while zoomed.
pub fn compute_client_insets(
    window_state: WindowState,
    metrics: &ChromeMetrics,
    auto_hide: TaskbarEdges,
    reveal_strip: i32,
) -> ClientInsets {
    let insets = match window_state {
        WindowState::Normal | WindowState::Minimized => Insets::ZERO,
        WindowState::Maximized => {
            let border = Insets::new(
                metrics.resize_border_y,
                metrics.resize_border_y,
                metrics.resize_border_x,
                metrics.resize_border_x,
            );
            reserve_reveal_strip(border, auto_hide, reveal_strip)
        }
        WindowState::FullScreen => reserve_reveal_strip(Insets::ZERO, auto_hide, reveal_strip),
    };
    ClientInsets::new(insets)
}

/// Client insets when the native frame is preserved.
///
/// `native` is what the OS computed through default processing. Left, right
/// and bottom are kept as-is; only the top is overridden so the native
/// caption disappears.
pub fn preserve_native_insets(
    native: Insets,
    window_state: WindowState,
    metrics: &ChromeMetrics,
) -> ClientInsets {
    let top = match window_state {
        WindowState::Maximized => metrics.resize_border_y,
        _ => 0,
    };
    ClientInsets::new(Insets { top, ..native })
}

fn reserve_reveal_strip(mut insets: Insets, edges: TaskbarEdges, strip: i32) -> Insets {
    let strip = strip.max(0);
    for edge in edges.iter() {
        match edge {
            TaskbarEdge::Top => insets.top += strip,
            TaskbarEdge::Bottom => insets.bottom += strip,
            TaskbarEdge::Left => insets.left += strip,
            TaskbarEdge::Right => insets.right += strip,
        }
    }
    insets
}

/// Find the monitor edges hosting an auto-hide taskbar.
///
/// Tries the backend's per-edge query first. When that is unavailable, falls
/// back to the legacy placement query and infers a single edge from the
/// taskbar's position on the monitor. Never fails; any error yields no edges.
pub fn detect_auto_hide_taskbar(
    backend: &dyn PlatformChromeBackend,
    window: WindowHandle,
) -> TaskbarEdges {
    match backend.auto_hide_taskbar_edges(window) {
        Ok(edges) => {
            if edges.len() > 1 {
                tracing::debug!(
                    target: targets::CLIENT_AREA,
                    %window,
                    ?edges,
                    "auto-hide taskbars on several edges, reserving all of them"
                );
            }
            return edges;
        }
        Err(err) => note_failure(&err, "auto-hide taskbar query"),
    }

    match backend.taskbar_placement(window) {
        Ok(Some(placement)) if placement.auto_hide && placement.same_monitor => {
            match infer_taskbar_edge(placement.taskbar_rect, placement.monitor_rect) {
                Some(edge) => TaskbarEdges::only(edge),
                None => {
                    tracing::debug!(
                        target: targets::CLIENT_AREA,
                        %window,
                        taskbar = ?placement.taskbar_rect,
                        monitor = ?placement.monitor_rect,
                        "could not infer taskbar edge"
                    );
                    TaskbarEdges::NONE
                }
            }
        }
        Ok(_) => TaskbarEdges::NONE,
        Err(err) => {
            note_failure(&err, "taskbar placement query");
            TaskbarEdges::NONE
        }
    }
}

/// Which monitor edge a taskbar rectangle is docked to.
///
/// A taskbar spanning the monitor's width sits on the top or bottom edge;
/// one spanning the height sits on the left or right edge.
pub fn infer_taskbar_edge(taskbar: Rect, monitor: Rect) -> Option<TaskbarEdge> {
    let spans_width = taskbar.left() <= monitor.left() && taskbar.right() >= monitor.right();
    let spans_height = taskbar.top() <= monitor.top() && taskbar.bottom() >= monitor.bottom();

    match (spans_width, spans_height) {
        (true, false) if taskbar.top() <= monitor.top() => Some(TaskbarEdge::Top),
        (true, false) if taskbar.bottom() >= monitor.bottom() => Some(TaskbarEdge::Bottom),
        (false, true) if taskbar.left() <= monitor.left() => Some(TaskbarEdge::Left),
        (false, true) if taskbar.right() >= monitor.right() => Some(TaskbarEdge::Right),
        _ => None,
    }
}

fn note_failure(err: &ChromeError, what: &str) {
    match err.absent_capability() {
        Some(capability) => {
            log_capability_absent(capability);
        }
        None => {
            tracing::warn!(target: targets::CLIENT_AREA, error = %err, what, "taskbar query failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, TaskbarPlacement};
    use lattice_frameless_core::Capability;

    const STRIP: i32 = 2;

    fn metrics() -> ChromeMetrics {
        ChromeMetrics::new(8, 31)
    }

    #[test]
    fn test_normal_is_zero_and_redraws_all() {
        let result = compute_client_insets(WindowState::Normal, &metrics(), TaskbarEdges::NONE, STRIP);
        assert_eq!(result.insets, Insets::ZERO);
        assert_eq!(result.redraw, RedrawHint::RedrawAll);
    }

    #[test]
    fn test_normal_ignores_auto_hide_taskbar() {
        let edges = TaskbarEdges::only(TaskbarEdge::Bottom);
        let result = compute_client_insets(WindowState::Normal, &metrics(), edges, STRIP);
        assert_eq!(result.insets, Insets::ZERO);
    }

    #[test]
    fn test_maximized_reserves_resize_border() {
        let result =
            compute_client_insets(WindowState::Maximized, &metrics(), TaskbarEdges::NONE, STRIP);
        assert_eq!(result.insets, Insets::uniform(8));
        assert_eq!(result.redraw, RedrawHint::NoRedraw);

        let proposed = Rect::new(-8, -8, 1936, 1056);
        assert_eq!(result.apply(proposed), Rect::new(0, 0, 1920, 1040));
    }

    #[test]
    fn test_round_trip_has_no_drift() {
        let m = metrics();
        let before = compute_client_insets(WindowState::Normal, &m, TaskbarEdges::NONE, STRIP);
        let _ = compute_client_insets(WindowState::Maximized, &m, TaskbarEdges::NONE, STRIP);
        let after = compute_client_insets(WindowState::Normal, &m, TaskbarEdges::NONE, STRIP);
        assert_eq!(before, after);
        assert!(after.insets.is_zero());
    }

    #[test]
    fn test_full_screen_reserves_reveal_strip() {
        let edges = TaskbarEdges::only(TaskbarEdge::Left);
        let result = compute_client_insets(WindowState::FullScreen, &metrics(), edges, STRIP);
        assert_eq!(result.insets, Insets::new(0, 0, 2, 0));
        assert_eq!(result.redraw, RedrawHint::NoRedraw);

        let none =
            compute_client_insets(WindowState::FullScreen, &metrics(), TaskbarEdges::NONE, STRIP);
        assert_eq!(none.insets, Insets::ZERO);
        assert_eq!(none.redraw, RedrawHint::RedrawAll);
    }

    #[test]
    fn test_maximized_with_taskbars_on_two_edges() {
        let edges: TaskbarEdges = [TaskbarEdge::Top, TaskbarEdge::Right].into_iter().collect();
        let result = compute_client_insets(WindowState::Maximized, &metrics(), edges, STRIP);
        assert_eq!(result.insets, Insets::new(10, 8, 8, 10));
    }

    #[test]
    fn test_preserve_native_frame_overrides_top_only() {
        let native = Insets::new(31, 8, 8, 8);

        let normal = preserve_native_insets(native, WindowState::Normal, &metrics());
        assert_eq!(normal.insets, Insets::new(0, 8, 8, 8));

        let maximized = preserve_native_insets(native, WindowState::Maximized, &metrics());
        assert_eq!(maximized.insets, Insets::new(8, 8, 8, 8));
    }

    #[test]
    fn test_infer_taskbar_edge() {
        let monitor = Rect::new(0, 0, 1920, 1080);
        assert_eq!(
            infer_taskbar_edge(Rect::new(0, 1040, 1920, 40), monitor),
            Some(TaskbarEdge::Bottom)
        );
        assert_eq!(
            infer_taskbar_edge(Rect::new(0, 0, 1920, 40), monitor),
            Some(TaskbarEdge::Top)
        );
        assert_eq!(
            infer_taskbar_edge(Rect::new(0, 0, 60, 1080), monitor),
            Some(TaskbarEdge::Left)
        );
        assert_eq!(
            infer_taskbar_edge(Rect::new(1860, 0, 60, 1080), monitor),
            Some(TaskbarEdge::Right)
        );
        assert_eq!(infer_taskbar_edge(Rect::new(500, 500, 60, 60), monitor), None);
    }

    #[test]
    fn test_infer_on_secondary_monitor() {
        let monitor = Rect::new(1920, 0, 2560, 1440);
        assert_eq!(
            infer_taskbar_edge(Rect::new(1920, 1392, 2560, 48), monitor),
            Some(TaskbarEdge::Bottom)
        );
    }

    #[test]
    fn test_detect_prefers_direct_query() {
        let backend = HeadlessBackend::new();
        let window = WindowHandle::from_raw(3);
        backend.set_auto_hide_taskbar_edges(Ok(TaskbarEdges::only(TaskbarEdge::Top)));
        backend.set_taskbar_placement(Ok(Some(TaskbarPlacement {
            taskbar_rect: Rect::new(0, 1040, 1920, 40),
            monitor_rect: Rect::new(0, 0, 1920, 1080),
            auto_hide: true,
            same_monitor: true,
        })));

        assert_eq!(
            detect_auto_hide_taskbar(&backend, window),
            TaskbarEdges::only(TaskbarEdge::Top)
        );
    }

    #[test]
    fn test_detect_falls_back_to_placement() {
        let backend = HeadlessBackend::new();
        let window = WindowHandle::from_raw(3);
        backend.set_auto_hide_taskbar_edges(Err(ChromeError::CapabilityAbsent(
            Capability::AutoHideTaskbarEdges,
        )));
        let mut placement = TaskbarPlacement {
            taskbar_rect: Rect::new(0, 1040, 1920, 40),
            monitor_rect: Rect::new(0, 0, 1920, 1080),
            auto_hide: true,
            same_monitor: true,
        };
        backend.set_taskbar_placement(Ok(Some(placement)));
        assert_eq!(
            detect_auto_hide_taskbar(&backend, window),
            TaskbarEdges::only(TaskbarEdge::Bottom)
        );

        placement.same_monitor = false;
        backend.set_taskbar_placement(Ok(Some(placement)));
        assert!(detect_auto_hide_taskbar(&backend, window).is_empty());

        placement.same_monitor = true;
        placement.auto_hide = false;
        backend.set_taskbar_placement(Ok(Some(placement)));
        assert!(detect_auto_hide_taskbar(&backend, window).is_empty());
    }

    #[test]
    fn test_detect_tolerates_failures() {
        let backend = HeadlessBackend::new();
        let window = WindowHandle::from_raw(3);
        backend.set_auto_hide_taskbar_edges(Err(ChromeError::platform("SHAppBarMessage", "failed")));
        backend.set_taskbar_placement(Err(ChromeError::platform("FindWindowW", "not found")));
        assert!(detect_auto_hide_taskbar(&backend, window).is_empty());
    }
}
