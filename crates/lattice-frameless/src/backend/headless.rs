//! In-memory backend.
//!
//! Serves configurable answers for every query and records every action it
//! is asked to perform. Used by the test suite, and as the backend on
//! platforms without a native implementation.

use std::sync::Arc;

use parking_lot::Mutex;

use lattice_frameless_core::{Capability, ChromeError, ChromeResult, Point};

use super::{
    PlatformChromeBackend, StyleRequest, SystemMetric, TaskbarEdges, TaskbarPlacement,
};
use crate::event::EnvironmentChange;
use crate::handle::WindowHandle;
use crate::metrics::REFERENCE_DPI;
use crate::region::ResizeEdge;
use crate::theme::RgbColor;

/// An action the engine asked the backend to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    Attach(WindowHandle),
    Detach(WindowHandle),
    NormalizeStyle(WindowHandle, StyleRequest),
    RefreshFrame(WindowHandle),
    StartMove(WindowHandle, Point),
    StartResize(WindowHandle, ResizeEdge, Point),
    ToggleMaximized(WindowHandle),
    ShowSystemMenu(WindowHandle, Point),
    EnvironmentChanged(EnvironmentChange),
}

type RefreshHook = Arc<dyn Fn(WindowHandle) + Send + Sync>;

struct HeadlessState {
    window_dpi: Option<u32>,
    monitor_dpi: Option<u32>,
    system_dpi: Option<u32>,
    platform_defaults: [Option<i32>; 4],
    system_metrics: [ChromeResult<i32>; 4],
    taskbar_edges: ChromeResult<TaskbarEdges>,
    taskbar_placement: ChromeResult<Option<TaskbarPlacement>>,
    native_border_suppressed: bool,
    intercepts_native_messages: bool,
    accent_color: Option<RgbColor>,
    refresh_hook: Option<RefreshHook>,
    calls: Vec<BackendCall>,
}

/// A [`PlatformChromeBackend`] that never touches the OS.
///
/// Defaults: every DPI tier reports 96, system metrics are unavailable (so
/// the engine's fallback constants apply), no auto-hide taskbar, native
/// border suppressed, no accent color.
pub struct HeadlessBackend {
    state: Mutex<HeadlessState>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        let absent = || Err(ChromeError::CapabilityAbsent(Capability::DpiAwareMetrics));
        Self {
            state: Mutex::new(HeadlessState {
                window_dpi: Some(REFERENCE_DPI),
                monitor_dpi: Some(REFERENCE_DPI),
                system_dpi: Some(REFERENCE_DPI),
                platform_defaults: [None; 4],
                system_metrics: [absent(), absent(), absent(), absent()],
                taskbar_edges: Ok(TaskbarEdges::NONE),
                taskbar_placement: Ok(None),
                native_border_suppressed: true,
                intercepts_native_messages: false,
                accent_color: None,
                refresh_hook: None,
                calls: Vec::new(),
            }),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// `None` makes the tier unavailable.
    pub fn set_window_dpi(&self, dpi: Option<u32>) {
        self.state.lock().window_dpi = dpi;
    }

    pub fn set_monitor_dpi(&self, dpi: Option<u32>) {
        self.state.lock().monitor_dpi = dpi;
    }

    pub fn set_system_dpi(&self, dpi: Option<u32>) {
        self.state.lock().system_dpi = dpi;
    }

    pub fn set_platform_default(&self, metric: SystemMetric, px: Option<i32>) {
        self.state.lock().platform_defaults[metric.index()] = px;
    }

    /// Answer for [`query_system_metric`](PlatformChromeBackend::query_system_metric),
    /// in unscaled pixels.
    pub fn set_system_metric(&self, metric: SystemMetric, result: ChromeResult<i32>) {
        self.state.lock().system_metrics[metric.index()] = result;
    }

    pub fn set_auto_hide_taskbar_edges(&self, result: ChromeResult<TaskbarEdges>) {
        self.state.lock().taskbar_edges = result;
    }

    pub fn set_taskbar_placement(&self, result: ChromeResult<Option<TaskbarPlacement>>) {
        self.state.lock().taskbar_placement = result;
    }

    pub fn set_native_border_suppressed(&self, suppressed: bool) {
        self.state.lock().native_border_suppressed = suppressed;
    }

    pub fn set_intercepts_native_messages(&self, intercepts: bool) {
        self.state.lock().intercepts_native_messages = intercepts;
    }

    pub fn set_accent_color(&self, color: Option<RgbColor>) {
        self.state.lock().accent_color = color;
    }

    /// Run `hook` synchronously from every `refresh_frame` call.
    ///
    /// Mimics an OS that answers a frame refresh by immediately sending a
    /// geometry query back to the window.
    pub fn set_refresh_hook<F>(&self, hook: F)
    where
        F: Fn(WindowHandle) + Send + Sync + 'static,
    {
        self.state.lock().refresh_hook = Some(Arc::new(hook));
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Every action recorded so far.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Drain the recorded actions.
    pub fn take_calls(&self) -> Vec<BackendCall> {
        std::mem::take(&mut self.state.lock().calls)
    }

    /// Number of recorded actions matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: BackendCall) {
        self.state.lock().calls.push(call);
    }
}

fn dpi_or_absent(dpi: Option<u32>, capability: Capability) -> ChromeResult<u32> {
    dpi.ok_or(ChromeError::CapabilityAbsent(capability))
}

impl PlatformChromeBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn intercepts_native_messages(&self) -> bool {
        self.state.lock().intercepts_native_messages
    }

    fn attach(&self, window: WindowHandle) -> ChromeResult<()> {
        self.record(BackendCall::Attach(window));
        Ok(())
    }

    fn detach(&self, window: WindowHandle) -> ChromeResult<()> {
        self.record(BackendCall::Detach(window));
        Ok(())
    }

    fn window_dpi(&self, _window: WindowHandle) -> ChromeResult<u32> {
        dpi_or_absent(self.state.lock().window_dpi, Capability::WindowDpi)
    }

    fn monitor_dpi(&self, _window: WindowHandle) -> ChromeResult<u32> {
        dpi_or_absent(self.state.lock().monitor_dpi, Capability::MonitorDpi)
    }

    fn system_dpi(&self) -> ChromeResult<u32> {
        dpi_or_absent(self.state.lock().system_dpi, Capability::SystemDpi)
    }

    fn platform_default_metric(&self, metric: SystemMetric) -> Option<i32> {
        self.state.lock().platform_defaults[metric.index()]
    }

    fn query_system_metric(&self, metric: SystemMetric, dpi: u32) -> ChromeResult<i32> {
        let unscaled = self.state.lock().system_metrics[metric.index()].clone()?;
        Ok(crate::metrics::scale(unscaled, dpi, REFERENCE_DPI))
    }

    fn auto_hide_taskbar_edges(&self, _window: WindowHandle) -> ChromeResult<TaskbarEdges> {
        self.state.lock().taskbar_edges.clone()
    }

    fn taskbar_placement(&self, _window: WindowHandle) -> ChromeResult<Option<TaskbarPlacement>> {
        self.state.lock().taskbar_placement.clone()
    }

    fn native_border_suppressed(&self, _window: WindowHandle) -> bool {
        self.state.lock().native_border_suppressed
    }

    fn normalize_window_style(&self, window: WindowHandle, request: StyleRequest) -> ChromeResult<()> {
        self.record(BackendCall::NormalizeStyle(window, request));
        Ok(())
    }

    fn refresh_frame(&self, window: WindowHandle) -> ChromeResult<()> {
        self.record(BackendCall::RefreshFrame(window));
        // Clone the hook out so the state lock is released before it runs
        let hook = self.state.lock().refresh_hook.clone();
        if let Some(hook) = hook {
            hook(window);
        }
        Ok(())
    }

    fn start_system_move(&self, window: WindowHandle, pos: Point) -> ChromeResult<()> {
        self.record(BackendCall::StartMove(window, pos));
        Ok(())
    }

    fn start_system_resize(
        &self,
        window: WindowHandle,
        edge: ResizeEdge,
        pos: Point,
    ) -> ChromeResult<()> {
        self.record(BackendCall::StartResize(window, edge, pos));
        Ok(())
    }

    fn toggle_maximized(&self, window: WindowHandle) -> ChromeResult<()> {
        self.record(BackendCall::ToggleMaximized(window));
        Ok(())
    }

    fn show_system_menu(&self, window: WindowHandle, pos: Point) -> ChromeResult<()> {
        self.record(BackendCall::ShowSystemMenu(window, pos));
        Ok(())
    }

    fn accent_color(&self) -> ChromeResult<RgbColor> {
        self.state
            .lock()
            .accent_color
            .ok_or(ChromeError::CapabilityAbsent(Capability::AccentColor))
    }

    fn environment_changed(&self, change: EnvironmentChange) {
        self.record(BackendCall::EnvironmentChanged(change));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let backend = HeadlessBackend::new();
        let window = WindowHandle::from_raw(7);

        backend.refresh_frame(window).unwrap();
        backend.toggle_maximized(window).unwrap();

        assert_eq!(
            backend.take_calls(),
            vec![
                BackendCall::RefreshFrame(window),
                BackendCall::ToggleMaximized(window)
            ]
        );
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_unavailable_dpi_is_capability_absent() {
        let backend = HeadlessBackend::new();
        backend.set_monitor_dpi(None);
        assert_eq!(
            backend.monitor_dpi(WindowHandle::from_raw(1)),
            Err(ChromeError::CapabilityAbsent(Capability::MonitorDpi))
        );
    }

    #[test]
    fn test_system_metric_scales_with_query_dpi() {
        let backend = HeadlessBackend::new();
        backend.set_system_metric(SystemMetric::CaptionHeight, Ok(20));
        assert_eq!(backend.query_system_metric(SystemMetric::CaptionHeight, 96), Ok(20));
        assert_eq!(backend.query_system_metric(SystemMetric::CaptionHeight, 192), Ok(40));
    }
}
