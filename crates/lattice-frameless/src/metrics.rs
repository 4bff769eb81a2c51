//! DPI-aware chrome metrics.
//!
//! Every metric exists in two forms: *unscaled* (logical pixels, what the
//! application configures) and *scaled* (device pixels at the window's
//! current DPI, what hit-testing and client-area computation consume).
//! Callers always say which one they want through [`Scaling`].
//!
//! # Resolution
//!
//! An unscaled metric is resolved in this order, first hit wins:
//!
//! 1. the per-window override in [`WindowChromeConfig`]
//! 2. the backend's fixed platform constant
//! 3. the backend's OS query
//! 4. the hard-coded default from [`EngineOptions`]
//!
//! A failed OS query (as opposed to an absent capability) falls back to the
//! last value that query returned successfully before reaching step 4.
//!
//! The DPI used for scaling is the DPI from the window's last DPI-change
//! notification, else the window's own DPI, else its monitor's, else the
//! system DPI, else [`REFERENCE_DPI`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use parking_lot::RwLock;

use lattice_frameless_core::logging::targets;
use lattice_frameless_core::{ChromeError, ChromeResult, log_capability_absent};

use crate::backend::{PlatformChromeBackend, SystemMetric};
use crate::config::{EngineOptions, MetricOverrides, WindowChromeConfig};
use crate::handle::WindowHandle;
use crate::state::WindowState;

/// DPI that corresponds to a device pixel ratio of 1.0.
pub const REFERENCE_DPI: u32 = 96;

/// Scale factors the engine is expected to handle: 100% to 500%.
pub const SUPPORTED_DPI: [u32; 12] = [96, 120, 144, 168, 192, 216, 240, 288, 336, 384, 432, 480];

/// Fallback resize border thickness, unscaled.
pub const DEFAULT_RESIZE_BORDER_THICKNESS: i32 = 8;

/// Fallback caption height, unscaled.
pub const DEFAULT_CAPTION_HEIGHT: i32 = 23;

/// Thickness of the decorative frame border, unscaled.
pub const DEFAULT_FRAME_BORDER_THICKNESS: i32 = 1;

const UNSET: i32 = -1;

/// Which axis a border metric applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Left and right edges.
    Horizontal,
    /// Top and bottom edges.
    Vertical,
}

/// Whether a metric is wanted in logical or device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// Logical pixels.
    Unscaled,
    /// Device pixels at the window's DPI.
    Scaled,
}

/// Scale a logical value to device pixels: `round(unscaled * dpi / reference)`.
pub fn scale(unscaled: i32, dpi: u32, reference_dpi: u32) -> i32 {
    if reference_dpi == 0 {
        return unscaled;
    }
    (f64::from(unscaled) * f64::from(dpi) / f64::from(reference_dpi)).round() as i32
}

/// Chrome metrics for one window, resolved in device pixels.
///
/// This is what the hit-test classifier consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeMetrics {
    pub dpi: u32,
    pub resize_border_x: i32,
    pub resize_border_y: i32,
    pub title_bar_height: i32,
    pub frame_border_thickness: i32,
}

impl ChromeMetrics {
    /// Metrics at the reference DPI with explicit border and title bar values.
    pub fn new(resize_border: i32, title_bar_height: i32) -> Self {
        Self {
            dpi: REFERENCE_DPI,
            resize_border_x: resize_border,
            resize_border_y: resize_border,
            title_bar_height,
            frame_border_thickness: DEFAULT_FRAME_BORDER_THICKNESS,
        }
    }
}

/// Resolves DPI and system metrics through a platform backend.
///
/// Holds the last-known-good value of every OS-queried metric. The cache is
/// lock-free and safe to read from any thread.
#[derive(Debug)]
pub struct MetricsProvider {
    options: EngineOptions,
    last_known_good: [AtomicI32; 4],
    /// DPI carried by each window's most recent DPI-change notification.
    notified_dpi: RwLock<HashMap<WindowHandle, u32>>,
}

impl MetricsProvider {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            last_known_good: std::array::from_fn(|_| AtomicI32::new(UNSET)),
            notified_dpi: RwLock::new(HashMap::new()),
        }
    }

    /// Record the DPI a DPI-change notification reported for `window`.
    ///
    /// It takes precedence over every backend query until the window is
    /// forgotten or notified again. Zero is ignored.
    pub fn note_window_dpi(&self, window: WindowHandle, dpi: u32) {
        if dpi == 0 {
            tracing::trace!(target: targets::METRICS, %window, "ignoring zero DPI notification");
            return;
        }
        self.notified_dpi.write().insert(window, dpi);
    }

    /// Drop the notified DPI of `window`.
    pub fn forget_window(&self, window: WindowHandle) {
        self.notified_dpi.write().remove(&window);
    }

    /// Drop every notified DPI.
    pub fn forget_all(&self) {
        self.notified_dpi.write().clear();
    }

    /// DPI from the window's last DPI-change notification, if any.
    pub fn notified_dpi(&self, window: WindowHandle) -> Option<u32> {
        self.notified_dpi.read().get(&window).copied()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Resolve the window's DPI through the notified → window → monitor →
    /// system chain.
    ///
    /// Never fails; returns the reference DPI when every tier is unavailable.
    pub fn resolve_dpi(&self, backend: &dyn PlatformChromeBackend, window: WindowHandle) -> u32 {
        if let Some(dpi) = self.notified_dpi(window) {
            return dpi;
        }
        // Each tier is only queried when the previous one came up empty
        let tiers: [(&str, &dyn Fn() -> ChromeResult<u32>); 3] = [
            ("window", &|| backend.window_dpi(window)),
            ("monitor", &|| backend.monitor_dpi(window)),
            ("system", &|| backend.system_dpi()),
        ];
        for (tier, query) in tiers {
            match query() {
                Ok(dpi) if dpi > 0 => return dpi,
                Ok(_) => {
                    // Hit on every hit test while it lasts
                    tracing::trace!(target: targets::METRICS, tier, %window, "backend reported zero DPI");
                }
                Err(err) => note_failure(&err, tier),
            }
        }
        self.options.reference_dpi
    }

    /// Device pixel ratio of the window.
    pub fn device_pixel_ratio(&self, backend: &dyn PlatformChromeBackend, window: WindowHandle) -> f64 {
        f64::from(self.resolve_dpi(backend, window)) / f64::from(self.options.reference_dpi.max(1))
    }

    /// Resize border thickness along `axis`.
    pub fn resize_border_thickness(
        &self,
        backend: &dyn PlatformChromeBackend,
        window: WindowHandle,
        config: Option<&WindowChromeConfig>,
        axis: Axis,
        scaling: Scaling,
    ) -> i32 {
        let metric = match axis {
            Axis::Horizontal => SystemMetric::ResizeBorderHorizontal,
            Axis::Vertical => SystemMetric::ResizeBorderVertical,
        };
        let unscaled = self.unscaled_metric(
            backend,
            metric,
            config.and_then(WindowChromeConfig::resize_border_thickness),
        );
        self.apply_scaling(backend, window, unscaled, scaling)
    }

    /// Caption height, excluding any resize border.
    pub fn caption_height(
        &self,
        backend: &dyn PlatformChromeBackend,
        window: WindowHandle,
        scaling: Scaling,
    ) -> i32 {
        let unscaled = self.unscaled_metric(backend, SystemMetric::CaptionHeight, None);
        self.apply_scaling(backend, window, unscaled, scaling)
    }

    /// Height of the draggable title bar.
    ///
    /// Without an override this is the caption height plus the vertical
    /// resize border in `Normal` state, and the caption height alone when
    /// maximized or fullscreen.
    pub fn title_bar_height(
        &self,
        backend: &dyn PlatformChromeBackend,
        window: WindowHandle,
        config: Option<&WindowChromeConfig>,
        state: WindowState,
        scaling: Scaling,
    ) -> i32 {
        let dpi = match scaling {
            Scaling::Scaled => self.resolve_dpi(backend, window),
            Scaling::Unscaled => self.options.reference_dpi,
        };
        let overrides = config.map(WindowChromeConfig::metric_overrides).unwrap_or_default();
        self.title_bar_height_at(backend, overrides, state, dpi)
    }

    /// Thickness of the decorative frame border.
    pub fn frame_border_thickness(
        &self,
        backend: &dyn PlatformChromeBackend,
        window: WindowHandle,
        scaling: Scaling,
    ) -> i32 {
        let unscaled = self.unscaled_metric(backend, SystemMetric::FrameBorder, None);
        // Never thinner than one device pixel
        self.apply_scaling(backend, window, unscaled, scaling).max(1)
    }

    /// Resolve everything the hit-test classifier needs, at one DPI.
    pub fn resolve(
        &self,
        backend: &dyn PlatformChromeBackend,
        window: WindowHandle,
        overrides: MetricOverrides,
        state: WindowState,
    ) -> ChromeMetrics {
        let dpi = self.resolve_dpi(backend, window);
        self.resolve_at(backend, overrides, state, dpi)
    }

    /// Like [`resolve`](Self::resolve), with the DPI already known.
    pub fn resolve_at(
        &self,
        backend: &dyn PlatformChromeBackend,
        overrides: MetricOverrides,
        state: WindowState,
        dpi: u32,
    ) -> ChromeMetrics {
        let reference = self.options.reference_dpi;
        let border_override = overrides.resize_border_thickness;
        let border_x =
            self.unscaled_metric(backend, SystemMetric::ResizeBorderHorizontal, border_override);
        let border_y =
            self.unscaled_metric(backend, SystemMetric::ResizeBorderVertical, border_override);
        let frame = self.unscaled_metric(backend, SystemMetric::FrameBorder, None);

        ChromeMetrics {
            dpi,
            resize_border_x: scale(border_x, dpi, reference),
            resize_border_y: scale(border_y, dpi, reference),
            title_bar_height: self.title_bar_height_at(backend, overrides, state, dpi),
            frame_border_thickness: scale(frame, dpi, reference).max(1),
        }
    }

    fn title_bar_height_at(
        &self,
        backend: &dyn PlatformChromeBackend,
        overrides: MetricOverrides,
        state: WindowState,
        dpi: u32,
    ) -> i32 {
        let reference = self.options.reference_dpi;
        if let Some(height) = overrides.title_bar_height {
            return scale(height, dpi, reference);
        }

        let caption = self.unscaled_metric(backend, SystemMetric::CaptionHeight, None);
        let caption = scale(caption, dpi, reference);
        if state.is_zoomed() {
            return caption;
        }
        let border = self.unscaled_metric(
            backend,
            SystemMetric::ResizeBorderVertical,
            overrides.resize_border_thickness,
        );
        caption + scale(border, dpi, reference)
    }

    fn apply_scaling(
        &self,
        backend: &dyn PlatformChromeBackend,
        window: WindowHandle,
        unscaled: i32,
        scaling: Scaling,
    ) -> i32 {
        match scaling {
            Scaling::Unscaled => unscaled,
            Scaling::Scaled => scale(
                unscaled,
                self.resolve_dpi(backend, window),
                self.options.reference_dpi,
            ),
        }
    }

    /// Resolve an unscaled metric through the override → constant → query →
    /// fallback chain.
    pub fn unscaled_metric(
        &self,
        backend: &dyn PlatformChromeBackend,
        metric: SystemMetric,
        override_px: Option<i32>,
    ) -> i32 {
        if let Some(px) = override_px {
            return px.max(0);
        }
        if let Some(px) = backend.platform_default_metric(metric) {
            return px;
        }

        let slot = &self.last_known_good[metric.index()];
        match backend.query_system_metric(metric, self.options.reference_dpi) {
            Ok(px) if px >= 0 => {
                slot.store(px, Ordering::Relaxed);
                px
            }
            Ok(px) => {
                tracing::warn!(target: targets::METRICS, ?metric, px, "backend reported a negative metric");
                self.last_known_good_or_default(metric)
            }
            Err(err) => {
                note_failure(&err, "system metric");
                self.last_known_good_or_default(metric)
            }
        }
    }

    fn last_known_good_or_default(&self, metric: SystemMetric) -> i32 {
        let cached = self.last_known_good[metric.index()].load(Ordering::Relaxed);
        if cached != UNSET {
            return cached;
        }
        self.fallback(metric)
    }

    fn fallback(&self, metric: SystemMetric) -> i32 {
        match metric {
            SystemMetric::ResizeBorderHorizontal | SystemMetric::ResizeBorderVertical => {
                self.options.default_resize_border_thickness
            }
            SystemMetric::CaptionHeight => self.options.default_caption_height,
            SystemMetric::FrameBorder => self.options.frame_border_thickness,
        }
    }
}

impl Default for MetricsProvider {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

fn note_failure(err: &ChromeError, what: &str) {
    match err.absent_capability() {
        Some(capability) => {
            log_capability_absent(capability);
        }
        None => {
            tracing::warn!(target: targets::METRICS, error = %err, what, "platform query failed, falling back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use lattice_frameless_core::Capability;

    fn window() -> WindowHandle {
        WindowHandle::from_raw(0x10)
    }

    #[test]
    fn test_scale_rounds() {
        assert_eq!(scale(8, 96, 96), 8);
        assert_eq!(scale(8, 120, 96), 10);
        assert_eq!(scale(8, 144, 96), 12);
        assert_eq!(scale(23, 120, 96), 29); // 28.75
        assert_eq!(scale(1, 168, 96), 2); // 1.75
    }

    #[test]
    fn test_dpi_falls_through_tiers() {
        let backend = HeadlessBackend::new();
        let metrics = MetricsProvider::default();

        backend.set_window_dpi(None);
        backend.set_monitor_dpi(Some(144));
        assert_eq!(metrics.resolve_dpi(&backend, window()), 144);

        backend.set_monitor_dpi(None);
        backend.set_system_dpi(Some(120));
        assert_eq!(metrics.resolve_dpi(&backend, window()), 120);

        backend.set_system_dpi(None);
        assert_eq!(metrics.resolve_dpi(&backend, window()), REFERENCE_DPI);

        backend.set_window_dpi(Some(192));
        assert_eq!(metrics.resolve_dpi(&backend, window()), 192);
        assert_eq!(metrics.device_pixel_ratio(&backend, window()), 2.0);
    }

    #[test]
    fn test_notified_dpi_precedes_backend_tiers() {
        let backend = HeadlessBackend::new();
        backend.set_window_dpi(None);
        backend.set_monitor_dpi(None);
        backend.set_system_dpi(None);
        let metrics = MetricsProvider::default();

        metrics.note_window_dpi(window(), 192);
        assert_eq!(metrics.resolve_dpi(&backend, window()), 192);
        assert_eq!(
            metrics.resize_border_thickness(&backend, window(), None, Axis::Horizontal, Scaling::Scaled),
            16
        );

        // The backend answer no longer wins once a notification arrived
        backend.set_window_dpi(Some(120));
        assert_eq!(metrics.resolve_dpi(&backend, window()), 192);

        metrics.note_window_dpi(window(), 0);
        assert_eq!(metrics.notified_dpi(window()), Some(192));

        metrics.forget_window(window());
        assert_eq!(metrics.resolve_dpi(&backend, window()), 120);
    }

    #[test]
    fn test_zero_dpi_falls_through() {
        let backend = HeadlessBackend::new();
        backend.set_window_dpi(Some(0));
        backend.set_monitor_dpi(Some(144));
        let metrics = MetricsProvider::default();

        assert_eq!(metrics.resolve_dpi(&backend, window()), 144);
    }

    #[test]
    fn test_override_wins() {
        let backend = HeadlessBackend::new();
        backend.set_system_metric(SystemMetric::ResizeBorderHorizontal, Ok(4));
        let metrics = MetricsProvider::default();
        let config = WindowChromeConfig::new().with_resize_border_thickness(6);

        let px = metrics.resize_border_thickness(
            &backend,
            window(),
            Some(&config),
            Axis::Horizontal,
            Scaling::Unscaled,
        );
        assert_eq!(px, 6);
    }

    #[test]
    fn test_platform_constant_before_query() {
        let backend = HeadlessBackend::new();
        backend.set_platform_default(SystemMetric::CaptionHeight, Some(28));
        backend.set_system_metric(SystemMetric::CaptionHeight, Ok(40));
        let metrics = MetricsProvider::default();

        assert_eq!(metrics.caption_height(&backend, window(), Scaling::Unscaled), 28);
    }

    #[test]
    fn test_query_failure_uses_last_known_good() {
        let backend = HeadlessBackend::new();
        let metrics = MetricsProvider::default();

        backend.set_system_metric(SystemMetric::CaptionHeight, Ok(30));
        assert_eq!(metrics.caption_height(&backend, window(), Scaling::Unscaled), 30);

        backend.set_system_metric(
            SystemMetric::CaptionHeight,
            Err(ChromeError::platform("GetSystemMetricsForDpi", "failed")),
        );
        assert_eq!(metrics.caption_height(&backend, window(), Scaling::Unscaled), 30);
    }

    #[test]
    fn test_absent_capability_uses_default() {
        let backend = HeadlessBackend::new();
        backend.set_system_metric(
            SystemMetric::ResizeBorderVertical,
            Err(ChromeError::CapabilityAbsent(Capability::DpiAwareMetrics)),
        );
        let metrics = MetricsProvider::default();

        let px = metrics.resize_border_thickness(
            &backend,
            window(),
            None,
            Axis::Vertical,
            Scaling::Unscaled,
        );
        assert_eq!(px, DEFAULT_RESIZE_BORDER_THICKNESS);
    }

    #[test]
    fn test_title_bar_height_by_state() {
        let backend = HeadlessBackend::new();
        backend.set_window_dpi(Some(96));
        let metrics = MetricsProvider::default();

        let normal =
            metrics.title_bar_height(&backend, window(), None, WindowState::Normal, Scaling::Scaled);
        let maximized = metrics.title_bar_height(
            &backend,
            window(),
            None,
            WindowState::Maximized,
            Scaling::Scaled,
        );
        assert_eq!(normal, DEFAULT_CAPTION_HEIGHT + DEFAULT_RESIZE_BORDER_THICKNESS);
        assert_eq!(maximized, DEFAULT_CAPTION_HEIGHT);

        let config = WindowChromeConfig::new().with_title_bar_height(40);
        let overridden = metrics.title_bar_height(
            &backend,
            window(),
            Some(&config),
            WindowState::Normal,
            Scaling::Scaled,
        );
        assert_eq!(overridden, 40);
    }

    #[test]
    fn test_resize_border_monotonic_over_supported_dpi() {
        let backend = HeadlessBackend::new();
        let metrics = MetricsProvider::default();

        let mut previous = 0;
        for dpi in SUPPORTED_DPI {
            backend.set_window_dpi(Some(dpi));
            let px = metrics.resize_border_thickness(
                &backend,
                window(),
                None,
                Axis::Horizontal,
                Scaling::Scaled,
            );
            assert!(px >= previous, "{px} < {previous} at {dpi} DPI");
            previous = px;
        }
        assert_eq!(previous, 40);
    }

    #[test]
    fn test_resolve_scales_everything_at_one_dpi() {
        let backend = HeadlessBackend::new();
        backend.set_window_dpi(Some(144));
        let metrics = MetricsProvider::default();
        let overrides = WindowChromeConfig::new()
            .with_title_bar_height(32)
            .metric_overrides();

        let resolved = metrics.resolve(&backend, window(), overrides, WindowState::Normal);
        assert_eq!(resolved.dpi, 144);
        assert_eq!(resolved.resize_border_x, 12);
        assert_eq!(resolved.resize_border_y, 12);
        assert_eq!(resolved.title_bar_height, 48);
        assert_eq!(resolved.frame_border_thickness, 2);
    }

    #[test]
    fn test_frame_border_never_below_one_pixel() {
        let backend = HeadlessBackend::new();
        let metrics = MetricsProvider::default();
        assert_eq!(metrics.frame_border_thickness(&backend, window(), Scaling::Scaled), 1);

        backend.set_window_dpi(Some(240));
        assert_eq!(metrics.frame_border_thickness(&backend, window(), Scaling::Scaled), 3);
    }
}
