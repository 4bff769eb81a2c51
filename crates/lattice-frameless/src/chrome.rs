//! The chrome engine and its process-wide instance.
//!
//! [`ChromeEngine`] ties the pieces together: the platform backend, the
//! window registry, the metrics provider and the notification signals. The
//! application talks to it through three groups of methods:
//!
//! - **Registration**: opt windows in or out and adjust their configuration.
//! - **Queries**: state the rendering layer needs to style its chrome.
//! - **Notifications**: signals for theme changes, window state changes and
//!   system menu requests.
//!
//! Native message handling lives in the interceptor (see
//! [`ChromeEngine::dispatch`]) and the state machine.
//!
//! # Lifecycle
//!
//! One engine serves the whole process. Create it with [`initialize`] before
//! the first window is registered and tear it down with [`shutdown`]; the
//! platform hooks find it through [`instance`].
//!
//! ```ignore
//! use lattice_frameless::{EngineOptions, WindowChromeConfig, WindowHandle};
//!
//! let engine = lattice_frameless::initialize(EngineOptions::default());
//! let handle = WindowHandle::for_window(&window)?;
//! engine.register_window(handle, WindowChromeConfig::new().with_title_bar_height(32));
//!
//! engine.window_state_changed().connect(|(window, state)| {
//!     println!("{window} is now {state:?}");
//! });
//! ```
//!
//! Every method tolerates unregistered or already destroyed handles: setters
//! do nothing, queries return defaults.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use lattice_frameless_core::logging::targets;
use lattice_frameless_core::{
    ChromeError, ChromeResult, Insets, Point, Rect, Signal, log_capability_absent,
};

use crate::backend::{PlatformChromeBackend, StyleRequest, TaskbarEdges, platform_backend};
use crate::client_area::{self, ClientInsets};
use crate::config::{EngineOptions, WindowChromeConfig};
use crate::event::MessageReply;
use crate::handle::WindowHandle;
use crate::metrics::{Axis, MetricsProvider, Scaling};
use crate::region::{ResizeEdge, SystemButtonId};
use crate::registry::{LifecyclePhase, Registration, WindowRegistry};
use crate::state::{WindowRuntimeState, WindowState};
use crate::state_machine::{self, ChromeRenderer};
use crate::theme::{ColorScheme, RgbColor, SystemTheme, ThemeInfo, frame_border_color};

/// The frameless window chrome engine.
pub struct ChromeEngine {
    pub(crate) backend: Arc<dyn PlatformChromeBackend>,
    pub(crate) registry: WindowRegistry,
    pub(crate) metrics: MetricsProvider,
    renderer: RwLock<Option<Arc<dyn ChromeRenderer>>>,
    theme: RwLock<Option<ThemeInfo>>,
    color_scheme_source: fn() -> ColorScheme,
    system_theme_changed: Signal<ThemeInfo>,
    window_state_changed: Signal<(WindowHandle, WindowState)>,
    system_menu_requested: Signal<(WindowHandle, Point)>,
}

static_assertions::assert_impl_all!(ChromeEngine: Send, Sync);

impl fmt::Debug for ChromeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromeEngine")
            .field("backend", &self.backend.name())
            .field("windows", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl ChromeEngine {
    /// Create an engine on top of `backend`.
    pub fn new(backend: Arc<dyn PlatformChromeBackend>, options: EngineOptions) -> Self {
        Self {
            backend,
            registry: WindowRegistry::new(),
            metrics: MetricsProvider::new(options),
            renderer: RwLock::new(None),
            theme: RwLock::new(None),
            color_scheme_source: SystemTheme::color_scheme,
            system_theme_changed: Signal::new(),
            window_state_changed: Signal::new(),
            system_menu_requested: Signal::new(),
        }
    }

    /// Create an engine on the backend for the current platform.
    pub fn with_platform_backend(options: EngineOptions) -> Self {
        Self::new(Arc::from(platform_backend()), options)
    }

    /// Replace the function used to detect the light/dark scheme.
    pub fn with_color_scheme_source(mut self, source: fn() -> ColorScheme) -> Self {
        self.color_scheme_source = source;
        self
    }

    pub fn backend(&self) -> &dyn PlatformChromeBackend {
        self.backend.as_ref()
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &MetricsProvider {
        &self.metrics
    }

    pub fn options(&self) -> &EngineOptions {
        self.metrics.options()
    }

    /// Install the rendering layer callbacks.
    pub fn set_renderer(&self, renderer: Option<Arc<dyn ChromeRenderer>>) {
        *self.renderer.write() = renderer;
    }

    pub(crate) fn renderer(&self) -> Option<Arc<dyn ChromeRenderer>> {
        self.renderer.read().clone()
    }

    // =========================================================================
    // Registration API
    // =========================================================================

    /// Opt `window` into frameless behavior.
    ///
    /// Registering an already registered window replaces its configuration
    /// in place; the native hook is installed only once.
    pub fn register_window(&self, window: WindowHandle, config: WindowChromeConfig) {
        if window.is_null() {
            debug_assert!(false, "register_window called with a null handle");
            tracing::warn!(target: targets::REGISTRY, "ignoring registration of a null window handle");
            return;
        }

        match self.registry.register(window, config) {
            Registration::Inserted => {
                if let Err(err) = self.backend.attach(window) {
                    tracing::warn!(target: targets::BACKEND, %window, error = %err, "failed to attach native hook");
                }
            }
            Registration::Updated => self.refresh_if_active(window),
        }
    }

    /// Opt `window` out. Does nothing for unknown handles.
    pub fn unregister_window(&self, window: WindowHandle) {
        if self.registry.unregister(window).is_none() {
            return;
        }
        self.metrics.forget_window(window);
        if let Err(err) = self.backend.detach(window) {
            tracing::warn!(target: targets::BACKEND, %window, error = %err, "failed to detach native hook");
        }
    }

    /// Unregister every window.
    pub fn unregister_all(&self) {
        self.metrics.forget_all();
        for window in self.registry.clear() {
            if let Err(err) = self.backend.detach(window) {
                tracing::warn!(target: targets::BACKEND, %window, error = %err, "failed to detach native hook");
            }
        }
    }

    /// Exclude `rect` from drag and resize classification, or stop excluding it.
    pub fn set_ignored_region(&self, window: WindowHandle, rect: Rect, enabled: bool) {
        self.update_config(window, "set_ignored_region", |config| {
            config.set_ignored_region(rect, enabled);
        });
    }

    /// Add or remove a draggable caption rectangle.
    pub fn set_draggable_region(&self, window: WindowHandle, rect: Rect, enabled: bool) {
        self.update_config(window, "set_draggable_region", |config| {
            config.set_draggable_region(rect, enabled);
        });
    }

    /// Declare or remove an application-drawn caption button.
    pub fn set_system_button(&self, window: WindowHandle, id: SystemButtonId, rect: Option<Rect>) {
        self.update_config(window, "set_system_button", |config| {
            config.set_system_button(id, rect);
        });
    }

    pub fn set_fixed_size(&self, window: WindowHandle, fixed: bool) {
        if self.update_config(window, "set_fixed_size", |config| config.set_fixed_size(fixed)) {
            self.renormalize_if_active(window);
        }
    }

    pub fn set_mouse_transparent(&self, window: WindowHandle, transparent: bool) {
        self.update_config(window, "set_mouse_transparent", |config| {
            config.set_mouse_transparent(transparent);
        });
    }

    pub fn set_preserve_native_frame(&self, window: WindowHandle, preserve: bool) {
        if self.update_config(window, "set_preserve_native_frame", |config| {
            config.set_preserve_native_frame(preserve);
        }) {
            self.renormalize_if_active(window);
        }
    }

    /// Override the resize border thickness, in unscaled pixels.
    ///
    /// Negative values are rejected.
    pub fn set_resize_border_thickness(&self, window: WindowHandle, px: i32) {
        if !check_non_negative("resize border thickness", px) {
            return;
        }
        if self.update_config(window, "set_resize_border_thickness", |config| {
            config.set_resize_border_thickness(Some(px));
        }) {
            self.refresh_if_active(window);
        }
    }

    /// Override the title bar height, in unscaled pixels.
    ///
    /// Negative values are rejected.
    pub fn set_title_bar_height(&self, window: WindowHandle, px: i32) {
        if !check_non_negative("title bar height", px) {
            return;
        }
        if self.update_config(window, "set_title_bar_height", |config| {
            config.set_title_bar_height(Some(px));
        }) {
            self.refresh_if_active(window);
        }
    }

    fn update_config(
        &self,
        window: WindowHandle,
        operation: &'static str,
        f: impl FnOnce(&mut WindowChromeConfig),
    ) -> bool {
        let updated = self.registry.update_config(window, f).is_some();
        if !updated {
            tracing::debug!(target: targets::REGISTRY, %window, operation, "window not registered, ignoring");
        }
        updated
    }

    fn is_active(&self, window: WindowHandle) -> bool {
        self.registry.with_entry(window, |entry| entry.phase) == Some(LifecyclePhase::Active)
    }

    fn refresh_if_active(&self, window: WindowHandle) {
        if !self.is_active(window) {
            return;
        }
        if let Err(err) = self.backend.refresh_frame(window) {
            tracing::warn!(target: targets::BACKEND, %window, error = %err, "frame refresh failed");
        }
    }

    fn renormalize_if_active(&self, window: WindowHandle) {
        if !self.is_active(window) {
            return;
        }
        if let Some(request) = self.style_request(window) {
            self.normalize_style(window, request);
        }
    }

    pub(crate) fn style_request(&self, window: WindowHandle) -> Option<StyleRequest> {
        self.registry.with_config(window, |config| StyleRequest {
            preserve_native_frame: config.preserves_native_frame(),
            fixed_size: config.is_fixed_size(),
        })
    }

    pub(crate) fn normalize_style(&self, window: WindowHandle, request: StyleRequest) {
        if let Err(err) = self.backend.normalize_window_style(window, request) {
            match err.absent_capability() {
                Some(capability) => {
                    log_capability_absent(capability);
                }
                None => {
                    tracing::warn!(target: targets::BACKEND, %window, error = %err, "style normalization failed");
                }
            }
        }
    }

    // =========================================================================
    // Query API
    // =========================================================================

    pub fn is_registered(&self, window: WindowHandle) -> bool {
        self.registry.contains(window)
    }

    /// A copy of the window's configuration.
    pub fn config(&self, window: WindowHandle) -> Option<WindowChromeConfig> {
        self.registry.lookup(window)
    }

    pub fn runtime_state(&self, window: WindowHandle) -> Option<WindowRuntimeState> {
        self.registry.runtime(window)
    }

    /// The window's state; `Normal` for unregistered windows.
    pub fn window_state(&self, window: WindowHandle) -> WindowState {
        self.registry
            .with_entry(window, |entry| entry.runtime.window_state)
            .unwrap_or_default()
    }

    pub fn is_normal(&self, window: WindowHandle) -> bool {
        self.window_state(window).is_normal()
    }

    /// Maximized or fullscreen.
    pub fn is_zoomed(&self, window: WindowHandle) -> bool {
        self.window_state(window).is_zoomed()
    }

    /// Whether the application should draw the decorative frame border now.
    pub fn should_draw_frame_border(&self, window: WindowHandle) -> bool {
        match self.registry.with_entry(window, |entry| entry.runtime.window_state) {
            Some(state) => {
                state_machine::should_draw_frame_border(state, self.backend.native_border_suppressed(window))
            }
            None => false,
        }
    }

    /// Color of the decorative frame border for the given activation.
    pub fn current_border_color(&self, _window: WindowHandle, active: bool) -> RgbColor {
        let theme = self.theme();
        frame_border_color(active, theme.color_scheme, theme.accent_color)
    }

    /// Frame border thickness in device pixels.
    pub fn frame_border_thickness(&self, window: WindowHandle) -> i32 {
        self.metrics
            .frame_border_thickness(self.backend.as_ref(), window, Scaling::Scaled)
    }

    pub fn resize_border_thickness(&self, window: WindowHandle, axis: Axis, scaling: Scaling) -> i32 {
        let config = self.registry.lookup(window);
        self.metrics.resize_border_thickness(
            self.backend.as_ref(),
            window,
            config.as_ref(),
            axis,
            scaling,
        )
    }

    pub fn title_bar_height(&self, window: WindowHandle, scaling: Scaling) -> i32 {
        let config = self.registry.lookup(window);
        self.metrics.title_bar_height(
            self.backend.as_ref(),
            window,
            config.as_ref(),
            self.window_state(window),
            scaling,
        )
    }

    pub fn caption_height(&self, window: WindowHandle, scaling: Scaling) -> i32 {
        self.metrics
            .caption_height(self.backend.as_ref(), window, scaling)
    }

    /// Client insets for the window in its current state.
    pub fn compute_client_insets(&self, window: WindowHandle) -> Option<ClientInsets> {
        self.client_insets_for(window, None, None)
    }

    /// Client insets, optionally for a state the registry has not caught
    /// up with yet, and with freshly computed native insets.
    pub(crate) fn client_insets_for(
        &self,
        window: WindowHandle,
        live_state: Option<WindowState>,
        native: Option<Insets>,
    ) -> Option<ClientInsets> {
        let (overrides, recorded_state, preserve, stored_native) =
            self.registry.with_entry(window, |entry| {
                (
                    entry.config.metric_overrides(),
                    entry.runtime.window_state,
                    entry.config.preserves_native_frame(),
                    entry.native_insets,
                )
            })?;
        let state = live_state.unwrap_or(recorded_state);
        let backend = self.backend.as_ref();
        let metrics = self.metrics.resolve(backend, window, overrides, state);

        let insets = if preserve {
            let native = native.or(stored_native).unwrap_or(Insets::ZERO);
            client_area::preserve_native_insets(native, state, &metrics)
        } else {
            let auto_hide = if state.is_zoomed() {
                client_area::detect_auto_hide_taskbar(backend, window)
            } else {
                TaskbarEdges::NONE
            };
            client_area::compute_client_insets(
                state,
                &metrics,
                auto_hide,
                self.options().auto_hide_reveal_strip,
            )
        };
        Some(insets)
    }

    /// Insets from the last client-area computation.
    pub fn client_insets(&self, window: WindowHandle) -> Option<ClientInsets> {
        self.registry
            .with_entry(window, |entry| entry.client_insets)
            .flatten()
    }

    /// Number of state-machine refresh passes the window has been through.
    pub fn refresh_pass_count(&self, window: WindowHandle) -> u64 {
        self.registry
            .with_entry(window, |entry| entry.refresh_passes)
            .unwrap_or(0)
    }

    /// Last pointer position reported for the window.
    pub fn pointer_position(&self, window: WindowHandle) -> Option<Point> {
        self.registry.with_entry(window, |entry| entry.pointer).flatten()
    }

    pub fn set_pointer_position(&self, window: WindowHandle, pos: Option<Point>) {
        self.registry.update_entry(window, |entry| entry.pointer = pos);
    }

    // =========================================================================
    // Native window actions
    // =========================================================================

    /// Start an interactive move from `pos`. Returns `true` if requested.
    pub fn start_system_move(&self, window: WindowHandle, pos: Point) -> bool {
        if !self.is_registered(window) {
            return false;
        }
        self.report_action(window, "start_system_move", self.backend.start_system_move(window, pos))
    }

    /// Start an interactive resize from `edge`. Fixed-size windows refuse.
    pub fn start_system_resize(&self, window: WindowHandle, edge: ResizeEdge, pos: Point) -> bool {
        match self.registry.with_config(window, WindowChromeConfig::is_fixed_size) {
            Some(false) => {}
            _ => return false,
        }
        self.report_action(
            window,
            "start_system_resize",
            self.backend.start_system_resize(window, edge, pos),
        )
    }

    pub fn toggle_maximized(&self, window: WindowHandle) -> bool {
        if !self.is_registered(window) {
            return false;
        }
        self.report_action(window, "toggle_maximized", self.backend.toggle_maximized(window))
    }

    pub fn show_system_menu(&self, window: WindowHandle, pos: Point) -> bool {
        if !self.is_registered(window) {
            return false;
        }
        self.report_action(window, "show_system_menu", self.backend.show_system_menu(window, pos))
    }

    /// Carry out an interceptor reply through the backend.
    ///
    /// For callers that have no toolkit window of their own to act on.
    pub fn perform(&self, window: WindowHandle, reply: MessageReply) -> bool {
        let pos = self.pointer_position(window).unwrap_or(Point::ZERO);
        match reply {
            MessageReply::BeginSystemMove => self.start_system_move(window, pos),
            MessageReply::BeginSystemResize(edge) => self.start_system_resize(window, edge, pos),
            MessageReply::ToggleMaximize => self.toggle_maximized(window),
            MessageReply::ShowSystemMenu(pos) => self.show_system_menu(window, pos),
            MessageReply::ClientArea { .. } | MessageReply::HitTest(_) | MessageReply::SuppressPaint => {
                false
            }
        }
    }

    fn report_action(&self, window: WindowHandle, action: &'static str, result: ChromeResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                match err.absent_capability() {
                    Some(capability) => {
                        log_capability_absent(capability);
                    }
                    None => {
                        tracing::warn!(target: targets::BACKEND, %window, action, error = %err, "native window action failed");
                    }
                }
                false
            }
        }
    }

    // =========================================================================
    // Theme
    // =========================================================================

    /// The current system theme, queried on first use.
    pub fn theme(&self) -> ThemeInfo {
        if let Some(theme) = *self.theme.read() {
            return theme;
        }
        let theme = self.query_theme();
        *self.theme.write() = Some(theme);
        theme
    }

    /// Re-query the system theme. Emits `system_theme_changed` and returns
    /// the new theme when it differs from the cached one.
    pub fn refresh_theme(&self) -> Option<ThemeInfo> {
        let theme = self.query_theme();
        let previous = self.theme.write().replace(theme);
        if previous == Some(theme) {
            return None;
        }
        tracing::debug!(target: targets::STATE, scheme = ?theme.color_scheme, accent = ?theme.accent_color, "system theme changed");
        self.system_theme_changed.emit(theme);
        Some(theme)
    }

    fn query_theme(&self) -> ThemeInfo {
        let accent_color = match self.backend.accent_color() {
            Ok(color) => Some(color),
            Err(err) => {
                if let Some(capability) = err.absent_capability() {
                    log_capability_absent(capability);
                } else {
                    tracing::warn!(target: targets::BACKEND, error = %err, "accent color query failed");
                }
                None
            }
        };
        ThemeInfo {
            color_scheme: (self.color_scheme_source)(),
            accent_color,
        }
    }

    // =========================================================================
    // Notification API
    // =========================================================================

    /// Emitted when the system theme or accent color changes.
    pub fn system_theme_changed(&self) -> &Signal<ThemeInfo> {
        &self.system_theme_changed
    }

    /// Emitted when a registered window changes state.
    pub fn window_state_changed(&self) -> &Signal<(WindowHandle, WindowState)> {
        &self.window_state_changed
    }

    /// Emitted when the user right-clicks the caption.
    pub fn system_menu_requested(&self) -> &Signal<(WindowHandle, Point)> {
        &self.system_menu_requested
    }
}

fn check_non_negative(what: &'static str, px: i32) -> bool {
    debug_assert!(px >= 0, "negative {what}: {px}");
    if px < 0 {
        let err = ChromeError::invalid_argument(what, px);
        tracing::warn!(target: targets::REGISTRY, error = %err, "rejected");
        return false;
    }
    true
}

// ============================================================================
// Process-wide instance
// ============================================================================

static ENGINE: RwLock<Option<Arc<ChromeEngine>>> = RwLock::new(None);

/// Create the process-wide engine on the platform backend.
///
/// Calling this again while an engine exists returns the existing one.
pub fn initialize(options: EngineOptions) -> Arc<ChromeEngine> {
    initialize_with_backend(Arc::from(platform_backend()), options)
}

/// Create the process-wide engine on a specific backend.
pub fn initialize_with_backend(
    backend: Arc<dyn PlatformChromeBackend>,
    options: EngineOptions,
) -> Arc<ChromeEngine> {
    let mut slot = ENGINE.write();
    if let Some(engine) = slot.as_ref() {
        tracing::warn!(target: targets::CORE, "chrome engine already initialized");
        return Arc::clone(engine);
    }
    let engine = Arc::new(ChromeEngine::new(backend, options));
    *slot = Some(Arc::clone(&engine));
    tracing::info!(target: targets::CORE, backend = engine.backend.name(), "chrome engine initialized");
    engine
}

/// Tear down the process-wide engine, unregistering every window.
///
/// Returns `false` when no engine was running.
pub fn shutdown() -> bool {
    // Take the engine out first so native hooks see it gone while detaching
    let Some(engine) = ENGINE.write().take() else {
        return false;
    };
    engine.unregister_all();
    tracing::info!(target: targets::CORE, "chrome engine shut down");
    true
}

/// The process-wide engine, if initialized.
pub fn instance() -> Option<Arc<ChromeEngine>> {
    ENGINE.read().clone()
}

/// Like [`instance`], as a result.
pub fn try_instance() -> ChromeResult<Arc<ChromeEngine>> {
    instance().ok_or(ChromeError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, HeadlessBackend};

    fn engine() -> (Arc<HeadlessBackend>, ChromeEngine) {
        let backend = Arc::new(HeadlessBackend::new());
        let engine = ChromeEngine::new(backend.clone(), EngineOptions::default())
            .with_color_scheme_source(|| ColorScheme::Light);
        (backend, engine)
    }

    fn window() -> WindowHandle {
        WindowHandle::from_raw(0x100)
    }

    #[test]
    fn test_register_attaches_once() {
        let (backend, engine) = engine();
        engine.register_window(window(), WindowChromeConfig::new());
        engine.register_window(window(), WindowChromeConfig::new().with_fixed_size(true));

        assert_eq!(
            backend.count_calls(|call| matches!(call, BackendCall::Attach(_))),
            1
        );
        assert_eq!(engine.registry().len(), 1);
        assert!(engine.config(window()).is_some_and(|config| config.is_fixed_size()));
    }

    #[test]
    fn test_unregister_detaches() {
        let (backend, engine) = engine();
        engine.register_window(window(), WindowChromeConfig::new());
        engine.unregister_window(window());
        engine.unregister_window(window());

        assert!(!engine.is_registered(window()));
        assert_eq!(
            backend.count_calls(|call| matches!(call, BackendCall::Detach(_))),
            1
        );
    }

    #[test]
    fn test_setters_ignore_unknown_windows() {
        let (backend, engine) = engine();
        engine.set_fixed_size(window(), true);
        engine.set_ignored_region(window(), Rect::new(0, 0, 10, 10), true);
        engine.set_title_bar_height(window(), 40);

        assert!(engine.config(window()).is_none());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_unknown_window_queries_return_defaults() {
        let (_, engine) = engine();
        assert!(engine.is_normal(window()));
        assert!(!engine.is_zoomed(window()));
        assert!(!engine.should_draw_frame_border(window()));
        assert_eq!(engine.refresh_pass_count(window()), 0);
        assert_eq!(engine.compute_client_insets(window()), None);
        assert!(!engine.start_system_move(window(), Point::ZERO));
    }

    #[test]
    fn test_setters_update_config() {
        let (_, engine) = engine();
        engine.register_window(window(), WindowChromeConfig::new());

        let rect = Rect::new(10, 0, 100, 30);
        engine.set_draggable_region(window(), rect, true);
        engine.set_resize_border_thickness(window(), 6);
        engine.set_title_bar_height(window(), 36);
        engine.set_mouse_transparent(window(), true);

        let config = engine.config(window()).unwrap();
        assert_eq!(config.draggable_regions(), &[rect]);
        assert_eq!(config.resize_border_thickness(), Some(6));
        assert_eq!(config.title_bar_height(), Some(36));
        assert!(config.is_mouse_transparent());

        engine.set_draggable_region(window(), rect, false);
        assert!(engine.config(window()).unwrap().draggable_regions().is_empty());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic)]
    fn test_negative_thickness_is_rejected() {
        let (_, engine) = engine();
        engine.register_window(window(), WindowChromeConfig::new());
        engine.set_resize_border_thickness(window(), -4);
        assert_eq!(engine.config(window()).unwrap().resize_border_thickness(), None);
    }

    #[test]
    fn test_border_color_follows_theme() {
        let backend = Arc::new(HeadlessBackend::new());
        let accent = RgbColor::new(0, 120, 212);
        backend.set_accent_color(Some(accent));
        let engine = ChromeEngine::new(backend, EngineOptions::default())
            .with_color_scheme_source(|| ColorScheme::Dark);

        assert_eq!(engine.current_border_color(window(), true), accent);
        assert_eq!(
            engine.current_border_color(window(), false),
            crate::theme::INACTIVE_BORDER_DARK
        );
    }

    #[test]
    fn test_refresh_theme_emits_only_on_change() {
        let (backend, engine) = engine();
        let emitted = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = emitted.clone();
        engine
            .system_theme_changed()
            .connect(move |theme| sink.lock().push(*theme));

        // First query seeds the cache
        engine.theme();
        assert_eq!(engine.refresh_theme(), None);

        backend.set_accent_color(Some(RgbColor::new(200, 0, 0)));
        assert!(engine.refresh_theme().is_some());
        assert_eq!(engine.refresh_theme(), None);
        assert_eq!(emitted.lock().len(), 1);
    }

    #[test]
    fn test_fixed_size_refuses_system_resize() {
        let (backend, engine) = engine();
        engine.register_window(window(), WindowChromeConfig::new().with_fixed_size(true));

        assert!(!engine.start_system_resize(window(), ResizeEdge::Left, Point::ZERO));
        assert_eq!(
            backend.count_calls(|call| matches!(call, BackendCall::StartResize(..))),
            0
        );
        assert!(engine.start_system_move(window(), Point::new(5, 5)));
    }

    #[test]
    fn test_perform_routes_replies() {
        let (backend, engine) = engine();
        engine.register_window(window(), WindowChromeConfig::new());
        engine.set_pointer_position(window(), Some(Point::new(40, 10)));

        assert!(engine.perform(window(), MessageReply::BeginSystemMove));
        assert!(engine.perform(window(), MessageReply::ToggleMaximize));
        assert!(!engine.perform(window(), MessageReply::SuppressPaint));

        assert_eq!(
            backend.take_calls()[1..],
            [
                BackendCall::StartMove(window(), Point::new(40, 10)),
                BackendCall::ToggleMaximized(window()),
            ]
        );
    }
}
