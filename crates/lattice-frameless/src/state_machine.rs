//! The chrome state machine.
//!
//! Window state (`Normal`, `Minimized`, `Maximized`, `FullScreen`) crossed
//! with activation. Transitions come only from OS notifications; nothing is
//! polled. Every notification runs exactly one refresh pass, in order:
//!
//! 1. recompute the client-area insets and make the OS apply them
//! 2. decide whether the decorative frame border is drawn
//! 3. update the maximize/restore button affordance
//! 4. ask the rendering layer to repaint
//!
//! The pass runs even when a notification changes nothing, so a missed
//! update can never leave a stale border or button icon behind.

use lattice_frameless_core::logging::{span_names, targets};

use crate::chrome::ChromeEngine;
use crate::client_area::ClientInsets;
use crate::handle::WindowHandle;
use crate::state::{WindowRuntimeState, WindowState};
use crate::theme::RgbColor;

/// An OS notification that drives the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeTransition {
    /// Maximize, restore, minimize or fullscreen.
    StateChanged(WindowState),
    /// Activation gained or lost.
    ActivationChanged(bool),
    /// The window moved to a monitor with a different DPI.
    DpiChanged(u32),
    /// Theme or colorization change; the state itself is unchanged.
    EnvironmentChanged,
}

impl ChromeTransition {
    /// Apply to `runtime`. Returns `true` when the window state changed.
    pub fn apply(self, runtime: &mut WindowRuntimeState) -> bool {
        match self {
            ChromeTransition::StateChanged(state) => {
                let changed = runtime.window_state != state;
                runtime.window_state = state;
                changed
            }
            ChromeTransition::ActivationChanged(active) => {
                runtime.is_active = active;
                false
            }
            ChromeTransition::DpiChanged(dpi) => {
                if dpi > 0 {
                    runtime.set_dpi(dpi);
                }
                false
            }
            ChromeTransition::EnvironmentChanged => false,
        }
    }
}

/// What a bound maximize/restore button should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaximizeAffordance {
    Maximize,
    Restore,
}

impl MaximizeAffordance {
    pub fn for_state(state: WindowState) -> Self {
        if state.is_zoomed() {
            MaximizeAffordance::Restore
        } else {
            MaximizeAffordance::Maximize
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            MaximizeAffordance::Maximize => "Maximize",
            MaximizeAffordance::Restore => "Restore",
        }
    }
}

/// The decorative one-pixel frame border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBorder {
    pub visible: bool,
    pub color: RgbColor,
    /// Device pixels.
    pub thickness: i32,
}

/// Whether the application should draw its own frame border.
///
/// Only in `Normal` state, and only when the OS is not drawing one.
pub fn should_draw_frame_border(state: WindowState, native_border_suppressed: bool) -> bool {
    state.is_normal() && native_border_suppressed
}

/// Callbacks into the rendering layer.
///
/// Invoked from the refresh pass with no engine lock held.
pub trait ChromeRenderer: Send + Sync {
    fn update_frame_border(&self, window: WindowHandle, border: FrameBorder);

    fn update_maximize_button(&self, window: WindowHandle, affordance: MaximizeAffordance);

    fn request_repaint(&self, window: WindowHandle);
}

/// Everything one refresh pass decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshPass {
    pub runtime: WindowRuntimeState,
    pub client_insets: ClientInsets,
    pub frame_border: FrameBorder,
    pub affordance: MaximizeAffordance,
}

impl ChromeEngine {
    /// Apply `transition` to `window` and run one full refresh pass.
    ///
    /// Returns `None` when the window is not registered.
    pub(crate) fn run_refresh_pass(
        &self,
        window: WindowHandle,
        transition: ChromeTransition,
    ) -> Option<RefreshPass> {
        let span = tracing::debug_span!(target: targets::STATE, span_names::REFRESH_PASS, %window, ?transition);
        let _guard = span.enter();

        // A notified DPI is itself the first resolution tier, so other
        // transitions never replace it with a backend answer
        let resolved_dpi = match transition {
            ChromeTransition::DpiChanged(_) => None,
            _ => Some(self.metrics.resolve_dpi(self.backend.as_ref(), window)),
        };
        let (state_changed, runtime) = self.registry.update_entry(window, |entry| {
            if let Some(dpi) = resolved_dpi {
                entry.runtime.set_dpi(dpi);
            }
            let changed = transition.apply(&mut entry.runtime);
            (changed, entry.runtime)
        })?;
        if let ChromeTransition::DpiChanged(dpi) = transition {
            self.metrics.note_window_dpi(window, dpi);
        }

        // 1. Client-area insets
        let client_insets = self.compute_client_insets(window)?;
        self.registry
            .update_entry(window, |entry| entry.client_insets = Some(client_insets));
        if let Err(err) = self.backend.refresh_frame(window) {
            tracing::warn!(target: targets::STATE, %window, error = %err, "frame refresh failed");
        }

        // 2. Frame border
        let suppressed = self.backend.native_border_suppressed(window);
        let frame_border = FrameBorder {
            visible: should_draw_frame_border(runtime.window_state, suppressed),
            color: self.current_border_color(window, runtime.is_active),
            thickness: self.frame_border_thickness(window),
        };

        // 3. Maximize button
        let affordance = MaximizeAffordance::for_state(runtime.window_state);

        // 4. Repaint
        if let Some(renderer) = self.renderer() {
            renderer.update_frame_border(window, frame_border);
            renderer.update_maximize_button(window, affordance);
            renderer.request_repaint(window);
        }

        self.registry
            .update_entry(window, |entry| entry.refresh_passes += 1);

        if state_changed {
            tracing::debug!(target: targets::STATE, %window, state = ?runtime.window_state, "window state changed");
            self.window_state_changed().emit((window, runtime.window_state));
        }

        Some(RefreshPass {
            runtime,
            client_insets,
            frame_border,
            affordance,
        })
    }
}
