//! Message interception.
//!
//! [`ChromeEngine::dispatch`] is the single entry point every backend feeds
//! its decoded messages into. Messages for unregistered windows return
//! [`Disposition::PassThrough`] after one read-locked map lookup and no
//! allocation, which keeps the per-mouse-move cost negligible.
//!
//! # Lifecycle
//!
//! ```text
//! Unregistered ──register──▶ Registered ──first message──▶ Active
//! ```
//!
//! The first message after registration normalizes the native window style.
//! Registering the same window again keeps it `Active`, so normalization
//! never runs twice.
//!
//! # Handlers
//!
//! | Class            | Action                                          | Result      |
//! |------------------|-------------------------------------------------|-------------|
//! | Geometry         | compute client insets                           | handled     |
//! | Hit test         | classify the point                              | handled     |
//! | Non-client paint | suppress, unless the native frame is preserved  | handled     |
//! | Activation       | refresh pass                                    | passed on   |
//! | Size transition  | refresh pass on state change, else re-inset     | passed on   |
//! | Environment      | re-resolve theme and metrics, refresh pass      | passed on   |
//! | Pointer          | start move/resize, maximize, system menu        | either      |
//! | Lifecycle        | unregister                                      | passed on   |

use std::time::Instant;

use lattice_frameless_core::logging::{span_names, targets};
use lattice_frameless_core::{Point, Rect, Size};

use crate::chrome::ChromeEngine;
use crate::event::{
    ChromeMessage, DefaultProcessing, Disposition, EnvironmentChange, MessageReply, NonClientPaint,
    PointerAction, PointerButton,
};
use crate::handle::WindowHandle;
use crate::hit_test;
use crate::region::ChromeRegion;
use crate::registry::LifecyclePhase;
use crate::state::WindowState;
use crate::state_machine::ChromeTransition;

/// Maximum pointer travel between the two clicks of a double-click.
const DOUBLE_CLICK_SLOP: i32 = 4;

impl ChromeEngine {
    /// Handle one decoded native message for `window`.
    ///
    /// `default` gives handlers access to the OS's own processing. It is
    /// only used for client-area computation when the native frame is
    /// preserved.
    pub fn dispatch(
        &self,
        window: WindowHandle,
        message: ChromeMessage,
        default: &mut dyn DefaultProcessing,
    ) -> Disposition {
        let Some(phase) = self.registry.with_entry(window, |entry| entry.phase) else {
            return Disposition::PassThrough;
        };

        let span = tracing::trace_span!(target: targets::INTERCEPTOR, span_names::DISPATCH, %window, class = ?message.class());
        let _guard = span.enter();

        if phase == LifecyclePhase::Registered {
            self.activate(window);
        }

        let disposition = match message {
            ChromeMessage::CalcClientArea { proposed, state } => {
                self.on_calc_client_area(window, proposed, state, default)
            }
            ChromeMessage::HitTest { pos, window_size } => match self.hit_test(window, pos, window_size) {
                Some(region) => Disposition::Handled(MessageReply::HitTest(region)),
                None => Disposition::PassThrough,
            },
            ChromeMessage::NonClientPaint(kind) => self.on_non_client_paint(window, kind),
            ChromeMessage::Activate { active } => {
                self.run_refresh_pass(window, ChromeTransition::ActivationChanged(active));
                Disposition::PassThrough
            }
            ChromeMessage::SizeChanged { state, size } => self.on_size_changed(window, state, size),
            ChromeMessage::EnvironmentChanged(change) => self.on_environment_changed(window, change),
            ChromeMessage::Pointer {
                pos,
                window_size,
                button,
                action,
            } => self.on_pointer(window, pos, window_size, button, action),
            ChromeMessage::Destroyed => {
                self.unregister_window(window);
                Disposition::PassThrough
            }
        };

        tracing::trace!(target: targets::INTERCEPTOR, ?disposition, "dispatched");
        disposition
    }

    /// Classify `pos` for a registered window.
    ///
    /// Metrics are resolved before the registry is locked for
    /// classification, so the backend is never called under the lock.
    pub fn hit_test(&self, window: WindowHandle, pos: Point, window_size: Size) -> Option<ChromeRegion> {
        let (overrides, state) = self.registry.with_entry(window, |entry| {
            (entry.config.metric_overrides(), entry.runtime.window_state)
        })?;
        let metrics = self
            .metrics
            .resolve(self.backend.as_ref(), window, overrides, state);
        self.registry.with_entry(window, |entry| {
            hit_test::classify(pos, window_size, &entry.runtime, &entry.config, &metrics)
        })
    }

    fn activate(&self, window: WindowHandle) {
        let promoted = self.registry.update_entry(window, |entry| {
            let promote = entry.phase == LifecyclePhase::Registered;
            entry.phase = LifecyclePhase::Active;
            promote
        });
        // Another message may have raced us to the promotion
        if promoted != Some(true) {
            return;
        }
        if let Some(request) = self.style_request(window) {
            tracing::debug!(target: targets::INTERCEPTOR, %window, ?request, "normalizing window style");
            self.normalize_style(window, request);
        }
    }

    fn on_calc_client_area(
        &self,
        window: WindowHandle,
        proposed: Rect,
        live_state: Option<WindowState>,
        default: &mut dyn DefaultProcessing,
    ) -> Disposition {
        let Some(preserve) = self
            .registry
            .with_config(window, |config| config.preserves_native_frame())
        else {
            return Disposition::PassThrough;
        };

        let native = if preserve {
            let native = default
                .native_client_area(proposed)
                .map(|client| proposed.insets_to(&client));
            self.registry
                .update_entry(window, |entry| entry.native_insets = native);
            native
        } else {
            None
        };

        let Some(insets) = self.client_insets_for(window, live_state, native) else {
            return Disposition::PassThrough;
        };
        self.registry
            .update_entry(window, |entry| entry.client_insets = Some(insets));

        Disposition::Handled(MessageReply::ClientArea {
            rect: insets.apply(proposed),
            redraw: insets.redraw,
        })
    }

    fn on_non_client_paint(&self, window: WindowHandle, kind: NonClientPaint) -> Disposition {
        let preserve = self
            .registry
            .with_config(window, |config| config.preserves_native_frame())
            .unwrap_or(true);
        if preserve {
            return Disposition::PassThrough;
        }
        tracing::trace!(target: targets::INTERCEPTOR, %window, ?kind, "suppressing native non-client paint");
        Disposition::Handled(MessageReply::SuppressPaint)
    }

    fn on_size_changed(&self, window: WindowHandle, state: WindowState, size: Size) -> Disposition {
        let previous = self
            .registry
            .with_entry(window, |entry| entry.runtime.window_state);

        match previous {
            Some(previous) if previous != state => {
                self.run_refresh_pass(window, ChromeTransition::StateChanged(state));
            }
            Some(_) => {
                // Same state, new size: only the insets can have moved
                if let Some(insets) = self.compute_client_insets(window) {
                    self.registry
                        .update_entry(window, |entry| entry.client_insets = Some(insets));
                }
                tracing::trace!(target: targets::INTERCEPTOR, %window, width = size.width, height = size.height, "resized");
            }
            None => {}
        }
        Disposition::PassThrough
    }

    fn on_environment_changed(&self, window: WindowHandle, change: EnvironmentChange) -> Disposition {
        self.backend.environment_changed(change);
        let transition = match change {
            EnvironmentChange::Dpi { dpi } => ChromeTransition::DpiChanged(dpi),
            EnvironmentChange::Theme | EnvironmentChange::Colorization => {
                self.refresh_theme();
                ChromeTransition::EnvironmentChanged
            }
        };
        self.run_refresh_pass(window, transition);
        Disposition::PassThrough
    }

    fn on_pointer(
        &self,
        window: WindowHandle,
        pos: Point,
        window_size: Size,
        button: PointerButton,
        action: PointerAction,
    ) -> Disposition {
        self.set_pointer_position(window, Some(pos));
        let Some(region) = self.hit_test(window, pos, window_size) else {
            return Disposition::PassThrough;
        };
        // Backends that see native messages get move, resize and caption
        // double-click from the OS through hit-test codes
        let native = self.backend.intercepts_native_messages();

        match (button, action, region) {
            (PointerButton::Left, PointerAction::Press, ChromeRegion::Caption) if !native => {
                if self.is_caption_double_click(window, pos) {
                    self.on_caption_double_click(window)
                } else {
                    Disposition::Handled(MessageReply::BeginSystemMove)
                }
            }
            (PointerButton::Left, PointerAction::Press, ChromeRegion::Resize(edge)) if !native => {
                Disposition::Handled(MessageReply::BeginSystemResize(edge))
            }
            (PointerButton::Left, PointerAction::DoubleClick, ChromeRegion::Caption) if !native => {
                self.on_caption_double_click(window)
            }
            (PointerButton::Right, PointerAction::Release, ChromeRegion::Caption) => {
                self.on_caption_right_click(window, pos)
            }
            _ => Disposition::PassThrough,
        }
    }

    /// Record a caption press; `true` when it completes a double-click.
    fn is_caption_double_click(&self, window: WindowHandle, pos: Point) -> bool {
        let interval = self.options().double_click_interval;
        let now = Instant::now();
        self.registry
            .update_entry(window, |entry| match entry.last_caption_press.take() {
                Some((at, first))
                    if now.duration_since(at) <= interval
                        && (pos.x - first.x).abs() <= DOUBLE_CLICK_SLOP
                        && (pos.y - first.y).abs() <= DOUBLE_CLICK_SLOP =>
                {
                    true
                }
                _ => {
                    entry.last_caption_press = Some((now, pos));
                    false
                }
            })
            .unwrap_or(false)
    }

    fn on_caption_double_click(&self, window: WindowHandle) -> Disposition {
        let toggles = self
            .registry
            .with_config(window, |config| {
                config.double_click_maximizes() && !config.is_fixed_size()
            })
            .unwrap_or(false);
        if toggles {
            Disposition::Handled(MessageReply::ToggleMaximize)
        } else {
            Disposition::PassThrough
        }
    }

    fn on_caption_right_click(&self, window: WindowHandle, pos: Point) -> Disposition {
        let enabled = self
            .registry
            .with_config(window, |config| config.system_menu_on_right_click())
            .unwrap_or(false);
        if !enabled {
            return Disposition::PassThrough;
        }
        tracing::debug!(target: targets::INTERCEPTOR, %window, x = pos.x, y = pos.y, "system menu requested");
        self.system_menu_requested().emit((window, pos));
        Disposition::Handled(MessageReply::ShowSystemMenu(pos))
    }
}
