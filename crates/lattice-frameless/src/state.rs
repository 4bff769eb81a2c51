//! Window state and per-window runtime data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::metrics::REFERENCE_DPI;

/// The visibility state of a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WindowState {
    /// Normal window state (default size and position).
    #[default]
    Normal,
    /// Window is minimized (iconified).
    Minimized,
    /// Window is maximized (fills the work area).
    Maximized,
    /// Window is fullscreen (covers the entire monitor).
    FullScreen,
}

impl WindowState {
    /// Check if the window is in a normal state.
    pub fn is_normal(&self) -> bool {
        matches!(self, WindowState::Normal)
    }

    /// Check if the window is minimized.
    pub fn is_minimized(&self) -> bool {
        matches!(self, WindowState::Minimized)
    }

    /// Check if the window is maximized.
    pub fn is_maximized(&self) -> bool {
        matches!(self, WindowState::Maximized)
    }

    /// Check if the window is fullscreen.
    pub fn is_full_screen(&self) -> bool {
        matches!(self, WindowState::FullScreen)
    }

    /// Maximized or fullscreen: the window has no resizable frame.
    pub fn is_zoomed(&self) -> bool {
        matches!(self, WindowState::Maximized | WindowState::FullScreen)
    }
}

/// Runtime state the engine tracks for each registered window.
///
/// Updated only by the state machine; everything else reads snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRuntimeState {
    pub window_state: WindowState,
    pub is_active: bool,
    /// Effective DPI of the window, as last resolved.
    pub dpi: u32,
    /// `dpi / 96`, cached.
    pub device_pixel_ratio: f64,
}

impl WindowRuntimeState {
    /// Record a freshly resolved DPI.
    pub fn set_dpi(&mut self, dpi: u32) {
        self.dpi = dpi;
        self.device_pixel_ratio = f64::from(dpi) / f64::from(REFERENCE_DPI);
    }
}

impl Default for WindowRuntimeState {
    fn default() -> Self {
        Self {
            window_state: WindowState::Normal,
            is_active: false,
            dpi: REFERENCE_DPI,
            device_pixel_ratio: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoomed_states() {
        assert!(!WindowState::Normal.is_zoomed());
        assert!(!WindowState::Minimized.is_zoomed());
        assert!(WindowState::Maximized.is_zoomed());
        assert!(WindowState::FullScreen.is_zoomed());
    }

    #[test]
    fn test_set_dpi_updates_ratio() {
        let mut state = WindowRuntimeState::default();
        assert_eq!(state.device_pixel_ratio, 1.0);

        state.set_dpi(144);
        assert_eq!(state.dpi, 144);
        assert_eq!(state.device_pixel_ratio, 1.5);
    }
}
