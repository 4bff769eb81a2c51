//! System theme and frame border colors.
//!
//! The rendering layer draws a one-pixel frame border around a frameless
//! window in `Normal` state. Its color follows the system: the accent color
//! while the window is active (when the platform reports one), otherwise a
//! gray matched to the light or dark scheme.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Color Scheme
// ============================================================================

/// The system color scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColorScheme {
    /// Light color scheme (dark text on light background).
    Light,
    /// Dark color scheme (light text on dark background).
    Dark,
    /// Color scheme could not be determined or user has no preference.
    #[default]
    Unknown,
}

impl ColorScheme {
    /// Returns true if this is the dark color scheme.
    pub fn is_dark(&self) -> bool {
        matches!(self, ColorScheme::Dark)
    }
}

// ============================================================================
// Colors
// ============================================================================

/// An RGB color value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RgbColor {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
}

impl RgbColor {
    /// Create a new color from RGB components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Active frame border without an accent color, light scheme.
pub const ACTIVE_BORDER_LIGHT: RgbColor = RgbColor::new(110, 110, 110);
/// Active frame border without an accent color, dark scheme.
pub const ACTIVE_BORDER_DARK: RgbColor = RgbColor::new(51, 51, 51);
/// Inactive frame border, light scheme.
pub const INACTIVE_BORDER_LIGHT: RgbColor = RgbColor::new(167, 167, 167);
/// Inactive frame border, dark scheme.
pub const INACTIVE_BORDER_DARK: RgbColor = RgbColor::new(61, 61, 62);

/// Pick the frame border color.
///
/// An unknown scheme is treated as light.
pub fn frame_border_color(active: bool, scheme: ColorScheme, accent: Option<RgbColor>) -> RgbColor {
    match (active, accent) {
        (true, Some(accent)) => accent,
        (true, None) if scheme.is_dark() => ACTIVE_BORDER_DARK,
        (true, None) => ACTIVE_BORDER_LIGHT,
        (false, _) if scheme.is_dark() => INACTIVE_BORDER_DARK,
        (false, _) => INACTIVE_BORDER_LIGHT,
    }
}

// ============================================================================
// Theme Info
// ============================================================================

/// Complete information about the current system theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeInfo {
    /// The current color scheme (light/dark).
    pub color_scheme: ColorScheme,
    /// The system accent color, if available.
    pub accent_color: Option<RgbColor>,
}

// ============================================================================
// System Theme
// ============================================================================

/// One-shot queries for the current system theme.
pub struct SystemTheme;

impl SystemTheme {
    /// Get the current system color scheme (light/dark mode).
    #[cfg(feature = "system-theme")]
    pub fn color_scheme() -> ColorScheme {
        match dark_light::detect() {
            dark_light::Mode::Dark => ColorScheme::Dark,
            dark_light::Mode::Light => ColorScheme::Light,
            dark_light::Mode::Default => ColorScheme::Unknown,
        }
    }

    #[cfg(not(feature = "system-theme"))]
    pub fn color_scheme() -> ColorScheme {
        ColorScheme::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_color_displays_as_hex() {
        assert_eq!(RgbColor::new(0x00, 0x78, 0xD4).to_string(), "#0078d4");
    }

    #[test]
    fn test_active_border_prefers_accent() {
        let accent = RgbColor::new(0, 120, 212);
        assert_eq!(frame_border_color(true, ColorScheme::Dark, Some(accent)), accent);
        assert_eq!(frame_border_color(true, ColorScheme::Dark, None), ACTIVE_BORDER_DARK);
        assert_eq!(frame_border_color(true, ColorScheme::Light, None), ACTIVE_BORDER_LIGHT);
    }

    #[test]
    fn test_inactive_border_ignores_accent() {
        let accent = RgbColor::new(0, 120, 212);
        assert_eq!(
            frame_border_color(false, ColorScheme::Light, Some(accent)),
            INACTIVE_BORDER_LIGHT
        );
        assert_eq!(frame_border_color(false, ColorScheme::Dark, None), INACTIVE_BORDER_DARK);
        assert_eq!(
            frame_border_color(false, ColorScheme::Unknown, None),
            INACTIVE_BORDER_LIGHT
        );
    }
}
