//! Per-window chrome configuration and process-wide engine options.
//!
//! [`WindowChromeConfig`] describes how one frameless window should behave:
//! which areas drag the window, which areas are excluded from chrome
//! classification, and optional metric overrides. The window registry owns
//! one per registered window; the application mutates it through the
//! engine's setters.
//!
//! # Example
//!
//! ```ignore
//! use lattice_frameless::{WindowChromeConfig, SystemButtonId};
//! use lattice_frameless_core::Rect;
//!
//! let config = WindowChromeConfig::new()
//!     .with_title_bar_height(40)
//!     .with_ignored_region(Rect::new(8, 4, 120, 28))    // menu bar
//!     .with_system_button(SystemButtonId::Close, Rect::new(752, 0, 48, 32));
//! ```

use std::time::Duration;

use lattice_frameless_core::Rect;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::metrics::{
    DEFAULT_CAPTION_HEIGHT, DEFAULT_FRAME_BORDER_THICKNESS, DEFAULT_RESIZE_BORDER_THICKNESS,
    REFERENCE_DPI,
};
use crate::region::SystemButtonId;

/// Chrome configuration for a single frameless window.
///
/// All rectangles are in window-local device pixels with the origin at the
/// top-left corner of the window. Metric overrides are unscaled (logical)
/// pixels and are scaled by the window's DPI when used.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowChromeConfig {
    /// Resize border thickness override. `None` uses the platform default.
    resize_border_thickness: Option<i32>,

    /// Title bar height override. `None` derives it from caption height.
    title_bar_height: Option<i32>,

    /// Disables resize hit-testing entirely.
    fixed_size: bool,

    /// When non-empty, only these areas of the caption drag the window.
    draggable_regions: Vec<Rect>,

    /// Areas excluded from both drag and resize classification.
    ignored_regions: Vec<Rect>,

    /// All hit-tests pass through to whatever lies beneath the window.
    mouse_transparent: bool,

    /// Application-drawn caption buttons.
    system_buttons: Vec<(SystemButtonId, Rect)>,

    /// Keep the OS frame on the left, right and bottom edges.
    preserve_native_frame: bool,

    /// Double-clicking the caption toggles maximize.
    double_click_maximizes: bool,

    /// Right-clicking the caption requests the system menu.
    system_menu_on_right_click: bool,
}

impl Default for WindowChromeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowChromeConfig {
    /// Create a configuration that uses platform defaults everywhere.
    pub fn new() -> Self {
        Self {
            resize_border_thickness: None,
            title_bar_height: None,
            fixed_size: false,
            draggable_regions: Vec::new(),
            ignored_regions: Vec::new(),
            mouse_transparent: false,
            system_buttons: Vec::new(),
            preserve_native_frame: false,
            double_click_maximizes: true,
            system_menu_on_right_click: true,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Override the resize border thickness (unscaled pixels).
    pub fn with_resize_border_thickness(mut self, px: i32) -> Self {
        self.resize_border_thickness = Some(px.max(0));
        self
    }

    /// Override the title bar height (unscaled pixels).
    pub fn with_title_bar_height(mut self, px: i32) -> Self {
        self.title_bar_height = Some(px.max(0));
        self
    }

    /// Make the window fixed-size.
    pub fn with_fixed_size(mut self, fixed: bool) -> Self {
        self.fixed_size = fixed;
        self
    }

    /// Add a draggable region.
    pub fn with_draggable_region(mut self, region: Rect) -> Self {
        self.set_draggable_region(region, true);
        self
    }

    /// Add an ignored region.
    pub fn with_ignored_region(mut self, region: Rect) -> Self {
        self.set_ignored_region(region, true);
        self
    }

    /// Make the window mouse-transparent.
    pub fn with_mouse_transparent(mut self, transparent: bool) -> Self {
        self.mouse_transparent = transparent;
        self
    }

    /// Declare an application-drawn caption button.
    pub fn with_system_button(mut self, id: SystemButtonId, region: Rect) -> Self {
        self.set_system_button(id, Some(region));
        self
    }

    /// Keep the native frame on the non-caption edges.
    pub fn with_preserve_native_frame(mut self, preserve: bool) -> Self {
        self.preserve_native_frame = preserve;
        self
    }

    /// Enable or disable maximize on caption double-click.
    pub fn with_double_click_maximizes(mut self, enabled: bool) -> Self {
        self.double_click_maximizes = enabled;
        self
    }

    /// Enable or disable the system menu on caption right-click.
    pub fn with_system_menu_on_right_click(mut self, enabled: bool) -> Self {
        self.system_menu_on_right_click = enabled;
        self
    }

    // =========================================================================
    // Setters (for runtime modification)
    // =========================================================================

    pub fn set_resize_border_thickness(&mut self, px: Option<i32>) {
        self.resize_border_thickness = px.map(|px| px.max(0));
    }

    pub fn set_title_bar_height(&mut self, px: Option<i32>) {
        self.title_bar_height = px.map(|px| px.max(0));
    }

    pub fn set_fixed_size(&mut self, fixed: bool) {
        self.fixed_size = fixed;
    }

    pub fn set_mouse_transparent(&mut self, transparent: bool) {
        self.mouse_transparent = transparent;
    }

    pub fn set_preserve_native_frame(&mut self, preserve: bool) {
        self.preserve_native_frame = preserve;
    }

    /// Add (`enabled`) or remove a draggable region.
    ///
    /// Adding a region that is already present is a no-op, so a region is
    /// never listed twice. Returns whether the list changed.
    pub fn set_draggable_region(&mut self, region: Rect, enabled: bool) -> bool {
        toggle_region(&mut self.draggable_regions, region, enabled)
    }

    /// Add (`enabled`) or remove an ignored region. Returns whether the list changed.
    pub fn set_ignored_region(&mut self, region: Rect, enabled: bool) -> bool {
        toggle_region(&mut self.ignored_regions, region, enabled)
    }

    /// Declare (`Some`) or remove (`None`) a caption button.
    pub fn set_system_button(&mut self, id: SystemButtonId, region: Option<Rect>) {
        self.system_buttons.retain(|(existing, _)| *existing != id);
        if let Some(region) = region {
            self.system_buttons.push((id, region));
        }
    }

    pub fn clear_draggable_regions(&mut self) {
        self.draggable_regions.clear();
    }

    pub fn clear_ignored_regions(&mut self) {
        self.ignored_regions.clear();
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn resize_border_thickness(&self) -> Option<i32> {
        self.resize_border_thickness
    }

    pub fn title_bar_height(&self) -> Option<i32> {
        self.title_bar_height
    }

    pub fn is_fixed_size(&self) -> bool {
        self.fixed_size
    }

    pub fn draggable_regions(&self) -> &[Rect] {
        &self.draggable_regions
    }

    pub fn ignored_regions(&self) -> &[Rect] {
        &self.ignored_regions
    }

    pub fn is_mouse_transparent(&self) -> bool {
        self.mouse_transparent
    }

    pub fn system_buttons(&self) -> &[(SystemButtonId, Rect)] {
        &self.system_buttons
    }

    /// The declared rectangle of a caption button.
    pub fn system_button(&self, id: SystemButtonId) -> Option<Rect> {
        self.system_buttons
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, rect)| *rect)
    }

    pub fn preserves_native_frame(&self) -> bool {
        self.preserve_native_frame
    }

    pub fn double_click_maximizes(&self) -> bool {
        self.double_click_maximizes
    }

    pub fn system_menu_on_right_click(&self) -> bool {
        self.system_menu_on_right_click
    }

    /// The metric overrides alone, copied out of the configuration.
    pub fn metric_overrides(&self) -> MetricOverrides {
        MetricOverrides {
            resize_border_thickness: self.resize_border_thickness,
            title_bar_height: self.title_bar_height,
        }
    }
}

/// The per-window metric overrides of a [`WindowChromeConfig`].
///
/// Small enough to copy out of the registry so metrics can be resolved
/// without holding the registry lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricOverrides {
    pub resize_border_thickness: Option<i32>,
    pub title_bar_height: Option<i32>,
}

fn toggle_region(regions: &mut Vec<Rect>, region: Rect, enabled: bool) -> bool {
    if enabled {
        if regions.contains(&region) {
            return false;
        }
        regions.push(region);
        true
    } else {
        let before = regions.len();
        regions.retain(|existing| *existing != region);
        regions.len() != before
    }
}

/// Process-wide options passed to the engine at initialization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineOptions {
    /// DPI that corresponds to a device pixel ratio of 1.0.
    pub reference_dpi: u32,
    /// Strip kept free on an auto-hide taskbar's edge so it can be revealed.
    pub auto_hide_reveal_strip: i32,
    /// Fallback resize border thickness (unscaled).
    pub default_resize_border_thickness: i32,
    /// Fallback caption height (unscaled).
    pub default_caption_height: i32,
    /// Thickness of the decorative frame border (unscaled).
    pub frame_border_thickness: i32,
    /// Maximum delay between two clicks of a caption double-click.
    pub double_click_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            reference_dpi: REFERENCE_DPI,
            auto_hide_reveal_strip: 2,
            default_resize_border_thickness: DEFAULT_RESIZE_BORDER_THICKNESS,
            default_caption_height: DEFAULT_CAPTION_HEIGHT,
            frame_border_thickness: DEFAULT_FRAME_BORDER_THICKNESS,
            double_click_interval: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WindowChromeConfig::new();
        assert_eq!(config.resize_border_thickness(), None);
        assert_eq!(config.title_bar_height(), None);
        assert!(!config.is_fixed_size());
        assert!(!config.is_mouse_transparent());
        assert!(config.draggable_regions().is_empty());
        assert!(config.ignored_regions().is_empty());
        assert!(config.double_click_maximizes());
        assert!(config.system_menu_on_right_click());
    }

    #[test]
    fn test_builder_chain() {
        let config = WindowChromeConfig::new()
            .with_resize_border_thickness(6)
            .with_title_bar_height(40)
            .with_fixed_size(true)
            .with_draggable_region(Rect::new(100, 0, 400, 40))
            .with_ignored_region(Rect::new(0, 0, 80, 40));

        assert_eq!(config.resize_border_thickness(), Some(6));
        assert_eq!(config.title_bar_height(), Some(40));
        assert!(config.is_fixed_size());
        assert_eq!(config.draggable_regions().len(), 1);
        assert_eq!(config.ignored_regions().len(), 1);
    }

    #[test]
    fn test_negative_overrides_clamp_to_zero() {
        let config = WindowChromeConfig::new()
            .with_resize_border_thickness(-4)
            .with_title_bar_height(-1);
        assert_eq!(config.resize_border_thickness(), Some(0));
        assert_eq!(config.title_bar_height(), Some(0));
    }

    #[test]
    fn test_region_toggle_never_duplicates() {
        let mut config = WindowChromeConfig::new();
        let region = Rect::new(10, 0, 50, 30);

        assert!(config.set_ignored_region(region, true));
        assert!(!config.set_ignored_region(region, true));
        assert_eq!(config.ignored_regions(), &[region]);

        assert!(config.set_ignored_region(region, false));
        assert!(!config.set_ignored_region(region, false));
        assert!(config.ignored_regions().is_empty());
    }

    #[test]
    fn test_system_button_replaces_previous_rect() {
        let mut config = WindowChromeConfig::new()
            .with_system_button(SystemButtonId::Close, Rect::new(760, 0, 40, 30));
        config.set_system_button(SystemButtonId::Close, Some(Rect::new(740, 0, 60, 30)));

        assert_eq!(config.system_buttons().len(), 1);
        assert_eq!(
            config.system_button(SystemButtonId::Close),
            Some(Rect::new(740, 0, 60, 30))
        );

        config.set_system_button(SystemButtonId::Close, None);
        assert_eq!(config.system_button(SystemButtonId::Close), None);
    }

    #[test]
    fn test_engine_options_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.reference_dpi, 96);
        assert_eq!(options.auto_hide_reveal_strip, 2);
        assert_eq!(options.default_resize_border_thickness, 8);
        assert_eq!(options.default_caption_height, 23);
        assert_eq!(options.frame_border_thickness, 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde_round_trip() {
        let config = WindowChromeConfig::new()
            .with_title_bar_height(36)
            .with_ignored_region(Rect::new(0, 0, 10, 10));
        let json = serde_json::to_string(&config).unwrap();
        let restored: WindowChromeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
