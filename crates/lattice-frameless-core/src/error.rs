//! Error types for the frameless chrome engine.
//!
//! Errors never escape the public chrome API: registration, query and
//! notification entry points degrade to a no-op or a documented default.
//! [`ChromeError`] flows between the platform backends and the engine so
//! that fallback decisions can be made on the kind of failure.

use std::fmt;

use thiserror::Error;

/// An optional OS capability detected at runtime.
///
/// Each capability is resolved once; when absent the engine falls back to
/// the next tier of its resolution chain and logs the fact a single time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Capability {
    /// DPI reported for an individual window.
    WindowDpi = 0,
    /// Effective DPI of the monitor hosting a window.
    MonitorDpi,
    /// System-wide DPI.
    SystemDpi,
    /// System metrics queried for an explicit DPI.
    DpiAwareMetrics,
    /// Per-edge query for auto-hide taskbars.
    AutoHideTaskbarEdges,
    /// Legacy taskbar placement query.
    TaskbarPlacement,
    /// Compositor-managed frame extension.
    FrameComposition,
    /// Interactive move started by the window manager.
    SystemMove,
    /// Interactive resize started by the window manager.
    SystemResize,
    /// Native window menu.
    SystemMenu,
    /// Maximize/restore toggling through the window manager.
    MaximizeToggle,
    /// System accent color.
    AccentColor,
    /// Window style normalization.
    StyleNormalization,
}

impl Capability {
    /// Every capability, in bit order.
    pub const ALL: [Capability; 13] = [
        Capability::WindowDpi,
        Capability::MonitorDpi,
        Capability::SystemDpi,
        Capability::DpiAwareMetrics,
        Capability::AutoHideTaskbarEdges,
        Capability::TaskbarPlacement,
        Capability::FrameComposition,
        Capability::SystemMove,
        Capability::SystemResize,
        Capability::SystemMenu,
        Capability::MaximizeToggle,
        Capability::AccentColor,
        Capability::StyleNormalization,
    ];

    /// Bit used to track this capability in a `u32` set.
    #[inline]
    pub const fn bit(self) -> u32 {
        1 << (self as u8)
    }

    /// Stable human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Capability::WindowDpi => "window DPI",
            Capability::MonitorDpi => "monitor DPI",
            Capability::SystemDpi => "system DPI",
            Capability::DpiAwareMetrics => "DPI-aware system metrics",
            Capability::AutoHideTaskbarEdges => "auto-hide taskbar edge query",
            Capability::TaskbarPlacement => "taskbar placement query",
            Capability::FrameComposition => "frame composition",
            Capability::SystemMove => "system move",
            Capability::SystemResize => "system resize",
            Capability::SystemMenu => "system menu",
            Capability::MaximizeToggle => "maximize toggle",
            Capability::AccentColor => "accent color",
            Capability::StyleNormalization => "window style normalization",
        }
    }
}

static_assertions::const_assert!(Capability::ALL.len() <= 32);

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors produced inside the chrome engine and its platform backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChromeError {
    /// The window handle is unknown, destroyed or of the wrong kind.
    #[error("invalid window handle {0:#x}")]
    InvalidHandle(u64),

    /// A caller-supplied value is out of range.
    #[error("invalid {what}: {value}")]
    InvalidArgument { what: &'static str, value: String },

    /// An optional OS capability is not available on this system.
    #[error("capability not available: {0}")]
    CapabilityAbsent(Capability),

    /// A native API call failed.
    #[error("{api} failed: {message}")]
    PlatformCall { api: &'static str, message: String },

    /// The engine has not been initialized, or has been shut down.
    #[error("chrome engine is not initialized")]
    NotInitialized,
}

impl ChromeError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(what: &'static str, value: impl fmt::Display) -> Self {
        Self::InvalidArgument {
            what,
            value: value.to_string(),
        }
    }

    /// Create a platform-call error.
    pub fn platform(api: &'static str, message: impl Into<String>) -> Self {
        Self::PlatformCall {
            api,
            message: message.into(),
        }
    }

    /// The missing capability, if this is a capability-absent error.
    pub fn absent_capability(&self) -> Option<Capability> {
        match self {
            Self::CapabilityAbsent(capability) => Some(*capability),
            _ => None,
        }
    }
}

/// Result type for chrome engine operations.
pub type ChromeResult<T> = Result<T, ChromeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_bits_are_distinct() {
        let mut seen = 0u32;
        for capability in Capability::ALL {
            assert_eq!(seen & capability.bit(), 0, "{capability} reuses a bit");
            seen |= capability.bit();
        }
    }

    #[test]
    fn test_error_display() {
        let err = ChromeError::platform("GetDpiForWindow", "access denied");
        assert_eq!(err.to_string(), "GetDpiForWindow failed: access denied");

        let err = ChromeError::invalid_argument("resize border thickness", -3);
        assert_eq!(err.to_string(), "invalid resize border thickness: -3");

        let err = ChromeError::InvalidHandle(0x1f);
        assert_eq!(err.to_string(), "invalid window handle 0x1f");
    }

    #[test]
    fn test_absent_capability() {
        let err = ChromeError::CapabilityAbsent(Capability::MonitorDpi);
        assert_eq!(err.absent_capability(), Some(Capability::MonitorDpi));
        assert_eq!(ChromeError::NotInitialized.absent_capability(), None);
    }
}
