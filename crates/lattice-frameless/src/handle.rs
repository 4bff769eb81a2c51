//! Opaque native window handles.

use std::fmt;

use raw_window_handle::{HandleError, HasWindowHandle, RawWindowHandle};

/// An opaque identifier for a native top-level window.
///
/// The value is whatever the platform uses to address a window: an `HWND` on
/// Windows, an X11 window id, or the `NSView` pointer backing an AppKit
/// window. The engine never dereferences it; only the platform backend does.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowHandle(u64);

impl WindowHandle {
    /// Wrap a raw platform handle value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw platform handle value.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// True for the null handle, which never names a window.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Extract the handle from a `raw-window-handle` value.
    ///
    /// Returns `None` for handle kinds the engine does not address.
    pub fn from_raw_window_handle(handle: RawWindowHandle) -> Option<Self> {
        let raw = match handle {
            RawWindowHandle::Win32(handle) => handle.hwnd.get() as u64,
            RawWindowHandle::Xlib(handle) => handle.window as u64,
            RawWindowHandle::Xcb(handle) => u64::from(handle.window.get()),
            RawWindowHandle::AppKit(handle) => handle.ns_view.as_ptr() as usize as u64,
            RawWindowHandle::Wayland(handle) => handle.surface.as_ptr() as usize as u64,
            _ => return None,
        };
        (raw != 0).then_some(Self(raw))
    }

    /// Resolve the handle of any window that exposes a raw window handle.
    pub fn for_window(window: &impl HasWindowHandle) -> Result<Self, HandleError> {
        let handle = window.window_handle()?;
        Self::from_raw_window_handle(handle.as_raw()).ok_or(HandleError::NotSupported)
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowHandle({:#x})", self.0)
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
