//! Typed chrome messages.
//!
//! Each backend translates its native message stream (Win32 window messages,
//! toolkit window events) into [`ChromeMessage`] values once, at the message
//! loop boundary. The engine answers with a [`Disposition`]: either the
//! message was fully handled and carries a [`MessageReply`] the backend turns
//! into its native return value, or it must continue through the OS's
//! default processing.
//!
//! All positions are window-local device pixels.

use lattice_frameless_core::{Point, Rect, Size};

use crate::client_area::RedrawHint;
use crate::region::{ChromeRegion, ResizeEdge};
use crate::state::WindowState;

/// Which native non-client drawing request is being intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonClientPaint {
    /// Draw the non-client frame.
    Frame,
    /// Redraw the caption for an activation change.
    Activate { active: bool },
    /// Themed caption drawing.
    ThemedCaption,
    /// Themed frame drawing.
    ThemedFrame,
}

/// A system environment change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentChange {
    /// Light/dark scheme or visual theme changed.
    Theme,
    /// The window moved to a monitor with a different DPI.
    Dpi { dpi: u32 },
    /// Accent or colorization color changed.
    Colorization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Press,
    Release,
    /// Reported by platforms that detect double-clicks themselves.
    DoubleClick,
}

/// A window-system message, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeMessage {
    /// The OS asks for the client rectangle. `proposed` is the new window
    /// rectangle. `state` is the live window state when the OS reports the
    /// query ahead of the matching state notification.
    CalcClientArea {
        proposed: Rect,
        state: Option<WindowState>,
    },
    /// The OS asks what lies under the pointer.
    HitTest { pos: Point, window_size: Size },
    /// The OS is about to draw its own non-client decorations.
    NonClientPaint(NonClientPaint),
    /// The window gained or lost activation.
    Activate { active: bool },
    /// The window was resized, possibly changing its state.
    SizeChanged { state: WindowState, size: Size },
    /// A system-wide environment change.
    EnvironmentChanged(EnvironmentChange),
    /// A pointer button event inside the window.
    Pointer {
        pos: Point,
        window_size: Size,
        button: PointerButton,
        action: PointerAction,
    },
    /// The native window is being destroyed.
    Destroyed,
}

/// Coarse message classes, one handler per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    Geometry,
    HitTest,
    NonClientPaint,
    Activation,
    SizeTransition,
    Environment,
    Pointer,
    Lifecycle,
}

impl ChromeMessage {
    pub fn class(&self) -> MessageClass {
        match self {
            ChromeMessage::CalcClientArea { .. } => MessageClass::Geometry,
            ChromeMessage::HitTest { .. } => MessageClass::HitTest,
            ChromeMessage::NonClientPaint(_) => MessageClass::NonClientPaint,
            ChromeMessage::Activate { .. } => MessageClass::Activation,
            ChromeMessage::SizeChanged { .. } => MessageClass::SizeTransition,
            ChromeMessage::EnvironmentChanged(_) => MessageClass::Environment,
            ChromeMessage::Pointer { .. } => MessageClass::Pointer,
            ChromeMessage::Destroyed => MessageClass::Lifecycle,
        }
    }
}

/// What the engine decided to do with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Fully handled; default processing must be skipped.
    Handled(MessageReply),
    /// Not handled; continue with default processing.
    PassThrough,
}

impl Disposition {
    pub fn is_handled(&self) -> bool {
        matches!(self, Disposition::Handled(_))
    }

    pub fn reply(&self) -> Option<MessageReply> {
        match self {
            Disposition::Handled(reply) => Some(*reply),
            Disposition::PassThrough => None,
        }
    }
}

/// The answer to a handled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageReply {
    /// New client rectangle for [`ChromeMessage::CalcClientArea`].
    ClientArea { rect: Rect, redraw: RedrawHint },
    /// Region under the pointer for [`ChromeMessage::HitTest`].
    HitTest(ChromeRegion),
    /// Skip the native non-client drawing.
    SuppressPaint,
    /// Start an interactive move.
    BeginSystemMove,
    /// Start an interactive resize from the given edge.
    BeginSystemResize(ResizeEdge),
    /// Toggle maximized/restored.
    ToggleMaximize,
    /// Open the system menu at the given position.
    ShowSystemMenu(Point),
}

/// Access to the OS's default processing from inside a handler.
///
/// Handlers that need the native answer call through here rather than
/// re-entering the engine.
pub trait DefaultProcessing {
    /// The client rectangle the OS computes for `proposed` on its own.
    fn native_client_area(&mut self, proposed: Rect) -> Option<Rect>;
}

/// Default processing for callers with no native path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaultProcessing;

impl DefaultProcessing for NoDefaultProcessing {
    fn native_client_area(&mut self, _proposed: Rect) -> Option<Rect> {
        None
    }
}

impl<F> DefaultProcessing for F
where
    F: FnMut(Rect) -> Option<Rect>,
{
    fn native_client_area(&mut self, proposed: Rect) -> Option<Rect> {
        self(proposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_classes() {
        assert_eq!(
            ChromeMessage::CalcClientArea {
                proposed: Rect::ZERO,
                state: None,
            }
            .class(),
            MessageClass::Geometry
        );
        assert_eq!(
            ChromeMessage::NonClientPaint(NonClientPaint::ThemedCaption).class(),
            MessageClass::NonClientPaint
        );
        assert_eq!(ChromeMessage::Destroyed.class(), MessageClass::Lifecycle);
    }

    #[test]
    fn test_disposition_reply() {
        let handled = Disposition::Handled(MessageReply::SuppressPaint);
        assert!(handled.is_handled());
        assert_eq!(handled.reply(), Some(MessageReply::SuppressPaint));
        assert_eq!(Disposition::PassThrough.reply(), None);
    }

    #[test]
    fn test_closure_default_processing() {
        let mut native = |rect: Rect| Some(Rect::new(rect.left() + 8, rect.top() + 31, 100, 100));
        let result = native.native_client_area(Rect::new(0, 0, 116, 139));
        assert_eq!(result, Some(Rect::new(8, 31, 100, 100)));
        assert_eq!(NoDefaultProcessing.native_client_area(Rect::ZERO), None);
    }
}
