//! Hit-test region tags.

use cursor_icon::CursorIcon;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The edge or corner a resize operation grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResizeEdge {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    /// Combine a vertical and a horizontal edge test into one edge.
    ///
    /// Any vertical plus horizontal hit yields a corner; a single axis yields
    /// the plain edge.
    pub fn from_edges(top: bool, bottom: bool, left: bool, right: bool) -> Option<ResizeEdge> {
        match (top, bottom, left, right) {
            (true, _, true, _) => Some(ResizeEdge::TopLeft),
            (true, _, _, true) => Some(ResizeEdge::TopRight),
            (_, true, true, _) => Some(ResizeEdge::BottomLeft),
            (_, true, _, true) => Some(ResizeEdge::BottomRight),
            (true, _, _, _) => Some(ResizeEdge::Top),
            (_, true, _, _) => Some(ResizeEdge::Bottom),
            (_, _, true, _) => Some(ResizeEdge::Left),
            (_, _, _, true) => Some(ResizeEdge::Right),
            _ => None,
        }
    }

    /// Check if this is one of the four corners.
    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            Self::TopLeft | Self::TopRight | Self::BottomLeft | Self::BottomRight
        )
    }
}

#[cfg(feature = "winit")]
impl From<ResizeEdge> for winit::window::ResizeDirection {
    fn from(edge: ResizeEdge) -> Self {
        use winit::window::ResizeDirection;

        match edge {
            ResizeEdge::Top => ResizeDirection::North,
            ResizeEdge::Bottom => ResizeDirection::South,
            ResizeEdge::Left => ResizeDirection::West,
            ResizeEdge::Right => ResizeDirection::East,
            ResizeEdge::TopLeft => ResizeDirection::NorthWest,
            ResizeEdge::TopRight => ResizeDirection::NorthEast,
            ResizeEdge::BottomLeft => ResizeDirection::SouthWest,
            ResizeEdge::BottomRight => ResizeDirection::SouthEast,
        }
    }
}

/// A caption button the application draws itself.
///
/// Registering a button rectangle lets the classifier report it as a
/// distinct region instead of caption, so clicks reach the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SystemButtonId {
    WindowIcon,
    Help,
    Minimize,
    Maximize,
    Close,
}

/// Result of classifying a pointer position against the window chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChromeRegion {
    /// Ordinary application content.
    #[default]
    Client,

    /// Draggable title bar area.
    Caption,

    /// Resize border at the given edge or corner.
    Resize(ResizeEdge),

    /// An application-drawn caption button.
    SystemButton(SystemButtonId),

    /// The window is mouse-transparent; input goes to whatever lies beneath.
    Transparent,
}

impl ChromeRegion {
    /// Check if this region starts a resize operation.
    pub fn is_resize(&self) -> bool {
        matches!(self, Self::Resize(_))
    }

    /// The resize edge, if any.
    pub fn resize_edge(&self) -> Option<ResizeEdge> {
        match self {
            Self::Resize(edge) => Some(*edge),
            _ => None,
        }
    }

    /// Check if this region drags the window.
    pub fn is_draggable(&self) -> bool {
        matches!(self, Self::Caption)
    }

    /// The cursor to show while hovering this region.
    pub fn cursor(&self) -> CursorIcon {
        match self {
            Self::Resize(edge) => match edge {
                ResizeEdge::Top | ResizeEdge::Bottom => CursorIcon::NsResize,
                ResizeEdge::Left | ResizeEdge::Right => CursorIcon::EwResize,
                ResizeEdge::TopLeft | ResizeEdge::BottomRight => CursorIcon::NwseResize,
                ResizeEdge::TopRight | ResizeEdge::BottomLeft => CursorIcon::NeswResize,
            },
            Self::SystemButton(_) => CursorIcon::Pointer,
            Self::Client | Self::Caption | Self::Transparent => CursorIcon::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_edges_prefers_corners() {
        assert_eq!(
            ResizeEdge::from_edges(true, false, true, false),
            Some(ResizeEdge::TopLeft)
        );
        assert_eq!(
            ResizeEdge::from_edges(false, true, false, true),
            Some(ResizeEdge::BottomRight)
        );
        assert_eq!(
            ResizeEdge::from_edges(false, false, false, true),
            Some(ResizeEdge::Right)
        );
        assert_eq!(ResizeEdge::from_edges(false, false, false, false), None);
    }

    #[test]
    fn test_region_predicates() {
        let region = ChromeRegion::Resize(ResizeEdge::Left);
        assert!(region.is_resize());
        assert!(!region.is_draggable());
        assert_eq!(region.resize_edge(), Some(ResizeEdge::Left));

        assert!(ChromeRegion::Caption.is_draggable());
        assert_eq!(ChromeRegion::Client.resize_edge(), None);
    }

    #[test]
    fn test_region_cursors() {
        assert_eq!(
            ChromeRegion::Resize(ResizeEdge::Top).cursor(),
            CursorIcon::NsResize
        );
        assert_eq!(
            ChromeRegion::Resize(ResizeEdge::BottomLeft).cursor(),
            CursorIcon::NeswResize
        );
        assert_eq!(ChromeRegion::Caption.cursor(), CursorIcon::Default);
        assert_eq!(
            ChromeRegion::SystemButton(SystemButtonId::Close).cursor(),
            CursorIcon::Pointer
        );
    }
}
