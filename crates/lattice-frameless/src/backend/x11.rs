//! X11 backend.
//!
//! Talks to the window manager through EWMH client messages over an
//! `x11rb` connection that is opened on first use. X11 has no native
//! non-client area, so there is nothing to subclass: pointer, resize and
//! focus events reach the engine through the winit bridge, and a move or
//! resize is handed to the window manager with `_NET_WM_MOVERESIZE`.

use std::sync::OnceLock;

use parking_lot::RwLock;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ConnectionExt as _, EventMask, PropMode, Screen, Window,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use lattice_frameless_core::logging::targets;
use lattice_frameless_core::{Capability, ChromeError, ChromeResult, Point};

use super::{PlatformChromeBackend, StyleRequest, SystemMetric, TaskbarEdges, TaskbarPlacement};
use crate::event::EnvironmentChange;
use crate::handle::WindowHandle;
use crate::region::ResizeEdge;
use crate::theme::RgbColor;

x11rb::atom_manager! {
    Atoms: AtomsCookie {
        _NET_WM_MOVERESIZE,
        _NET_WM_STATE,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        _GTK_SHOW_WINDOW_MENU,
        _MOTIF_WM_HINTS,
    }
}

// _NET_WM_MOVERESIZE directions
const MOVERESIZE_SIZE_TOPLEFT: u32 = 0;
const MOVERESIZE_SIZE_TOP: u32 = 1;
const MOVERESIZE_SIZE_TOPRIGHT: u32 = 2;
const MOVERESIZE_SIZE_RIGHT: u32 = 3;
const MOVERESIZE_SIZE_BOTTOMRIGHT: u32 = 4;
const MOVERESIZE_SIZE_BOTTOM: u32 = 5;
const MOVERESIZE_SIZE_BOTTOMLEFT: u32 = 6;
const MOVERESIZE_SIZE_LEFT: u32 = 7;
const MOVERESIZE_MOVE: u32 = 8;

const BUTTON_LEFT: u32 = 1;
/// Source indication: a normal application.
const SOURCE_APPLICATION: u32 = 1;
const NET_WM_STATE_TOGGLE: u32 = 2;
const MWM_HINTS_DECORATIONS: u32 = 1 << 1;

fn moveresize_direction(edge: ResizeEdge) -> u32 {
    match edge {
        ResizeEdge::TopLeft => MOVERESIZE_SIZE_TOPLEFT,
        ResizeEdge::Top => MOVERESIZE_SIZE_TOP,
        ResizeEdge::TopRight => MOVERESIZE_SIZE_TOPRIGHT,
        ResizeEdge::Right => MOVERESIZE_SIZE_RIGHT,
        ResizeEdge::BottomRight => MOVERESIZE_SIZE_BOTTOMRIGHT,
        ResizeEdge::Bottom => MOVERESIZE_SIZE_BOTTOM,
        ResizeEdge::BottomLeft => MOVERESIZE_SIZE_BOTTOMLEFT,
        ResizeEdge::Left => MOVERESIZE_SIZE_LEFT,
    }
}

/// `_MOTIF_WM_HINTS` value: flags, functions, decorations, input mode, status.
fn motif_hints(preserve_native_frame: bool) -> [u32; 5] {
    let decorations = u32::from(preserve_native_frame);
    [MWM_HINTS_DECORATIONS, 0, decorations, 0, 0]
}

/// Extract `Xft.dpi` from the root window's resource database.
fn parse_xft_dpi(resources: &str) -> Option<u32> {
    resources.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim() != "Xft.dpi" {
            return None;
        }
        let dpi: f64 = value.trim().parse().ok()?;
        (dpi > 0.0).then(|| dpi.round() as u32)
    })
}

/// DPI implied by the screen's physical size.
fn screen_dpi(screen: &Screen) -> Option<u32> {
    if screen.width_in_millimeters == 0 {
        return None;
    }
    let dpi = f64::from(screen.width_in_pixels) * 25.4 / f64::from(screen.width_in_millimeters);
    (dpi >= 1.0).then(|| dpi.round() as u32)
}

fn x11_error(api: &'static str, err: impl std::fmt::Display) -> ChromeError {
    ChromeError::platform(api, err.to_string())
}

struct X11Connection {
    conn: RustConnection,
    screen: Screen,
    atoms: Atoms,
}

impl X11Connection {
    fn open() -> ChromeResult<Self> {
        let (conn, screen_num) = x11rb::connect(None).map_err(|e| x11_error("connect", e))?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .cloned()
            .ok_or_else(|| ChromeError::platform("connect", "no such screen"))?;
        let atoms = Atoms::new(&conn)
            .map_err(|e| x11_error("intern_atom", e))?
            .reply()
            .map_err(|e| x11_error("intern_atom", e))?;
        Ok(Self { conn, screen, atoms })
    }

    fn root(&self) -> Window {
        self.screen.root
    }

    fn to_root(&self, window: Window, pos: Point) -> ChromeResult<(i32, i32)> {
        let reply = self
            .conn
            .translate_coordinates(window, self.root(), pos.x as i16, pos.y as i16)
            .map_err(|e| x11_error("translate_coordinates", e))?
            .reply()
            .map_err(|e| x11_error("translate_coordinates", e))?;
        Ok((i32::from(reply.dst_x), i32::from(reply.dst_y)))
    }

    /// Send a client message to the window manager through the root window.
    fn send_to_wm(&self, window: Window, message_type: u32, data: [u32; 5]) -> ChromeResult<()> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn
            .send_event(
                false,
                self.root(),
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )
            .map_err(|e| x11_error("send_event", e))?;
        self.conn.flush().map_err(|e| x11_error("flush", e))
    }

    /// Hand the pointer to the window manager for a move or resize.
    fn moveresize(&self, window: Window, pos: Point, direction: u32) -> ChromeResult<()> {
        let (x_root, y_root) = self.to_root(window, pos)?;
        // The WM cannot grab a pointer we still hold
        self.conn
            .ungrab_pointer(x11rb::CURRENT_TIME)
            .map_err(|e| x11_error("ungrab_pointer", e))?;
        self.send_to_wm(
            window,
            self.atoms._NET_WM_MOVERESIZE,
            [
                x_root as u32,
                y_root as u32,
                direction,
                BUTTON_LEFT,
                SOURCE_APPLICATION,
            ],
        )
    }

    fn resource_dpi(&self) -> Option<u32> {
        let reply = self
            .conn
            .get_property(
                false,
                self.root(),
                AtomEnum::RESOURCE_MANAGER,
                AtomEnum::STRING,
                0,
                u32::MAX / 4,
            )
            .ok()?
            .reply()
            .ok()?;
        parse_xft_dpi(&String::from_utf8_lossy(&reply.value))
    }
}

/// The system DPI, read from the server once per environment change.
#[derive(Debug, Default)]
struct DpiCache {
    // Outer `None` until the first successful query after an invalidation
    value: RwLock<Option<Option<u32>>>,
}

impl DpiCache {
    fn get_or_query(
        &self,
        query: impl FnOnce() -> ChromeResult<Option<u32>>,
    ) -> ChromeResult<Option<u32>> {
        if let Some(dpi) = *self.value.read() {
            return Ok(dpi);
        }
        let dpi = query()?;
        *self.value.write() = Some(dpi);
        Ok(dpi)
    }

    fn invalidate(&self) {
        *self.value.write() = None;
    }
}

/// [`PlatformChromeBackend`] for X11 window managers.
#[derive(Default)]
pub struct X11Backend {
    connection: OnceLock<Option<X11Connection>>,
    system_dpi: DpiCache,
}

impl std::fmt::Debug for X11Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X11Backend")
            .field("connected", &matches!(self.connection.get(), Some(Some(_))))
            .field("system_dpi", &self.system_dpi)
            .finish()
    }
}

impl X11Backend {
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&self) -> ChromeResult<&X11Connection> {
        self.connection
            .get_or_init(|| match X11Connection::open() {
                Ok(connection) => {
                    tracing::debug!(target: targets::BACKEND, "connected to X server");
                    Some(connection)
                }
                Err(err) => {
                    tracing::warn!(target: targets::BACKEND, error = %err, "X server unavailable");
                    None
                }
            })
            .as_ref()
            .ok_or_else(|| ChromeError::platform("connect", "X server unavailable"))
    }

    fn x11_window(window: WindowHandle) -> ChromeResult<Window> {
        Window::try_from(window.as_raw()).map_err(|_| ChromeError::InvalidHandle(window.as_raw()))
    }
}

impl PlatformChromeBackend for X11Backend {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn window_dpi(&self, _window: WindowHandle) -> ChromeResult<u32> {
        Err(ChromeError::CapabilityAbsent(Capability::WindowDpi))
    }

    fn monitor_dpi(&self, _window: WindowHandle) -> ChromeResult<u32> {
        Err(ChromeError::CapabilityAbsent(Capability::MonitorDpi))
    }

    fn system_dpi(&self) -> ChromeResult<u32> {
        self.system_dpi
            .get_or_query(|| {
                let connection = self.connection()?;
                let dpi = connection
                    .resource_dpi()
                    .or_else(|| screen_dpi(&connection.screen));
                tracing::debug!(target: targets::BACKEND, ?dpi, "read system DPI");
                Ok(dpi)
            })?
            .ok_or(ChromeError::CapabilityAbsent(Capability::SystemDpi))
    }

    fn platform_default_metric(&self, metric: SystemMetric) -> Option<i32> {
        match metric {
            SystemMetric::FrameBorder => Some(1),
            _ => None,
        }
    }

    fn query_system_metric(&self, _metric: SystemMetric, _dpi: u32) -> ChromeResult<i32> {
        Err(ChromeError::CapabilityAbsent(Capability::DpiAwareMetrics))
    }

    fn auto_hide_taskbar_edges(&self, _window: WindowHandle) -> ChromeResult<TaskbarEdges> {
        Err(ChromeError::CapabilityAbsent(Capability::AutoHideTaskbarEdges))
    }

    fn taskbar_placement(&self, _window: WindowHandle) -> ChromeResult<Option<TaskbarPlacement>> {
        Err(ChromeError::CapabilityAbsent(Capability::TaskbarPlacement))
    }

    fn native_border_suppressed(&self, _window: WindowHandle) -> bool {
        true
    }

    fn normalize_window_style(&self, window: WindowHandle, request: StyleRequest) -> ChromeResult<()> {
        let connection = self.connection()?;
        let x11_window = Self::x11_window(window)?;
        let hints = motif_hints(request.preserve_native_frame);
        let motif = connection.atoms._MOTIF_WM_HINTS;
        connection
            .conn
            .change_property32(PropMode::REPLACE, x11_window, motif, motif, &hints)
            .map_err(|e| x11_error("change_property", e))?;
        connection.conn.flush().map_err(|e| x11_error("flush", e))?;
        tracing::debug!(target: targets::BACKEND, %window, ?hints, "motif decoration hints set");
        Ok(())
    }

    fn refresh_frame(&self, _window: WindowHandle) -> ChromeResult<()> {
        // Without decorations the client area is the whole window
        Ok(())
    }

    fn start_system_move(&self, window: WindowHandle, pos: Point) -> ChromeResult<()> {
        self.connection()?
            .moveresize(Self::x11_window(window)?, pos, MOVERESIZE_MOVE)
    }

    fn start_system_resize(
        &self,
        window: WindowHandle,
        edge: ResizeEdge,
        pos: Point,
    ) -> ChromeResult<()> {
        self.connection()?
            .moveresize(Self::x11_window(window)?, pos, moveresize_direction(edge))
    }

    fn toggle_maximized(&self, window: WindowHandle) -> ChromeResult<()> {
        let connection = self.connection()?;
        let atoms = &connection.atoms;
        connection.send_to_wm(
            Self::x11_window(window)?,
            atoms._NET_WM_STATE,
            [
                NET_WM_STATE_TOGGLE,
                atoms._NET_WM_STATE_MAXIMIZED_VERT,
                atoms._NET_WM_STATE_MAXIMIZED_HORZ,
                SOURCE_APPLICATION,
                0,
            ],
        )
    }

    fn show_system_menu(&self, window: WindowHandle, pos: Point) -> ChromeResult<()> {
        let connection = self.connection()?;
        let x11_window = Self::x11_window(window)?;
        let (x_root, y_root) = connection.to_root(x11_window, pos)?;
        connection.conn
            .ungrab_pointer(x11rb::CURRENT_TIME)
            .map_err(|e| x11_error("ungrab_pointer", e))?;
        // Device id 0: the core pointer
        connection.send_to_wm(
            x11_window,
            connection.atoms._GTK_SHOW_WINDOW_MENU,
            [0, x_root as u32, y_root as u32, 0, 0],
        )
    }

    fn accent_color(&self) -> ChromeResult<RgbColor> {
        pollster::block_on(portal_accent_color())
    }

    fn environment_changed(&self, change: EnvironmentChange) {
        if matches!(change, EnvironmentChange::Theme | EnvironmentChange::Dpi { .. }) {
            self.system_dpi.invalidate();
        }
    }
}

/// Read the accent color from the XDG desktop portal.
async fn portal_accent_color() -> ChromeResult<RgbColor> {
    use ashpd::desktop::settings::Settings;

    let settings = Settings::new()
        .await
        .map_err(|_| ChromeError::CapabilityAbsent(Capability::AccentColor))?;

    // accent-color is (ddd), each component in [0, 1]
    let value: (f64, f64, f64) = settings
        .read("org.freedesktop.appearance", "accent-color")
        .await
        .map_err(|e| x11_error("Settings.Read", e))?;

    Ok(RgbColor::new(
        (value.0 * 255.0) as u8,
        (value.1 * 255.0) as u8,
        (value.2 * 255.0) as u8,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xft_dpi() {
        let resources = "Xcursor.size:\t24\nXft.antialias:\t1\nXft.dpi:\t144\nXft.hinting:\t1\n";
        assert_eq!(parse_xft_dpi(resources), Some(144));
        assert_eq!(parse_xft_dpi("Xft.dpi: 120.4"), Some(120));
        assert_eq!(parse_xft_dpi("Xcursor.size:\t24"), None);
        assert_eq!(parse_xft_dpi("Xft.dpi:\tlarge"), None);
    }

    #[test]
    fn test_dpi_cache_queries_once_until_invalidated() {
        let cache = DpiCache::default();
        let queries = std::cell::Cell::new(0);
        let query = |dpi: Option<u32>| -> ChromeResult<Option<u32>> {
            queries.set(queries.get() + 1);
            Ok(dpi)
        };

        assert_eq!(cache.get_or_query(|| query(Some(144))), Ok(Some(144)));
        assert_eq!(cache.get_or_query(|| query(Some(96))), Ok(Some(144)));
        assert_eq!(queries.get(), 1);

        // A missing Xft.dpi is cached too
        cache.invalidate();
        assert_eq!(cache.get_or_query(|| query(None)), Ok(None));
        assert_eq!(cache.get_or_query(|| query(Some(96))), Ok(None));
        assert_eq!(queries.get(), 2);
    }

    #[test]
    fn test_dpi_cache_does_not_keep_errors() {
        let cache = DpiCache::default();
        let failed = cache.get_or_query(|| Err(ChromeError::platform("connect", "refused")));
        assert!(failed.is_err());
        assert_eq!(cache.get_or_query(|| Ok(Some(120))), Ok(Some(120)));
    }

    #[test]
    fn test_moveresize_directions() {
        assert_eq!(moveresize_direction(ResizeEdge::TopLeft), 0);
        assert_eq!(moveresize_direction(ResizeEdge::Left), 7);
        assert_ne!(moveresize_direction(ResizeEdge::Bottom), MOVERESIZE_MOVE);
    }

    #[test]
    fn test_motif_hints_toggle_decorations() {
        assert_eq!(motif_hints(false), [2, 0, 0, 0, 0]);
        assert_eq!(motif_hints(true)[2], 1);
    }

    #[test]
    fn test_large_handles_are_rejected() {
        let handle = WindowHandle::from_raw(u64::from(u32::MAX) + 1);
        assert_eq!(
            X11Backend::x11_window(handle),
            Err(ChromeError::InvalidHandle(u64::from(u32::MAX) + 1))
        );
    }
}
