//! Win32 backend.
//!
//! Each registered window is subclassed with `SetWindowSubclass`. The
//! subclass procedure decodes the non-client messages the engine cares
//! about into [`ChromeMessage`] values, dispatches them through the
//! process-wide engine (see [`crate::initialize`]) and encodes the reply
//! back into an `LRESULT`. Everything else goes straight to
//! `DefSubclassProc`.
//!
//! DPI entry points that only exist on newer systems (`GetDpiForWindow`,
//! `GetDpiForSystem`, `GetSystemMetricsForDpi`, `GetDpiForMonitor`) are
//! looked up once with `GetProcAddress`; a missing symbol surfaces as
//! [`ChromeError::CapabilityAbsent`].
//!
//! Features tied to an OS release (the per-edge auto-hide taskbar query, a
//! DWM-drawn window border) are gated on the version `RtlGetVersion` reports.

use std::ffi::c_void;
use std::mem;
use std::sync::OnceLock;

use windows::Win32::Foundation::{BOOL, HMODULE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Dwm::DwmExtendFrameIntoClientArea;
use windows::Win32::Graphics::Gdi::{
    ClientToScreen, GetMonitorInfoW, HMONITOR, MONITOR_DEFAULTTONEAREST, MONITORINFO,
    MonitorFromWindow, ScreenToClient,
};
use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress, LoadLibraryW};
use windows::Win32::System::SystemInformation::OSVERSIONINFOW;
use windows::Win32::UI::Controls::MARGINS;
use windows::Win32::UI::Input::KeyboardAndMouse::ReleaseCapture;
use windows::Win32::UI::Shell::{
    ABE_BOTTOM, ABE_LEFT, ABE_RIGHT, ABE_TOP, ABM_GETAUTOHIDEBAREX, ABM_GETSTATE, ABS_AUTOHIDE,
    APPBARDATA, DefSubclassProc, RemoveWindowSubclass, SHAppBarMessage, SetWindowSubclass,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnableMenuItem, FindWindowW, GWL_STYLE, GetClientRect, GetSystemMenu, GetSystemMetrics,
    GetWindowLongW, GetWindowRect, IsIconic, IsZoomed, MENU_ITEM_FLAGS, MF_BYCOMMAND, MF_ENABLED,
    MF_GRAYED, NCCALCSIZE_PARAMS, PostMessageW, SC_CLOSE, SC_MAXIMIZE, SC_MINIMIZE, SC_MOVE,
    SC_RESTORE, SC_SIZE, SM_CXPADDEDBORDER, SM_CXSIZEFRAME, SM_CYCAPTION, SM_CYSIZEFRAME,
    SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOOWNERZORDER, SWP_NOSIZE, SWP_NOZORDER,
    SYSTEM_METRICS_INDEX, SetMenuDefaultItem, SetWindowLongW, SetWindowPos, TPM_RETURNCMD,
    TPM_RIGHTBUTTON, TrackPopupMenu, WINDOW_STYLE, WM_ACTIVATE, WM_DPICHANGED,
    WM_DWMCOLORIZATIONCOLORCHANGED, WM_NCACTIVATE, WM_NCCALCSIZE, WM_NCDESTROY, WM_NCHITTEST,
    WM_NCPAINT, WM_NCRBUTTONUP, WM_SETTINGCHANGE, WM_SIZE, WM_SYSCOMMAND, WM_THEMECHANGED,
    WS_CLIPCHILDREN, WS_CLIPSIBLINGS, WS_MAXIMIZEBOX, WS_OVERLAPPEDWINDOW,
    WS_THICKFRAME, WS_VISIBLE,
};
use windows::core::{PCWSTR, s, w};

use lattice_frameless_core::logging::targets;
use lattice_frameless_core::{Capability, ChromeError, ChromeResult, Point, Rect, Size};

use super::{PlatformChromeBackend, StyleRequest, SystemMetric, TaskbarEdge, TaskbarEdges, TaskbarPlacement};
use crate::client_area::RedrawHint;
use crate::event::{
    ChromeMessage, DefaultProcessing, Disposition, EnvironmentChange, MessageReply, NonClientPaint,
    PointerAction, PointerButton,
};
use crate::handle::WindowHandle;
use crate::metrics::REFERENCE_DPI;
use crate::region::{ChromeRegion, ResizeEdge};
use crate::state::WindowState;
use crate::theme::RgbColor;

/// Subclass id; one subclass per window.
const SUBCLASS_ID: usize = 0x4C46_4348;

// Undocumented themed non-client drawing messages
const WM_NCUAHDRAWCAPTION: u32 = 0x00AE;
const WM_NCUAHDRAWFRAME: u32 = 0x00AF;

const WVR_REDRAW: isize = 0x0300;
const WA_INACTIVE: usize = 0;
const SIZE_MINIMIZED: usize = 1;
const SIZE_MAXIMIZED: usize = 2;
const MDT_EFFECTIVE_DPI: i32 = 0;

// WM_NCHITTEST results
const HTTRANSPARENT: isize = -1;
const HTCLIENT: isize = 1;
const HTCAPTION: isize = 2;
const HTLEFT: isize = 10;
const HTRIGHT: isize = 11;
const HTTOP: isize = 12;
const HTTOPLEFT: isize = 13;
const HTTOPRIGHT: isize = 14;
const HTBOTTOM: isize = 15;
const HTBOTTOMLEFT: isize = 16;
const HTBOTTOMRIGHT: isize = 17;

// ============================================================================
// Optional DPI entry points
// ============================================================================

type GetDpiForWindowFn = unsafe extern "system" fn(HWND) -> u32;
type GetDpiForSystemFn = unsafe extern "system" fn() -> u32;
type GetSystemMetricsForDpiFn = unsafe extern "system" fn(i32, u32) -> i32;
type GetDpiForMonitorFn =
    unsafe extern "system" fn(HMONITOR, i32, *mut u32, *mut u32) -> windows::core::HRESULT;

struct DpiApi {
    dpi_for_window: Option<GetDpiForWindowFn>,
    dpi_for_system: Option<GetDpiForSystemFn>,
    system_metrics_for_dpi: Option<GetSystemMetricsForDpiFn>,
    dpi_for_monitor: Option<GetDpiForMonitorFn>,
}

impl DpiApi {
    fn load() -> Self {
        // SAFETY: module handles come from the loader and the looked-up
        // symbols are transmuted to their documented signatures.
        unsafe {
            let user32 = GetModuleHandleW(w!("user32.dll")).ok();
            let shcore = LoadLibraryW(w!("shcore.dll")).ok();

            let lookup = |module: Option<HMODULE>, name: windows::core::PCSTR| {
                module.and_then(|module| GetProcAddress(module, name))
            };

            let api = Self {
                dpi_for_window: lookup(user32, s!("GetDpiForWindow"))
                    .map(|f| mem::transmute::<_, GetDpiForWindowFn>(f)),
                dpi_for_system: lookup(user32, s!("GetDpiForSystem"))
                    .map(|f| mem::transmute::<_, GetDpiForSystemFn>(f)),
                system_metrics_for_dpi: lookup(user32, s!("GetSystemMetricsForDpi"))
                    .map(|f| mem::transmute::<_, GetSystemMetricsForDpiFn>(f)),
                dpi_for_monitor: lookup(shcore, s!("GetDpiForMonitor"))
                    .map(|f| mem::transmute::<_, GetDpiForMonitorFn>(f)),
            };
            tracing::debug!(
                target: targets::BACKEND,
                window = api.dpi_for_window.is_some(),
                system = api.dpi_for_system.is_some(),
                metrics_for_dpi = api.system_metrics_for_dpi.is_some(),
                monitor = api.dpi_for_monitor.is_some(),
                "looked up DPI entry points"
            );
            api
        }
    }
}

fn dpi_api() -> &'static DpiApi {
    static API: OnceLock<DpiApi> = OnceLock::new();
    API.get_or_init(DpiApi::load)
}

// ============================================================================
// OS version
// ============================================================================

type RtlGetVersionFn = unsafe extern "system" fn(*mut OSVERSIONINFOW) -> i32;

/// Windows version as reported by `RtlGetVersion`, which ignores the
/// compatibility shims that make `GetVersionEx` lie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OsVersion {
    major: u32,
    minor: u32,
    build: u32,
}

impl OsVersion {
    /// First release with `ABM_GETAUTOHIDEBAREX`.
    const WINDOWS_8_1: Self = Self::new(6, 3, 0);
    /// First release where DWM draws a border around undecorated windows.
    const WINDOWS_11: Self = Self::new(10, 0, 22000);

    const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self { major, minor, build }
    }

    fn query() -> Option<Self> {
        // SAFETY: ntdll is always mapped; the symbol is transmuted to its
        // documented signature and `info` is a correctly sized out param.
        unsafe {
            let ntdll = GetModuleHandleW(w!("ntdll.dll")).ok()?;
            let f = mem::transmute::<_, RtlGetVersionFn>(GetProcAddress(ntdll, s!("RtlGetVersion"))?);
            let mut info = OSVERSIONINFOW {
                dwOSVersionInfoSize: mem::size_of::<OSVERSIONINFOW>() as u32,
                ..Default::default()
            };
            if f(&mut info) != 0 {
                return None;
            }
            Some(Self::new(info.dwMajorVersion, info.dwMinorVersion, info.dwBuildNumber))
        }
    }

    fn has_auto_hide_edge_query(self) -> bool {
        self >= Self::WINDOWS_8_1
    }

    fn dwm_draws_border(self) -> bool {
        self >= Self::WINDOWS_11
    }
}

fn os_version() -> Option<OsVersion> {
    static VERSION: OnceLock<Option<OsVersion>> = OnceLock::new();
    *VERSION.get_or_init(|| {
        let version = OsVersion::query();
        tracing::debug!(target: targets::BACKEND, ?version, "queried OS version");
        version
    })
}

// ============================================================================
// Conversions
// ============================================================================

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.as_raw() as usize as *mut c_void)
}

fn handle(hwnd: HWND) -> WindowHandle {
    WindowHandle::from_raw(hwnd.0 as usize as u64)
}

fn from_win_rect(rect: RECT) -> Rect {
    Rect::from_ltrb(rect.left, rect.top, rect.right, rect.bottom)
}

fn to_win_rect(rect: Rect) -> RECT {
    RECT {
        left: rect.left(),
        top: rect.top(),
        right: rect.right(),
        bottom: rect.bottom(),
    }
}

fn loword(value: usize) -> u32 {
    (value & 0xFFFF) as u32
}

fn hiword(value: usize) -> u32 {
    ((value >> 16) & 0xFFFF) as u32
}

/// Signed x coordinate packed into an `LPARAM`.
fn get_x_lparam(lparam: LPARAM) -> i32 {
    (lparam.0 & 0xFFFF) as u16 as i16 as i32
}

/// Signed y coordinate packed into an `LPARAM`.
fn get_y_lparam(lparam: LPARAM) -> i32 {
    ((lparam.0 >> 16) & 0xFFFF) as u16 as i16 as i32
}

fn hit_test_code(region: ChromeRegion) -> isize {
    match region {
        ChromeRegion::Client => HTCLIENT,
        ChromeRegion::Caption => HTCAPTION,
        ChromeRegion::Transparent => HTTRANSPARENT,
        ChromeRegion::Resize(edge) => match edge {
            ResizeEdge::Top => HTTOP,
            ResizeEdge::Bottom => HTBOTTOM,
            ResizeEdge::Left => HTLEFT,
            ResizeEdge::Right => HTRIGHT,
            ResizeEdge::TopLeft => HTTOPLEFT,
            ResizeEdge::TopRight => HTTOPRIGHT,
            ResizeEdge::BottomLeft => HTBOTTOMLEFT,
            ResizeEdge::BottomRight => HTBOTTOMRIGHT,
        },
        // Application-drawn buttons receive their own clicks
        ChromeRegion::SystemButton(_) => HTCLIENT,
    }
}

/// `WMSZ_*` value for `SC_SIZE`.
fn sizing_edge(edge: ResizeEdge) -> usize {
    match edge {
        ResizeEdge::Left => 1,
        ResizeEdge::Right => 2,
        ResizeEdge::Top => 3,
        ResizeEdge::TopLeft => 4,
        ResizeEdge::TopRight => 5,
        ResizeEdge::Bottom => 6,
        ResizeEdge::BottomLeft => 7,
        ResizeEdge::BottomRight => 8,
    }
}

fn last_error(api: &'static str) -> ChromeError {
    ChromeError::platform(api, windows::core::Error::from_win32().to_string())
}

// ============================================================================
// Window queries
// ============================================================================

fn monitor_info(hwnd: HWND) -> ChromeResult<MONITORINFO> {
    // SAFETY: `info` is a correctly sized MONITORINFO.
    unsafe {
        let monitor = MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST);
        let mut info = MONITORINFO {
            cbSize: mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if GetMonitorInfoW(monitor, &mut info).as_bool() {
            Ok(info)
        } else {
            Err(ChromeError::platform("GetMonitorInfoW", "no monitor for window"))
        }
    }
}

fn window_rect(hwnd: HWND) -> ChromeResult<Rect> {
    let mut rect = RECT::default();
    // SAFETY: `rect` outlives the call.
    unsafe { GetWindowRect(hwnd, &mut rect) }
        .map_err(|e| ChromeError::platform("GetWindowRect", e.to_string()))?;
    Ok(from_win_rect(rect))
}

fn client_size(hwnd: HWND) -> Size {
    let mut rect = RECT::default();
    // SAFETY: `rect` outlives the call.
    match unsafe { GetClientRect(hwnd, &mut rect) } {
        Ok(()) => Size::new(rect.right - rect.left, rect.bottom - rect.top),
        Err(_) => Size::ZERO,
    }
}

fn style(hwnd: HWND) -> WINDOW_STYLE {
    // SAFETY: reading a window long has no preconditions beyond a window handle.
    WINDOW_STYLE(unsafe { GetWindowLongW(hwnd, GWL_STYLE) } as u32)
}

/// The window's state as the OS sees it right now.
fn live_state(hwnd: HWND) -> WindowState {
    // SAFETY: state queries on a window handle.
    unsafe {
        if IsIconic(hwnd).as_bool() {
            return WindowState::Minimized;
        }
        if IsZoomed(hwnd).as_bool() {
            return WindowState::Maximized;
        }
    }
    // Borderless fullscreen: no sizing frame and the window covers its monitor
    if !style(hwnd).contains(WS_THICKFRAME) {
        if let (Ok(rect), Ok(info)) = (window_rect(hwnd), monitor_info(hwnd)) {
            if rect == from_win_rect(info.rcMonitor) {
                return WindowState::FullScreen;
            }
        }
    }
    WindowState::Normal
}

fn screen_to_client(hwnd: HWND, x: i32, y: i32) -> Point {
    let mut point = POINT { x, y };
    // SAFETY: `point` outlives the call.
    unsafe {
        let _ = ScreenToClient(hwnd, &mut point);
    }
    Point::new(point.x, point.y)
}

fn client_to_screen(hwnd: HWND, pos: Point) -> POINT {
    let mut point = POINT { x: pos.x, y: pos.y };
    // SAFETY: `point` outlives the call.
    unsafe {
        let _ = ClientToScreen(hwnd, &mut point);
    }
    point
}

// ============================================================================
// Subclass procedure
// ============================================================================

/// Runs the OS's own `WM_NCCALCSIZE` handling on the live parameters.
struct NativeCalcSize {
    hwnd: HWND,
    wparam: WPARAM,
    lparam: LPARAM,
}

impl NativeCalcSize {
    /// The rectangle slot the OS reads the client area back from.
    fn client_slot(&self) -> *mut RECT {
        if self.wparam.0 != 0 {
            let params = self.lparam.0 as *mut NCCALCSIZE_PARAMS;
            // SAFETY: with wparam TRUE, lparam points at NCCALCSIZE_PARAMS.
            unsafe { &mut (*params).rgrc[0] }
        } else {
            self.lparam.0 as *mut RECT
        }
    }

    fn proposed(&self) -> Rect {
        // SAFETY: the slot is valid for the duration of the message.
        from_win_rect(unsafe { *self.client_slot() })
    }

    fn write(&self, rect: Rect) {
        // SAFETY: the slot is valid for the duration of the message.
        unsafe { *self.client_slot() = to_win_rect(rect) };
    }
}

impl DefaultProcessing for NativeCalcSize {
    fn native_client_area(&mut self, proposed: Rect) -> Option<Rect> {
        self.write(proposed);
        // SAFETY: forwarding the message we are currently handling.
        unsafe { DefSubclassProc(self.hwnd, WM_NCCALCSIZE, self.wparam, self.lparam) };
        Some(self.proposed())
    }
}

unsafe extern "system" fn chrome_subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    _id: usize,
    _ref_data: usize,
) -> LRESULT {
    let Some(engine) = crate::chrome::instance() else {
        return unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) };
    };
    let window = handle(hwnd);
    let dispatch = |message: ChromeMessage, default: &mut dyn DefaultProcessing| {
        engine.dispatch(window, message, default)
    };
    let mut no_default = crate::event::NoDefaultProcessing;

    match msg {
        WM_NCCALCSIZE => {
            let mut native = NativeCalcSize { hwnd, wparam, lparam };
            let message = ChromeMessage::CalcClientArea {
                proposed: native.proposed(),
                state: Some(live_state(hwnd)),
            };
            match dispatch(message, &mut native) {
                Disposition::Handled(MessageReply::ClientArea { rect, redraw }) => {
                    native.write(rect);
                    match (wparam.0 != 0, redraw) {
                        (true, RedrawHint::RedrawAll) => LRESULT(WVR_REDRAW),
                        _ => LRESULT(0),
                    }
                }
                _ => unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) },
            }
        }
        WM_NCHITTEST => {
            let pos = screen_to_client(hwnd, get_x_lparam(lparam), get_y_lparam(lparam));
            let message = ChromeMessage::HitTest {
                pos,
                window_size: client_size(hwnd),
            };
            match dispatch(message, &mut no_default) {
                Disposition::Handled(MessageReply::HitTest(region)) => LRESULT(hit_test_code(region)),
                _ => unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) },
            }
        }
        WM_NCPAINT | WM_NCUAHDRAWCAPTION | WM_NCUAHDRAWFRAME => {
            let kind = match msg {
                WM_NCPAINT => NonClientPaint::Frame,
                WM_NCUAHDRAWCAPTION => NonClientPaint::ThemedCaption,
                _ => NonClientPaint::ThemedFrame,
            };
            match dispatch(ChromeMessage::NonClientPaint(kind), &mut no_default) {
                Disposition::Handled(_) => LRESULT(0),
                Disposition::PassThrough => unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) },
            }
        }
        WM_NCACTIVATE => {
            let active = wparam.0 != 0;
            let paint = ChromeMessage::NonClientPaint(NonClientPaint::Activate { active });
            match dispatch(paint, &mut no_default) {
                // lparam -1 keeps the default handler from repainting the frame
                Disposition::Handled(_) => unsafe { DefSubclassProc(hwnd, msg, wparam, LPARAM(-1)) },
                Disposition::PassThrough => unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) },
            }
        }
        WM_ACTIVATE => {
            let active = loword(wparam.0) as usize != WA_INACTIVE;
            dispatch(ChromeMessage::Activate { active }, &mut no_default);
            unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) }
        }
        WM_SIZE => {
            let state = match wparam.0 {
                SIZE_MINIMIZED => WindowState::Minimized,
                SIZE_MAXIMIZED => WindowState::Maximized,
                _ => live_state(hwnd),
            };
            let size = Size::new(loword(lparam.0 as usize) as i32, hiword(lparam.0 as usize) as i32);
            dispatch(ChromeMessage::SizeChanged { state, size }, &mut no_default);
            unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) }
        }
        WM_DPICHANGED => {
            let change = EnvironmentChange::Dpi {
                dpi: hiword(wparam.0),
            };
            dispatch(ChromeMessage::EnvironmentChanged(change), &mut no_default);
            unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) }
        }
        WM_SETTINGCHANGE => {
            if is_immersive_color_set(lparam) {
                dispatch(ChromeMessage::EnvironmentChanged(EnvironmentChange::Theme), &mut no_default);
            }
            unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) }
        }
        WM_THEMECHANGED => {
            dispatch(ChromeMessage::EnvironmentChanged(EnvironmentChange::Theme), &mut no_default);
            unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) }
        }
        WM_DWMCOLORIZATIONCOLORCHANGED => {
            dispatch(
                ChromeMessage::EnvironmentChanged(EnvironmentChange::Colorization),
                &mut no_default,
            );
            unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) }
        }
        WM_NCRBUTTONUP if wparam.0 as isize == HTCAPTION => {
            let pos = screen_to_client(hwnd, get_x_lparam(lparam), get_y_lparam(lparam));
            let message = ChromeMessage::Pointer {
                pos,
                window_size: client_size(hwnd),
                button: PointerButton::Right,
                action: PointerAction::Release,
            };
            match dispatch(message, &mut no_default) {
                Disposition::Handled(reply) => {
                    engine.perform(window, reply);
                    LRESULT(0)
                }
                Disposition::PassThrough => unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) },
            }
        }
        WM_NCDESTROY => {
            // Unregistering detaches the subclass
            dispatch(ChromeMessage::Destroyed, &mut no_default);
            unsafe {
                let _ = RemoveWindowSubclass(hwnd, Some(chrome_subclass_proc), SUBCLASS_ID);
                DefSubclassProc(hwnd, msg, wparam, lparam)
            }
        }
        _ => unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) },
    }
}

fn is_immersive_color_set(lparam: LPARAM) -> bool {
    if lparam.0 == 0 {
        return false;
    }
    // SAFETY: WM_SETTINGCHANGE carries a NUL-terminated wide string or null.
    unsafe { PCWSTR(lparam.0 as *const u16).to_string() }
        .map(|area| area == "ImmersiveColorSet")
        .unwrap_or(false)
}

// ============================================================================
// Backend
// ============================================================================

/// [`PlatformChromeBackend`] for Windows.
///
/// Native messages are intercepted by a window subclass, so toolkit events
/// must not be routed through the engine as well.
#[derive(Debug, Default)]
pub struct WindowsBackend {
    _private: (),
}

impl WindowsBackend {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn post_syscommand(&self, window: WindowHandle, command: usize) -> ChromeResult<()> {
        // SAFETY: posting a message to a window handle.
        unsafe { PostMessageW(hwnd(window), WM_SYSCOMMAND, WPARAM(command), LPARAM(0)) }
            .map_err(|e| ChromeError::platform("PostMessageW", e.to_string()))
    }

    fn metric_index(metric: SystemMetric) -> &'static [SYSTEM_METRICS_INDEX] {
        match metric {
            SystemMetric::ResizeBorderHorizontal => &[SM_CXSIZEFRAME, SM_CXPADDEDBORDER],
            SystemMetric::ResizeBorderVertical => &[SM_CYSIZEFRAME, SM_CXPADDEDBORDER],
            SystemMetric::CaptionHeight => &[SM_CYCAPTION],
            SystemMetric::FrameBorder => &[],
        }
    }
}

impl PlatformChromeBackend for WindowsBackend {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn intercepts_native_messages(&self) -> bool {
        true
    }

    fn attach(&self, window: WindowHandle) -> ChromeResult<()> {
        // SAFETY: the subclass procedure matches SUBCLASSPROC.
        let ok = unsafe { SetWindowSubclass(hwnd(window), Some(chrome_subclass_proc), SUBCLASS_ID, 0) };
        if ok.as_bool() {
            tracing::debug!(target: targets::BACKEND, %window, "window subclassed");
            Ok(())
        } else {
            Err(ChromeError::InvalidHandle(window.as_raw()))
        }
    }

    fn detach(&self, window: WindowHandle) -> ChromeResult<()> {
        // SAFETY: removing a subclass that may or may not be installed.
        let removed = unsafe { RemoveWindowSubclass(hwnd(window), Some(chrome_subclass_proc), SUBCLASS_ID) };
        if !removed.as_bool() {
            // Already removed during WM_NCDESTROY
            tracing::trace!(target: targets::BACKEND, %window, "no subclass to remove");
        }
        Ok(())
    }

    fn window_dpi(&self, window: WindowHandle) -> ChromeResult<u32> {
        let f = dpi_api()
            .dpi_for_window
            .ok_or(ChromeError::CapabilityAbsent(Capability::WindowDpi))?;
        // SAFETY: symbol resolved from user32 with this signature.
        match unsafe { f(hwnd(window)) } {
            0 => Err(ChromeError::InvalidHandle(window.as_raw())),
            dpi => Ok(dpi),
        }
    }

    fn monitor_dpi(&self, window: WindowHandle) -> ChromeResult<u32> {
        let f = dpi_api()
            .dpi_for_monitor
            .ok_or(ChromeError::CapabilityAbsent(Capability::MonitorDpi))?;
        let (mut dpi_x, mut dpi_y) = (0u32, 0u32);
        // SAFETY: symbol resolved from shcore with this signature; out params outlive the call.
        unsafe {
            let monitor = MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONEAREST);
            f(monitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y)
                .ok()
                .map_err(|e| ChromeError::platform("GetDpiForMonitor", e.to_string()))?;
        }
        Ok(dpi_y)
    }

    fn system_dpi(&self) -> ChromeResult<u32> {
        let f = dpi_api()
            .dpi_for_system
            .ok_or(ChromeError::CapabilityAbsent(Capability::SystemDpi))?;
        // SAFETY: symbol resolved from user32 with this signature.
        Ok(unsafe { f() })
    }

    fn platform_default_metric(&self, metric: SystemMetric) -> Option<i32> {
        match metric {
            SystemMetric::FrameBorder => Some(1),
            _ => None,
        }
    }

    fn query_system_metric(&self, metric: SystemMetric, dpi: u32) -> ChromeResult<i32> {
        let indices = Self::metric_index(metric);
        let api = dpi_api();
        let sum = match api.system_metrics_for_dpi {
            // SAFETY: symbol resolved from user32 with this signature.
            Some(f) => indices.iter().map(|index| unsafe { f(index.0, dpi) }).sum::<i32>(),
            None => {
                // Plain GetSystemMetrics answers at the system DPI
                let system_dpi = self.system_dpi().unwrap_or(REFERENCE_DPI);
                let px: i32 = indices.iter().map(|index| unsafe { GetSystemMetrics(*index) }).sum();
                crate::metrics::scale(px, dpi, system_dpi)
            }
        };
        Ok(sum)
    }

    fn auto_hide_taskbar_edges(&self, window: WindowHandle) -> ChromeResult<TaskbarEdges> {
        if !os_version().is_some_and(OsVersion::has_auto_hide_edge_query) {
            return Err(ChromeError::CapabilityAbsent(Capability::AutoHideTaskbarEdges));
        }
        let monitor = monitor_info(hwnd(window))?.rcMonitor;
        let edges = [
            (ABE_TOP, TaskbarEdge::Top),
            (ABE_BOTTOM, TaskbarEdge::Bottom),
            (ABE_LEFT, TaskbarEdge::Left),
            (ABE_RIGHT, TaskbarEdge::Right),
        ];
        let found = edges
            .into_iter()
            .filter(|(abe, _)| {
                let mut data = APPBARDATA {
                    cbSize: mem::size_of::<APPBARDATA>() as u32,
                    uEdge: *abe,
                    rc: monitor,
                    ..Default::default()
                };
                // SAFETY: `data` is a correctly sized APPBARDATA.
                unsafe { SHAppBarMessage(ABM_GETAUTOHIDEBAREX, &mut data) != 0 }
            })
            .map(|(_, edge)| edge)
            .collect();
        Ok(found)
    }

    fn taskbar_placement(&self, window: WindowHandle) -> ChromeResult<Option<TaskbarPlacement>> {
        // SAFETY: `data` is a correctly sized APPBARDATA; window handles are
        // only passed to query functions.
        unsafe {
            let mut data = APPBARDATA {
                cbSize: mem::size_of::<APPBARDATA>() as u32,
                ..Default::default()
            };
            let auto_hide = SHAppBarMessage(ABM_GETSTATE, &mut data) as u32 & ABS_AUTOHIDE != 0;

            let Ok(taskbar) = FindWindowW(w!("Shell_TrayWnd"), PCWSTR::null()) else {
                return Ok(None);
            };
            let taskbar_rect = window_rect(taskbar)?;
            let ours = MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONEAREST);
            let theirs = MonitorFromWindow(taskbar, MONITOR_DEFAULTTONEAREST);

            Ok(Some(TaskbarPlacement {
                taskbar_rect,
                monitor_rect: from_win_rect(monitor_info(hwnd(window))?.rcMonitor),
                auto_hide,
                same_monitor: ours == theirs,
            }))
        }
    }

    fn native_border_suppressed(&self, _window: WindowHandle) -> bool {
        !os_version().is_some_and(OsVersion::dwm_draws_border)
    }

    fn normalize_window_style(&self, window: WindowHandle, request: StyleRequest) -> ChromeResult<()> {
        let hwnd = hwnd(window);
        let current = style(hwnd);

        let mut base = WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN | WS_CLIPSIBLINGS;
        base |= current & WS_VISIBLE;
        if request.fixed_size {
            base &= !(WS_THICKFRAME | WS_MAXIMIZEBOX);
        }

        // SAFETY: style and frame updates on a window handle we subclassed.
        unsafe {
            SetWindowLongW(hwnd, GWL_STYLE, base.0 as i32);

            if !request.preserve_native_frame {
                let margins = MARGINS {
                    cxLeftWidth: 0,
                    cxRightWidth: 0,
                    cyTopHeight: 1,
                    cyBottomHeight: 0,
                };
                if let Err(err) = DwmExtendFrameIntoClientArea(hwnd, &margins) {
                    tracing::debug!(target: targets::BACKEND, %window, error = %err, "frame extension unavailable");
                }
            }
        }
        tracing::debug!(target: targets::BACKEND, %window, style = format_args!("{:#x}", base.0), "window style normalized");
        self.refresh_frame(window)
    }

    fn refresh_frame(&self, window: WindowHandle) -> ChromeResult<()> {
        let flags = SWP_FRAMECHANGED
            | SWP_NOMOVE
            | SWP_NOSIZE
            | SWP_NOZORDER
            | SWP_NOOWNERZORDER
            | SWP_NOACTIVATE;
        // SAFETY: re-running frame computation; nested messages re-enter the engine with no lock held.
        unsafe { SetWindowPos(hwnd(window), HWND::default(), 0, 0, 0, 0, flags) }
            .map_err(|e| ChromeError::platform("SetWindowPos", e.to_string()))
    }

    fn start_system_move(&self, window: WindowHandle, _pos: Point) -> ChromeResult<()> {
        // SAFETY: releasing our own mouse capture.
        unsafe {
            let _ = ReleaseCapture();
        }
        self.post_syscommand(window, SC_MOVE as usize | HTCAPTION as usize)
    }

    fn start_system_resize(
        &self,
        window: WindowHandle,
        edge: ResizeEdge,
        _pos: Point,
    ) -> ChromeResult<()> {
        // SAFETY: releasing our own mouse capture.
        unsafe {
            let _ = ReleaseCapture();
        }
        self.post_syscommand(window, SC_SIZE as usize + sizing_edge(edge))
    }

    fn toggle_maximized(&self, window: WindowHandle) -> ChromeResult<()> {
        // SAFETY: state query on a window handle.
        let zoomed = unsafe { IsZoomed(hwnd(window)) }.as_bool();
        let command = if zoomed { SC_RESTORE } else { SC_MAXIMIZE };
        self.post_syscommand(window, command as usize)
    }

    fn show_system_menu(&self, window: WindowHandle, pos: Point) -> ChromeResult<()> {
        let hwnd = hwnd(window);
        let state = live_state(hwnd);
        let resizable = style(hwnd).contains(WS_THICKFRAME);
        let flag = |enabled: bool| -> MENU_ITEM_FLAGS {
            MF_BYCOMMAND | if enabled { MF_ENABLED } else { MF_GRAYED }
        };

        // SAFETY: menu handle obtained from the window; the popup is modal
        // and returns the chosen command.
        unsafe {
            let menu = GetSystemMenu(hwnd, false);
            if menu.is_invalid() {
                return Err(ChromeError::CapabilityAbsent(Capability::SystemMenu));
            }
            let normal = state.is_normal();
            let _ = EnableMenuItem(menu, SC_RESTORE, flag(!normal));
            let _ = EnableMenuItem(menu, SC_MOVE, flag(normal));
            let _ = EnableMenuItem(menu, SC_SIZE, flag(normal && resizable));
            let _ = EnableMenuItem(menu, SC_MINIMIZE, flag(true));
            let _ = EnableMenuItem(menu, SC_MAXIMIZE, flag(normal && resizable));
            let _ = EnableMenuItem(menu, SC_CLOSE, flag(true));
            let _ = SetMenuDefaultItem(menu, u32::MAX, 0);

            let screen = client_to_screen(hwnd, pos);
            let command: BOOL = TrackPopupMenu(
                menu,
                TPM_RETURNCMD | TPM_RIGHTBUTTON,
                screen.x,
                screen.y,
                0,
                hwnd,
                None,
            );
            if command.0 == 0 {
                // Dismissed, or the popup failed
                return Ok(());
            }
            PostMessageW(hwnd, WM_SYSCOMMAND, WPARAM(command.0 as usize), LPARAM(0))
                .map_err(|_| last_error("PostMessageW"))
        }
    }

    fn accent_color(&self) -> ChromeResult<RgbColor> {
        use windows::UI::ViewManagement::{UIColorType, UISettings};

        let settings = UISettings::new()
            .map_err(|_| ChromeError::CapabilityAbsent(Capability::AccentColor))?;
        let color = settings
            .GetColorValue(UIColorType::Accent)
            .map_err(|e| ChromeError::platform("UISettings.GetColorValue", e.to_string()))?;
        Ok(RgbColor::new(color.R, color.G, color.B))
    }
}
