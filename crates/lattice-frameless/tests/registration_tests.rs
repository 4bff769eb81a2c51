//! Registration, lifecycle and invalid-handle behavior.

use std::sync::Arc;

use lattice_frameless::backend::BackendCall;
use lattice_frameless::event::{NonClientPaint, NoDefaultProcessing};
use lattice_frameless::{
    Axis, ChromeEngine, ChromeMessage, ColorScheme, Disposition, EngineOptions, HeadlessBackend,
    Point, Rect, ResizeEdge, Scaling, Size, WindowChromeConfig, WindowHandle, WindowState,
};

const WINDOW: WindowHandle = WindowHandle::from_raw(0x1000);
const STRANGER: WindowHandle = WindowHandle::from_raw(0xdead);

fn setup() -> (Arc<HeadlessBackend>, ChromeEngine) {
    let backend = Arc::new(HeadlessBackend::new());
    let engine = ChromeEngine::new(backend.clone(), EngineOptions::default())
        .with_color_scheme_source(|| ColorScheme::Dark);
    (backend, engine)
}

#[test]
fn test_registration_is_idempotent() {
    let (backend, engine) = setup();
    let first = WindowChromeConfig::new().with_title_bar_height(30);
    let second = WindowChromeConfig::new()
        .with_title_bar_height(44)
        .with_fixed_size(true);

    engine.register_window(WINDOW, first);
    engine.register_window(WINDOW, second.clone());

    assert_eq!(engine.registry().len(), 1);
    assert_eq!(engine.config(WINDOW), Some(second));
    assert_eq!(
        backend.count_calls(|call| matches!(call, BackendCall::Attach(_))),
        1
    );
}

#[test]
fn test_unregister_detaches_and_forgets() {
    let (backend, engine) = setup();
    engine.register_window(WINDOW, WindowChromeConfig::new());
    engine.unregister_window(WINDOW);
    engine.unregister_window(WINDOW);

    assert!(!engine.is_registered(WINDOW));
    assert!(engine.registry().is_empty());
    assert_eq!(
        backend.count_calls(|call| matches!(call, BackendCall::Detach(_))),
        1
    );
}

#[test]
fn test_normalization_runs_on_first_message_only() {
    let (backend, engine) = setup();
    engine.register_window(WINDOW, WindowChromeConfig::new());
    assert_eq!(
        backend.count_calls(|call| matches!(call, BackendCall::NormalizeStyle(..))),
        0
    );

    let paint = ChromeMessage::NonClientPaint(NonClientPaint::Frame);
    engine.dispatch(WINDOW, paint, &mut NoDefaultProcessing);
    engine.dispatch(WINDOW, paint, &mut NoDefaultProcessing);
    engine.register_window(WINDOW, WindowChromeConfig::new().with_title_bar_height(40));
    engine.dispatch(WINDOW, paint, &mut NoDefaultProcessing);

    assert_eq!(
        backend.count_calls(|call| matches!(call, BackendCall::NormalizeStyle(..))),
        1
    );
}

#[test]
fn test_destroyed_window_is_unregistered() {
    let (backend, engine) = setup();
    engine.register_window(WINDOW, WindowChromeConfig::new());
    let disposition = engine.dispatch(WINDOW, ChromeMessage::Destroyed, &mut NoDefaultProcessing);

    assert_eq!(disposition, Disposition::PassThrough);
    assert!(!engine.is_registered(WINDOW));
    assert!(backend.calls().contains(&BackendCall::Detach(WINDOW)));
}

#[test]
fn test_setters_change_live_config() {
    let (_, engine) = setup();
    engine.register_window(WINDOW, WindowChromeConfig::new());

    let menu_bar = Rect::new(8, 4, 120, 24);
    engine.set_ignored_region(WINDOW, menu_bar, true);
    engine.set_draggable_region(WINDOW, Rect::new(200, 0, 400, 32), true);
    engine.set_fixed_size(WINDOW, true);
    engine.set_resize_border_thickness(WINDOW, 6);
    engine.set_title_bar_height(WINDOW, 36);

    let config = engine.config(WINDOW).expect("registered");
    assert_eq!(config.ignored_regions(), &[menu_bar]);
    assert_eq!(config.draggable_regions().len(), 1);
    assert!(config.is_fixed_size());
    assert_eq!(config.resize_border_thickness(), Some(6));
    assert_eq!(config.title_bar_height(), Some(36));

    engine.set_ignored_region(WINDOW, menu_bar, false);
    assert!(engine.config(WINDOW).expect("registered").ignored_regions().is_empty());
}

#[test]
fn test_unknown_handles_are_tolerated() {
    let (backend, engine) = setup();

    // Registration API
    engine.unregister_window(STRANGER);
    engine.set_ignored_region(STRANGER, Rect::new(0, 0, 10, 10), true);
    engine.set_draggable_region(STRANGER, Rect::new(0, 0, 10, 10), true);
    engine.set_fixed_size(STRANGER, true);
    engine.set_resize_border_thickness(STRANGER, 4);
    engine.set_title_bar_height(STRANGER, 20);

    // Query API
    assert!(engine.is_normal(STRANGER));
    assert!(!engine.is_zoomed(STRANGER));
    assert!(!engine.should_draw_frame_border(STRANGER));
    assert_eq!(engine.window_state(STRANGER), WindowState::Normal);
    assert_eq!(engine.compute_client_insets(STRANGER), None);
    assert_eq!(engine.refresh_pass_count(STRANGER), 0);
    assert!(engine.resize_border_thickness(STRANGER, Axis::Horizontal, Scaling::Unscaled) >= 0);
    let _ = engine.current_border_color(STRANGER, true);

    // Actions
    assert!(!engine.start_system_move(STRANGER, Point::new(1, 1)));
    assert!(!engine.start_system_resize(STRANGER, ResizeEdge::Left, Point::new(1, 1)));
    assert!(!engine.toggle_maximized(STRANGER));
    assert!(!engine.show_system_menu(STRANGER, Point::new(1, 1)));

    // Messages
    let message = ChromeMessage::SizeChanged {
        state: WindowState::Maximized,
        size: Size::new(100, 100),
    };
    assert_eq!(
        engine.dispatch(STRANGER, message, &mut NoDefaultProcessing),
        Disposition::PassThrough
    );

    assert!(engine.registry().is_empty());
    assert!(backend.calls().is_empty());
}

#[test]
fn test_fixed_size_refuses_resize_action() {
    let (backend, engine) = setup();
    engine.register_window(WINDOW, WindowChromeConfig::new().with_fixed_size(true));

    assert!(!engine.start_system_resize(WINDOW, ResizeEdge::Right, Point::new(799, 300)));
    assert!(engine.start_system_move(WINDOW, Point::new(400, 10)));
    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::Attach(WINDOW),
            BackendCall::StartMove(WINDOW, Point::new(400, 10)),
        ]
    );
}

#[test]
#[cfg_attr(debug_assertions, should_panic)]
fn test_null_handle_is_rejected() {
    let (_, engine) = setup();
    engine.register_window(WindowHandle::from_raw(0), WindowChromeConfig::new());
    assert!(engine.registry().is_empty());
}

#[test]
fn test_unregister_all() {
    let (backend, engine) = setup();
    for raw in 1..=3 {
        engine.register_window(WindowHandle::from_raw(raw), WindowChromeConfig::new());
    }
    engine.unregister_all();

    assert!(engine.registry().is_empty());
    assert_eq!(
        backend.count_calls(|call| matches!(call, BackendCall::Detach(_))),
        3
    );
}
