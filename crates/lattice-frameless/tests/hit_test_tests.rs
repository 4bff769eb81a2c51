//! Hit-testing through the engine, on the in-memory backend.

use std::sync::Arc;

use lattice_frameless::event::{EnvironmentChange, NoDefaultProcessing};
use lattice_frameless::{
    Axis, ChromeEngine, ChromeMessage, ChromeRegion, ColorScheme, EngineOptions, HeadlessBackend,
    Point, Rect, ResizeEdge, Scaling, Size, SystemButtonId, WindowChromeConfig, WindowHandle,
    WindowState,
};

const WINDOW: WindowHandle = WindowHandle::from_raw(0x2a0);

fn setup(config: WindowChromeConfig) -> (Arc<HeadlessBackend>, ChromeEngine) {
    let backend = Arc::new(HeadlessBackend::new());
    let engine = ChromeEngine::new(backend.clone(), EngineOptions::default())
        .with_color_scheme_source(|| ColorScheme::Light);
    engine.register_window(WINDOW, config);
    (backend, engine)
}

fn classify(engine: &ChromeEngine, size: Size, x: i32, y: i32) -> ChromeRegion {
    engine
        .hit_test(WINDOW, Point::new(x, y), size)
        .expect("window is registered")
}

fn set_state(engine: &ChromeEngine, state: WindowState, size: Size) {
    engine.dispatch(
        WINDOW,
        ChromeMessage::SizeChanged { state, size },
        &mut NoDefaultProcessing,
    );
}

#[test]
fn test_reference_scenario() {
    let size = Size::new(800, 600);
    let (_, engine) = setup(
        WindowChromeConfig::new()
            .with_resize_border_thickness(8)
            .with_title_bar_height(32),
    );

    assert_eq!(classify(&engine, size, 400, 5), ChromeRegion::Caption);
    assert_eq!(classify(&engine, size, 2, 300), ChromeRegion::Resize(ResizeEdge::Left));
    assert_eq!(
        classify(&engine, size, 798, 598),
        ChromeRegion::Resize(ResizeEdge::BottomRight)
    );
    assert_eq!(classify(&engine, size, 400, 300), ChromeRegion::Client);
}

#[test]
fn test_corner_wins_over_edges() {
    let (_, engine) = setup(WindowChromeConfig::new().with_resize_border_thickness(8));
    assert_eq!(
        classify(&engine, Size::new(200, 100), 4, 4),
        ChromeRegion::Resize(ResizeEdge::TopLeft)
    );
}

#[test]
fn test_ignored_region_has_priority() {
    let size = Size::new(800, 600);
    let ignored = Rect::new(0, 0, 200, 40);
    let (_, engine) = setup(
        WindowChromeConfig::new()
            .with_resize_border_thickness(8)
            .with_title_bar_height(32)
            .with_ignored_region(ignored),
    );

    for y in (ignored.top()..ignored.bottom()).step_by(3) {
        for x in (ignored.left()..ignored.right()).step_by(5) {
            let region = classify(&engine, size, x, y);
            assert!(
                matches!(region, ChromeRegion::Client | ChromeRegion::Transparent),
                "({x}, {y}) classified as {region:?}"
            );
        }
    }
    // Outside the ignored area the corner still resizes
    assert_eq!(
        classify(&engine, size, 797, 2),
        ChromeRegion::Resize(ResizeEdge::TopRight)
    );
}

#[test]
fn test_fixed_size_never_resizes() {
    let size = Size::new(640, 480);
    let (_, engine) = setup(
        WindowChromeConfig::new()
            .with_resize_border_thickness(8)
            .with_fixed_size(true),
    );

    for y in (0..size.height).step_by(7) {
        for x in (0..size.width).step_by(7) {
            assert!(!classify(&engine, size, x, y).is_resize(), "({x}, {y}) resizes");
        }
    }
    // Every edge pixel too
    for x in 0..size.width {
        assert!(!classify(&engine, size, x, 0).is_resize());
        assert!(!classify(&engine, size, x, size.height - 1).is_resize());
    }
}

#[test]
fn test_maximized_is_caption_or_client() {
    let size = Size::new(1920, 1040);
    let (_, engine) = setup(WindowChromeConfig::new().with_title_bar_height(32));
    set_state(&engine, WindowState::Maximized, size);

    assert_eq!(classify(&engine, size, 100, 31), ChromeRegion::Caption);
    assert_eq!(classify(&engine, size, 100, 33), ChromeRegion::Client);

    for (x, y) in [(0, 0), (1919, 0), (0, 1039), (1919, 1039), (0, 500), (960, 1039)] {
        assert!(!classify(&engine, size, x, y).is_resize(), "({x}, {y}) resizes");
    }
}

#[test]
fn test_draggable_regions_restrict_the_caption() {
    let size = Size::new(800, 600);
    let (_, engine) = setup(
        WindowChromeConfig::new()
            .with_title_bar_height(32)
            .with_draggable_region(Rect::new(300, 0, 200, 32)),
    );

    assert_eq!(classify(&engine, size, 400, 16), ChromeRegion::Caption);
    assert_eq!(classify(&engine, size, 100, 16), ChromeRegion::Client);
}

#[test]
fn test_system_buttons_are_reported() {
    let size = Size::new(800, 600);
    let (_, engine) = setup(
        WindowChromeConfig::new()
            .with_title_bar_height(32)
            .with_system_button(SystemButtonId::Close, Rect::new(754, 0, 46, 32))
            .with_system_button(SystemButtonId::Minimize, Rect::new(662, 0, 46, 32)),
    );

    assert_eq!(
        classify(&engine, size, 770, 16),
        ChromeRegion::SystemButton(SystemButtonId::Close)
    );
    assert_eq!(
        classify(&engine, size, 680, 16),
        ChromeRegion::SystemButton(SystemButtonId::Minimize)
    );
}

#[test]
fn test_mouse_transparent_window() {
    let (_, engine) = setup(WindowChromeConfig::new());
    engine.set_mouse_transparent(WINDOW, true);
    assert_eq!(
        classify(&engine, Size::new(800, 600), 2, 2),
        ChromeRegion::Transparent
    );
}

#[test]
fn test_border_scales_with_dpi() {
    let size = Size::new(1200, 900);
    let (backend, engine) = setup(WindowChromeConfig::new().with_resize_border_thickness(8));
    backend.set_window_dpi(Some(192));

    // 16 device pixels at 200%
    assert_eq!(classify(&engine, size, 14, 450), ChromeRegion::Resize(ResizeEdge::Left));
    assert_eq!(classify(&engine, size, 17, 450), ChromeRegion::Client);
}

#[test]
fn test_notified_dpi_drives_classification() {
    let size = Size::new(1600, 1200);
    let (backend, engine) = setup(WindowChromeConfig::new());
    backend.set_window_dpi(None);
    backend.set_monitor_dpi(None);
    backend.set_system_dpi(None);

    engine.dispatch(
        WINDOW,
        ChromeMessage::EnvironmentChanged(EnvironmentChange::Dpi { dpi: 192 }),
        &mut NoDefaultProcessing,
    );

    // Default 8px border, 16 device pixels at 200%
    assert_eq!(classify(&engine, size, 12, 300), ChromeRegion::Resize(ResizeEdge::Left));
    assert_eq!(classify(&engine, size, 17, 300), ChromeRegion::Client);

    // Later passes keep the notified DPI
    engine.dispatch(WINDOW, ChromeMessage::Activate { active: true }, &mut NoDefaultProcessing);
    assert_eq!(engine.runtime_state(WINDOW).map(|runtime| runtime.dpi), Some(192));
    assert_eq!(
        engine.resize_border_thickness(WINDOW, Axis::Horizontal, Scaling::Scaled),
        16
    );
    assert_eq!(classify(&engine, size, 12, 300), ChromeRegion::Resize(ResizeEdge::Left));

    // Unregistering forgets it
    engine.unregister_window(WINDOW);
    assert_eq!(engine.metrics().notified_dpi(WINDOW), None);
}

#[test]
fn test_unregistered_window_is_not_classified() {
    let (_, engine) = setup(WindowChromeConfig::new());
    let stranger = WindowHandle::from_raw(0x77);
    assert_eq!(
        engine.hit_test(stranger, Point::new(1, 1), Size::new(100, 100)),
        None
    );
}
