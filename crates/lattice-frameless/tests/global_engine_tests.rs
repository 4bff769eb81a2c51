//! The process-wide engine instance.
//!
//! Kept to a single test: the instance is shared by every test in the binary.

use std::sync::Arc;

use lattice_frameless::backend::BackendCall;
use lattice_frameless::{
    ChromeError, EngineOptions, HeadlessBackend, WindowChromeConfig, WindowHandle,
};

#[test]
fn test_global_engine_lifecycle() {
    assert!(lattice_frameless::instance().is_none());
    assert_eq!(
        lattice_frameless::try_instance().err(),
        Some(ChromeError::NotInitialized)
    );

    let backend = Arc::new(HeadlessBackend::new());
    let engine = lattice_frameless::initialize_with_backend(backend.clone(), EngineOptions::default());

    // A second initialization hands back the running engine
    let again = lattice_frameless::initialize_with_backend(
        Arc::new(HeadlessBackend::new()),
        EngineOptions::default(),
    );
    assert!(Arc::ptr_eq(&engine, &again));
    assert!(Arc::ptr_eq(
        &engine,
        &lattice_frameless::try_instance().expect("initialized")
    ));

    let window = WindowHandle::from_raw(0x5e0);
    engine.register_window(window, WindowChromeConfig::new());

    assert!(lattice_frameless::shutdown());
    assert!(!lattice_frameless::shutdown());
    assert!(lattice_frameless::instance().is_none());
    assert_eq!(
        lattice_frameless::try_instance().err(),
        Some(ChromeError::NotInitialized)
    );

    // Shutdown releases every window
    assert!(!engine.is_registered(window));
    assert!(backend.calls().contains(&BackendCall::Detach(window)));
}
