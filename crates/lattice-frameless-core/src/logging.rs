//! Logging facilities for Lattice Frameless.
//!
//! The engine is instrumented with the `tracing` crate. To see logs, install
//! a tracing subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("lattice_frameless=debug")
//!     .init();
//! ```
//!
//! Hit-testing and client-area computation run on every pointer move, so they
//! only log at `trace`. Capability fallbacks are reported once per process
//! through [`log_capability_absent`].

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::Capability;

/// Span names used throughout Lattice Frameless for tracing.
pub mod span_names {
    /// Native message dispatch span.
    pub const DISPATCH: &str = "lattice_frameless::dispatch";
    /// State-transition refresh pass span.
    pub const REFRESH_PASS: &str = "lattice_frameless::refresh_pass";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core primitives target.
    pub const CORE: &str = "lattice_frameless_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "lattice_frameless_core::signal";
    /// DPI and system metric resolution.
    pub const METRICS: &str = "lattice_frameless::metrics";
    /// Hit-test classification.
    pub const HIT_TEST: &str = "lattice_frameless::hit_test";
    /// Client-area rewriting.
    pub const CLIENT_AREA: &str = "lattice_frameless::client_area";
    /// Window registry.
    pub const REGISTRY: &str = "lattice_frameless::registry";
    /// Chrome state machine.
    pub const STATE: &str = "lattice_frameless::state";
    /// Native message interception.
    pub const INTERCEPTOR: &str = "lattice_frameless::interceptor";
    /// Platform backends.
    pub const BACKEND: &str = "lattice_frameless::backend";
}

static REPORTED_CAPABILITIES: AtomicU32 = AtomicU32::new(0);

/// Report that an optional capability is missing.
///
/// The first report for each capability is logged at `debug`; repeats are
/// dropped. Returns `true` if this call produced the log line.
pub fn log_capability_absent(capability: Capability) -> bool {
    let previous = REPORTED_CAPABILITIES.fetch_or(capability.bit(), Ordering::Relaxed);
    if previous & capability.bit() != 0 {
        return false;
    }
    tracing::debug!(
        target: targets::METRICS,
        capability = capability.name(),
        "capability not available, using fallback"
    );
    true
}

/// Whether [`log_capability_absent`] has already reported `capability`.
pub fn capability_reported(capability: Capability) -> bool {
    REPORTED_CAPABILITIES.load(Ordering::Relaxed) & capability.bit() != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_logged_once() {
        // Other tests in this binary never report SystemMenu
        assert!(!capability_reported(Capability::SystemMenu));
        assert!(log_capability_absent(Capability::SystemMenu));
        assert!(capability_reported(Capability::SystemMenu));
        assert!(!log_capability_absent(Capability::SystemMenu));
    }
}
