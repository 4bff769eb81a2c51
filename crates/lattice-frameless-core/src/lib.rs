//! Core primitives for Lattice Frameless.
//!
//! This crate holds the pieces shared by the chrome engine and its platform
//! backends:
//!
//! - [`geometry`]: integer device-pixel [`Point`], [`Size`], [`Rect`] and [`Insets`]
//! - [`signal`]: the [`Signal`] notification primitive
//! - [`error`]: [`ChromeError`] and the [`Capability`] taxonomy
//! - [`logging`]: tracing targets and once-per-capability fallback reporting

pub mod error;
pub mod geometry;
pub mod logging;
pub mod signal;

pub use error::{Capability, ChromeError, ChromeResult};
pub use geometry::{Insets, Point, Rect, Size};
pub use logging::log_capability_absent;
pub use signal::{ConnectionId, Signal};
