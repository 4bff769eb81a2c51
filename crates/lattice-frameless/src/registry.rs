//! The window registry.
//!
//! A process-wide table of the windows currently opted into frameless
//! behavior. Each entry owns the window's [`WindowChromeConfig`] and its
//! derived [`WindowRuntimeState`].
//!
//! The table sits behind a single [`RwLock`]. Every access is a closure run
//! under the lock, and the closures never call into the platform backend:
//! callers copy out what they need, release the lock, and only then talk to
//! the OS. Hit-testing takes the read side, so concurrent lookups never
//! contend with each other.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::RwLock;

use lattice_frameless_core::{Insets, Point};
use lattice_frameless_core::logging::targets;

use crate::client_area::ClientInsets;
use crate::config::WindowChromeConfig;
use crate::handle::WindowHandle;
use crate::state::WindowRuntimeState;

/// Lifecycle of a registered window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Registered, native style not yet normalized.
    Registered,
    /// The first message has been seen and the style normalized.
    Active,
}

/// Result of [`WindowRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new entry was created.
    Inserted,
    /// An existing entry's configuration was replaced.
    Updated,
}

/// One registered window.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub config: WindowChromeConfig,
    pub runtime: WindowRuntimeState,
    pub phase: LifecyclePhase,
    /// Insets from the most recent client-area computation.
    pub client_insets: Option<ClientInsets>,
    /// Insets the OS computed on its own, when the native frame is preserved.
    pub native_insets: Option<Insets>,
    /// Completed state-machine refresh passes.
    pub refresh_passes: u64,
    /// Last pointer position reported by the toolkit.
    pub pointer: Option<Point>,
    /// Time and position of the last left press on the caption.
    pub last_caption_press: Option<(Instant, Point)>,
}

impl RegistryEntry {
    fn new(config: WindowChromeConfig) -> Self {
        Self {
            config,
            runtime: WindowRuntimeState::default(),
            phase: LifecyclePhase::Registered,
            client_insets: None,
            native_insets: None,
            refresh_passes: 0,
            pointer: None,
            last_caption_press: None,
        }
    }
}

/// Table of frameless windows.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    entries: RwLock<HashMap<WindowHandle, RegistryEntry>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `window`, or replace its configuration if already present.
    ///
    /// Re-registering keeps the runtime state and lifecycle phase, so the
    /// native style is not normalized a second time.
    pub fn register(&self, window: WindowHandle, config: WindowChromeConfig) -> Registration {
        let mut entries = self.entries.write();
        match entries.get_mut(&window) {
            Some(entry) => {
                entry.config = config;
                tracing::debug!(target: targets::REGISTRY, %window, "window configuration updated");
                Registration::Updated
            }
            None => {
                entries.insert(window, RegistryEntry::new(config));
                tracing::debug!(target: targets::REGISTRY, %window, count = entries.len(), "window registered");
                Registration::Inserted
            }
        }
    }

    /// Remove `window`, returning its configuration.
    pub fn unregister(&self, window: WindowHandle) -> Option<WindowChromeConfig> {
        let removed = self.entries.write().remove(&window);
        if removed.is_some() {
            tracing::debug!(target: targets::REGISTRY, %window, "window unregistered");
        }
        removed.map(|entry| entry.config)
    }

    pub fn contains(&self, window: WindowHandle) -> bool {
        self.entries.read().contains_key(&window)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Handles of every registered window.
    pub fn handles(&self) -> Vec<WindowHandle> {
        self.entries.read().keys().copied().collect()
    }

    /// Remove every entry, returning the handles that were registered.
    pub fn clear(&self) -> Vec<WindowHandle> {
        self.entries.write().drain().map(|(window, _)| window).collect()
    }

    /// A copy of the window's configuration.
    pub fn lookup(&self, window: WindowHandle) -> Option<WindowChromeConfig> {
        self.with_entry(window, |entry| entry.config.clone())
    }

    /// Run `f` on the entry under the read lock.
    pub fn with_entry<R>(&self, window: WindowHandle, f: impl FnOnce(&RegistryEntry) -> R) -> Option<R> {
        self.entries.read().get(&window).map(f)
    }

    /// Run `f` on the entry under the write lock.
    pub fn update_entry<R>(
        &self,
        window: WindowHandle,
        f: impl FnOnce(&mut RegistryEntry) -> R,
    ) -> Option<R> {
        self.entries.write().get_mut(&window).map(f)
    }

    /// Run `f` on the window's configuration under the read lock.
    pub fn with_config<R>(
        &self,
        window: WindowHandle,
        f: impl FnOnce(&WindowChromeConfig) -> R,
    ) -> Option<R> {
        self.with_entry(window, |entry| f(&entry.config))
    }

    /// Mutate the window's configuration in place.
    pub fn update_config<R>(
        &self,
        window: WindowHandle,
        f: impl FnOnce(&mut WindowChromeConfig) -> R,
    ) -> Option<R> {
        self.update_entry(window, |entry| f(&mut entry.config))
    }

    /// A snapshot of the window's runtime state.
    pub fn runtime(&self, window: WindowHandle) -> Option<WindowRuntimeState> {
        self.with_entry(window, |entry| entry.runtime)
    }
}
