//! # Evented capability configuration.
//!
//! Provides [`Config`] with the settings consumed by the installer
//! ([`evented`](crate::evented)) and by standalone construction
//! ([`Evented::with_config`](crate::Evented::with_config)).
//!
//! ## Sentinel values
//! - `event_bus_key = Some("")` → no key (a fresh bus is allocated)
//! - `bus_label = ""` → falls back to [`DEFAULT_BUS_LABEL`]

use std::borrow::Cow;

/// Label given to buses allocated by the installer.
pub const DEFAULT_BUS_LABEL: &str = "evented-event-bus";

/// When the bus reference of a disposed object is released.
///
/// Release is never synchronous with the `dispose` dispatch itself: listeners
/// still running for that dispatch keep a usable bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Once the outermost dispatch returns, spawn a tokio task that yields once, then releases.
    ///
    /// Without a current tokio runtime this degrades to [`ReleaseMode::AfterDispatch`].
    #[default]
    Spawn,
    /// Release when the outermost in-flight dispatch on the bus unwinds.
    AfterDispatch,
}

/// Configuration for granting the evented capability.
///
/// ## Field semantics
/// - `event_bus_key`: reuse the host's bus node stored under this key instead of allocating one
/// - `bus_label`: label of a freshly allocated bus (diagnostics only)
/// - `release`: scheduling of the post-dispose bus release
#[derive(Clone, Debug)]
pub struct Config {
    /// Key of an existing bus node on the host to use as the event bus.
    ///
    /// The host resolves it through
    /// [`Eventable::event_bus_for`](crate::Eventable::event_bus_for); an unknown
    /// key fails installation with `InvalidEventBusKey`.
    pub event_bus_key: Option<String>,

    /// Label for allocated buses. Shows up in `Debug` output and logs.
    pub bus_label: Cow<'static, str>,

    /// How the bus reference is released after disposal.
    pub release: ReleaseMode,
}

impl Config {
    /// Sets the host key of the bus node to reuse.
    pub fn with_event_bus_key(mut self, key: impl Into<String>) -> Self {
        self.event_bus_key = Some(key.into());
        self
    }

    /// Sets the label of allocated buses.
    pub fn with_bus_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.bus_label = label.into();
        self
    }

    /// Sets the release mode.
    pub fn with_release(mut self, release: ReleaseMode) -> Self {
        self.release = release;
        self
    }

    /// Returns the bus key as an `Option`, treating an empty key as absent.
    #[inline]
    pub fn bus_key(&self) -> Option<&str> {
        self.event_bus_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Returns the bus label, falling back to [`DEFAULT_BUS_LABEL`] when empty.
    #[inline]
    pub fn bus_label(&self) -> Cow<'static, str> {
        if self.bus_label.is_empty() {
            Cow::Borrowed(DEFAULT_BUS_LABEL)
        } else {
            self.bus_label.clone()
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `event_bus_key = None` (allocate a fresh bus)
    /// - `bus_label = "evented-event-bus"`
    /// - `release = ReleaseMode::Spawn`
    fn default() -> Self {
        Self {
            event_bus_key: None,
            bus_label: Cow::Borrowed(DEFAULT_BUS_LABEL),
            release: ReleaseMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_no_key() {
        let cfg = Config::default().with_event_bus_key("");
        assert_eq!(cfg.bus_key(), None);

        let cfg = Config::default().with_event_bus_key("el");
        assert_eq!(cfg.bus_key(), Some("el"));
    }

    #[test]
    fn test_empty_label_falls_back() {
        let cfg = Config::default().with_bus_label("");
        assert_eq!(cfg.bus_label(), DEFAULT_BUS_LABEL);

        let cfg = Config::default().with_bus_label("player-bus");
        assert_eq!(cfg.bus_label(), "player-bus");
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.release, ReleaseMode::Spawn);
        assert!(cfg.event_bus_key.is_none());
    }
}
