//! # LogWriter: simple event printer
//!
//! A minimal listener that logs every event it sees through `tracing`.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! INFO evented: [play] writer="player" object=3 seq=17 prevented=false has_data=false
//! INFO evented: [timeupdate] writer="player" object=3 seq=18 prevented=false has_data=true
//! INFO evented: [dispose] writer="player" object=3 seq=19 prevented=false has_data=false
//! ```

use std::borrow::Cow;

use crate::core::Evented;
use crate::error::EventedError;
use crate::events::{EventTypes, Listener, ListenerId};

/// Event writer listener.
#[derive(Clone, Debug)]
pub struct LogWriter {
    listener: Listener,
}

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self::named("LogWriter")
    }

    /// Construct a [`LogWriter`] whose lines carry `name`.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let listener = Listener::new(move |ctx, e| {
            tracing::info!(
                target: "evented",
                writer = %name,
                object = ctx.id(),
                seq = e.seq,
                prevented = e.is_default_prevented(),
                has_data = e.payload().is_some(),
                "[{}]",
                e.event_type()
            );
        });
        Self { listener }
    }

    /// The underlying listener, for `on`/`off` calls of your own.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Starts logging `types` on `ev`.
    pub fn attach(
        &self,
        ev: &Evented,
        types: impl Into<EventTypes>,
    ) -> Result<ListenerId, EventedError> {
        ev.on(types, &self.listener)
    }

    /// Stops logging `types` on `ev`.
    pub fn detach(&self, ev: &Evented, types: impl Into<EventTypes>) -> Result<(), EventedError> {
        ev.off(types, &self.listener)
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_detach() {
        let ev = Evented::new();
        let w = LogWriter::named("player");

        let id = w.attach(&ev, ["play", "pause"]).unwrap();
        assert_eq!(id, w.listener().id());
        assert_eq!(ev.listener_count("play"), 1);
        assert!(ev.trigger("play"));

        w.detach(&ev, ["play", "pause"]).unwrap();
        assert_eq!(ev.listener_count("play") + ev.listener_count("pause"), 0);
    }
}
