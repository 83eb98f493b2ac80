//! Deferred release of a disposed object's bus reference.
//!
//! Listeners that run after the cleanup within the same `dispose` dispatch may
//! still look at the object, so the bus reference is dropped later:
//!
//! - [`ReleaseMode::Spawn`]: on the current tokio runtime, after a yield. The
//!   task is spawned when the outermost dispatch on the bus returns. Without a
//!   runtime it degrades to [`ReleaseMode::AfterDispatch`].
//! - [`ReleaseMode::AfterDispatch`]: when the outermost dispatch on the bus returns.

use crate::config::ReleaseMode;
use crate::events::EventBus;

use super::evented::Evented;

pub(crate) fn schedule(ev: &Evented, bus: &EventBus, mode: ReleaseMode) {
    let weak = ev.downgrade();
    let job = move || {
        if let Some(ev) = weak.upgrade() {
            ev.release_bus();
        }
    };

    match mode {
        // Spawned only after the outermost dispatch has unwound.
        ReleaseMode::Spawn => match tokio::runtime::Handle::try_current() {
            Ok(handle) => bus.defer(move || {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    job();
                });
            }),
            Err(_) => {
                tracing::debug!(object = ev.id(), "no runtime; releasing after dispatch");
                bus.defer(job);
            }
        },
        ReleaseMode::AfterDispatch => bus.defer(job),
    }
}
