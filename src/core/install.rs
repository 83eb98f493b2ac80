//! The `evented` installer: grants the capability to a host.

use crate::config::Config;
use crate::error::EventedError;
use crate::events::EventBus;

use super::detect::Eventable;
use super::evented::Evented;

/// Grants the evented capability to `host` and returns its handle.
///
/// - With `config.event_bus_key` set, the host's bus node under that key is
///   used; an unknown key fails with [`EventedError::InvalidEventBusKey`] and
///   leaves the host untouched.
/// - Otherwise a fresh bus labelled `config.bus_label()` is allocated.
///
/// Callbacks queued through [`add_evented_callback`](crate::add_evented_callback)
/// run afterwards, in registration order. Installing twice returns the
/// existing handle.
pub fn evented<H>(host: &H, config: &Config) -> Result<Evented, EventedError>
where
    H: Eventable + ?Sized,
{
    let slot = host.evented_slot();
    if let Some(existing) = slot.get() {
        tracing::debug!(object = existing.id(), "host already evented");
        return Ok(existing.clone());
    }

    let bus = match config.bus_key() {
        Some(key) => host
            .event_bus_for(key)
            .ok_or_else(|| EventedError::InvalidEventBusKey {
                key: key.to_string(),
            })?,
        None => EventBus::new(config.bus_label()),
    };

    let ev = slot.grant(Evented::on_bus(bus, config));
    tracing::debug!(object = ev.id(), key = ?config.bus_key(), "evented capability granted");
    Ok(ev)
}
