//! Argument validation and normalization for `on`/`one`/`any`.
//!
//! Everything is checked before anything is bound, in a fixed order:
//! target, event type, listener. A failed check leaves every bus untouched.

use crate::error::EventedError;
use crate::events::{Callback, EventBus, EventTypes, ListenerRef};

use super::evented::Evented;
use super::links::Peer;
use super::target::Target;

/// Normalized subscription request.
pub(crate) struct ListenArgs {
    /// The other participant; `None` when the subscription is on `self`.
    pub(crate) peer: Option<Peer>,
    pub(crate) self_bus: EventBus,
    pub(crate) target_bus: EventBus,
    pub(crate) types: EventTypes,
    pub(crate) listener: ListenerRef,
    /// Listener bound to the subscribing object.
    pub(crate) callback: Callback,
}

pub(crate) fn validate_target(target: &Target) -> Result<EventBus, EventedError> {
    target.bus().ok_or(EventedError::InvalidTarget)
}

pub(crate) fn validate_event_type(types: &EventTypes) -> Result<(), EventedError> {
    if types.is_valid() {
        Ok(())
    } else {
        Err(EventedError::InvalidEventType)
    }
}

pub(crate) fn validate_listener(listener: &ListenerRef) -> Result<(), EventedError> {
    listener
        .callable()
        .map(|_| ())
        .ok_or(EventedError::InvalidListener)
}

/// Resolves the subscription shape and binds the listener to `me`.
pub(crate) fn normalize(
    me: &Evented,
    target: Option<Target>,
    types: EventTypes,
    listener: ListenerRef,
) -> Result<ListenArgs, EventedError> {
    let self_bus = me.bus().ok_or(EventedError::InvalidTarget)?;

    let (peer, target_bus) = match target {
        Some(target) if !target.refers_to(me, Some(&self_bus)) => {
            let target_bus = validate_target(&target)?;
            (target.peer(), target_bus)
        }
        _ => (None, self_bus.clone()),
    };

    validate_event_type(&types)?;
    validate_listener(&listener)?;

    let callback = match listener.callable() {
        Some(l) => l.bind(me),
        None => return Err(EventedError::InvalidListener),
    };

    Ok(ListenArgs {
        peer,
        self_bus,
        target_bus,
        types,
        listener,
        callback,
    })
}
