//! Events: values, listeners and the primitive dispatch bus.
//!
//! This module groups the event **data model**, the **listener identity**
//! utilities and the **bus** every evented object dispatches through.
//!
//! ## Contents
//! - [`Event`], [`EventTypes`], [`Payload`] event value and type lists
//! - [`Listener`], [`ListenerId`], [`ListenerRef`], [`Callback`] identity-stamped handlers
//! - [`EventBus`], [`EntryKey`] attach/detach/fire by type and identity
//!
//! See `core/mod.rs` for how evented objects sit on top of the bus.

mod bus;
mod event;
mod listener;

pub use bus::{EntryKey, EventBus};
pub use event::{DISPOSE, Event, EventTypes, Payload};
pub use listener::{Callback, Listener, ListenerId, ListenerRef};
