//! # Host capability and detection.
//!
//! A host type opts into the evented capability by embedding an
//! [`EventedSlot`] and implementing [`Eventable`]. The slot starts empty;
//! [`evented`](crate::evented) fills it once and flushes every callback queued
//! through [`add_evented_callback`] before that.
//!
//! [`is_evented`] answers "does this value currently carry a live evented
//! handle" for hosts, handles, targets and raw buses alike.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::events::EventBus;

use super::evented::Evented;
use super::target::Target;

type Deferred = Box<dyn FnOnce(&Evented) + Send>;

/// Storage a host embeds to carry the evented capability.
#[derive(Default)]
pub struct EventedSlot {
    evented: OnceLock<Evented>,
    callbacks: Mutex<Vec<Deferred>>,
}

impl EventedSlot {
    /// The handle, once granted.
    pub fn get(&self) -> Option<&Evented> {
        self.evented.get()
    }

    /// Number of callbacks waiting for the capability.
    pub fn pending_callbacks(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Stores `ev` and runs queued callbacks in registration order.
    ///
    /// Returns the handle actually held by the slot (the first one granted).
    pub(crate) fn grant(&self, ev: Evented) -> Evented {
        let (held, queued) = {
            let mut callbacks = self.callbacks.lock();
            let held = self.evented.get_or_init(|| ev).clone();
            (held, std::mem::take(&mut *callbacks))
        };
        for cb in queued {
            cb(&held);
        }
        held
    }

    /// Queues `f` unless the slot is granted; hands it back with the handle in that case.
    fn enqueue<F>(&self, f: F) -> Option<(F, Evented)>
    where
        F: FnOnce(&Evented) + Send + 'static,
    {
        let mut callbacks = self.callbacks.lock();
        if let Some(ev) = self.evented.get() {
            return Some((f, ev.clone()));
        }
        callbacks.push(Box::new(f));
        None
    }
}

impl fmt::Debug for EventedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventedSlot")
            .field("evented", &self.evented.get())
            .field("pending_callbacks", &self.pending_callbacks())
            .finish()
    }
}

/// A host type that can receive the evented capability.
///
/// # Example
/// ```
/// use evented::{evented, is_evented, Eventable, EventedConfig, EventedSlot};
///
/// #[derive(Default)]
/// struct Player {
///     slot: EventedSlot,
/// }
///
/// impl Eventable for Player {
///     fn evented_slot(&self) -> &EventedSlot {
///         &self.slot
///     }
/// }
///
/// let player = Player::default();
/// assert!(!is_evented(&player));
/// evented(&player, &EventedConfig::default()).unwrap();
/// assert!(is_evented(&player));
/// ```
pub trait Eventable {
    fn evented_slot(&self) -> &EventedSlot;

    /// Resolves a named bus node owned by the host (`Config::event_bus_key`).
    fn event_bus_for(&self, _key: &str) -> Option<EventBus> {
        None
    }

    /// The evented handle, if granted.
    fn events(&self) -> Option<&Evented> {
        self.evented_slot().get()
    }
}

/// Anything that may or may not carry an evented handle.
pub trait MaybeEvented {
    fn as_evented(&self) -> Option<Evented>;
}

impl<T: Eventable + ?Sized> MaybeEvented for T {
    fn as_evented(&self) -> Option<Evented> {
        self.evented_slot().get().cloned()
    }
}

impl MaybeEvented for Evented {
    fn as_evented(&self) -> Option<Evented> {
        Some(self.clone())
    }
}

impl MaybeEvented for EventBus {
    fn as_evented(&self) -> Option<Evented> {
        None
    }
}

impl MaybeEvented for Target {
    fn as_evented(&self) -> Option<Evented> {
        match self {
            Target::Evented(ev) => Some(ev.clone()),
            Target::Node(_) | Target::Inert => None,
        }
    }
}

/// True if `obj` carries an evented handle whose bus has not been released.
pub fn is_evented<M: MaybeEvented + ?Sized>(obj: &M) -> bool {
    obj.as_evented().is_some_and(|ev| ev.is_live())
}

/// Runs `f` with the host's evented handle: now if the host is evented,
/// otherwise when [`evented`](crate::evented) grants the capability.
///
/// Queued callbacks run in registration order, each exactly once.
pub fn add_evented_callback<H, F>(host: &H, f: F)
where
    H: Eventable + ?Sized,
    F: FnOnce(&Evented) + Send + 'static,
{
    let Some((f, ev)) = host.evented_slot().enqueue(f) else {
        return;
    };
    if ev.is_live() {
        f(&ev);
    } else {
        tracing::debug!(object = ev.id(), "evented callback on disposed host dropped");
    }
}
