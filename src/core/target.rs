//! Listen targets: a bus node or an evented object.

use crate::events::EventBus;

use super::detect::Eventable;
use super::evented::Evented;
use super::links::Peer;

/// What `*_target` operations subscribe on.
#[derive(Clone, Debug)]
pub enum Target {
    /// A raw bus node.
    Node(EventBus),
    /// Another evented object.
    Evented(Evented),
    /// Something that is neither (e.g. a host that was never granted the capability).
    Inert,
}

impl Target {
    /// Target for `host`: its evented handle, or [`Target::Inert`] if it has none yet.
    pub fn of<H: Eventable + ?Sized>(host: &H) -> Self {
        host.evented_slot()
            .get()
            .map_or(Target::Inert, |ev| Target::Evented(ev.clone()))
    }

    /// Bus events for this target are bound on, if it is usable.
    pub(crate) fn bus(&self) -> Option<EventBus> {
        match self {
            Target::Node(bus) => Some(bus.clone()),
            Target::Evented(ev) => ev.bus(),
            Target::Inert => None,
        }
    }

    /// True if the target is `me` or `me`'s own bus (while it has one).
    pub(crate) fn refers_to(&self, me: &Evented, my_bus: Option<&EventBus>) -> bool {
        match self {
            Target::Node(bus) => my_bus == Some(bus),
            Target::Evented(ev) => ev == me,
            Target::Inert => false,
        }
    }

    pub(crate) fn peer(&self) -> Option<Peer> {
        match self {
            Target::Node(bus) => Some(Peer::Node(bus.clone())),
            Target::Evented(ev) => Some(Peer::Evented(ev.downgrade())),
            Target::Inert => None,
        }
    }
}

impl From<EventBus> for Target {
    fn from(bus: EventBus) -> Self {
        Target::Node(bus)
    }
}

impl From<&EventBus> for Target {
    fn from(bus: &EventBus) -> Self {
        Target::Node(bus.clone())
    }
}

impl From<Evented> for Target {
    fn from(ev: Evented) -> Self {
        Target::Evented(ev)
    }
}

impl From<&Evented> for Target {
    fn from(ev: &Evented) -> Self {
        Target::Evented(ev.clone())
    }
}
