//! # Relationship table.
//!
//! Every cross-object subscription is recorded on both participants:
//!
//! ```text
//!   A.on_target(B, T, fn)
//!
//!   A.links: Link{ peer: B, role: Listening,  types: T, listener: fn.id,
//!                  local_aux: (a) on A/dispose, remote_aux: (b) on B/dispose }
//!   B.links: Link{ peer: A, role: ListenedTo, types: T, listener: fn.id,
//!                  local_aux: (b),              remote_aux: (a) }
//! ```
//!
//! `(a)` removes `fn` from B when A is disposed; `(b)` removes `(a)` when B is
//! disposed. Links are pushed after both auxiliaries are bound and removed
//! before the bus reference is released, so the table is the authoritative
//! view of which auxiliaries exist.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{EntryKey, EventBus, EventTypes, ListenerId};

use super::evented::{Evented, WeakEvented};

/// Side of a relationship a link describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// This object listens to the peer.
    Listening,
    /// The peer listens to this object.
    ListenedTo,
}

/// Other participant of a relationship.
#[derive(Clone)]
pub enum Peer {
    /// An evented object, held weakly.
    Evented(WeakEvented),
    /// A raw bus node.
    Node(EventBus),
}

/// Identity of a peer, stable after the peer is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeerKey {
    Evented(u64),
    Node(u64),
}

impl Peer {
    pub fn key(&self) -> PeerKey {
        match self {
            Peer::Evented(w) => PeerKey::Evented(w.id()),
            Peer::Node(bus) => PeerKey::Node(bus.id()),
        }
    }

    /// The peer as an evented object, if it is one and still alive.
    pub fn evented(&self) -> Option<Evented> {
        match self {
            Peer::Evented(w) => w.upgrade(),
            Peer::Node(_) => None,
        }
    }

    /// Bus of the peer, if it still has one.
    pub fn bus(&self) -> Option<EventBus> {
        match self {
            Peer::Evented(w) => w.upgrade().and_then(|ev| ev.bus()),
            Peer::Node(bus) => Some(bus.clone()),
        }
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.key(), f)
    }
}

/// One side of a cross-object relationship.
#[derive(Clone, Debug)]
pub struct Link {
    /// The other participant.
    pub peer: Peer,
    /// Which side this link describes.
    pub role: Role,
    /// Event types still subscribed.
    pub types: EventTypes,
    /// Identity of the subscribed listener.
    pub listener: ListenerId,
    pub(crate) local_aux: EntryKey,
    pub(crate) remote_aux: EntryKey,
}

/// Per-object table of links.
#[derive(Default)]
pub(crate) struct Links {
    entries: Mutex<Vec<Link>>,
}

impl Links {
    pub(crate) fn push(&self, link: Link) {
        self.entries.lock().push(link);
    }

    pub(crate) fn snapshot(&self) -> Vec<Link> {
        self.entries.lock().clone()
    }

    pub(crate) fn take_all(&self) -> Vec<Link> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub(crate) fn contains(&self, role: Role, peer: PeerKey, listener: ListenerId) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|l| l.role == role && l.peer.key() == peer && l.listener == listener)
    }

    /// Releases `types` (or everything, with `None`) from the matching links.
    ///
    /// Links left without types are removed and returned; the others are
    /// trimmed in place.
    pub(crate) fn release(
        &self,
        role: Role,
        peer: PeerKey,
        listener: ListenerId,
        types: Option<&EventTypes>,
    ) -> Vec<Link> {
        let mut entries = self.entries.lock();
        let mut dropped = Vec::new();
        let mut i = 0;
        while i < entries.len() {
            let l = &mut entries[i];
            if l.role != role || l.peer.key() != peer || l.listener != listener {
                i += 1;
                continue;
            }
            if let Some(types) = types {
                let remaining: Vec<Arc<str>> = l
                    .types
                    .iter()
                    .filter(|t| !types.contains(t))
                    .cloned()
                    .collect();
                if !remaining.is_empty() {
                    l.types = EventTypes::from(remaining);
                    i += 1;
                    continue;
                }
            }
            dropped.push(entries.remove(i));
        }
        dropped
    }
}
