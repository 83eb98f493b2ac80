//! # Listeners and identity tokens.
//!
//! A [`Listener`] is a shared handler plus a [`ListenerId`]. Cloning a listener
//! keeps its id, so "the same" listener is recognized across `on`/`off` calls
//! and across any wrapper built around it: wrappers are stamped with the id of
//! the listener they wrap.
//!
//! [`Listener::bind`] is the identity-binding utility: it produces a
//! [`Callback`] that runs the handler with a fixed evented context. The
//! context is held weakly, so a listener attached to another object never keeps
//! its own object alive.
//!
//! ## Example
//! ```rust
//! use evented::{Evented, Listener};
//!
//! let player = Evented::new();
//! let on_play = Listener::new(|_ctx, _ev| {});
//!
//! let id = player.on("play", &on_play).unwrap();
//! assert_eq!(id, on_play.id());
//! player.off("play", id).unwrap();
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::Evented;
use crate::events::Event;

static LISTENER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identity token correlating a listener with every wrapper built around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocates a fresh, never reused id.
    pub fn next() -> Self {
        Self(LISTENER_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Context-bound callback as stored by an [`EventBus`](crate::EventBus).
pub type Callback = Arc<dyn Fn(&mut Event) + Send + Sync>;

type Handler = dyn Fn(&Evented, &mut Event) + Send + Sync;

/// A callable listener with its identity token.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    handler: Arc<Handler>,
}

impl Listener {
    /// Wraps `f`, assigning a fresh [`ListenerId`].
    ///
    /// `f` receives the evented object the listener was registered from
    /// (its context) and the event being dispatched.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Evented, &mut Event) + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::next(),
            handler: Arc::new(f),
        }
    }

    #[inline]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Binds the handler to `context`.
    ///
    /// The returned callback is a no-op once `context` has been dropped.
    pub fn bind(&self, context: &Evented) -> Callback {
        let weak = context.downgrade();
        let handler = Arc::clone(&self.handler);
        Arc::new(move |ev: &mut Event| {
            if let Some(ctx) = weak.upgrade() {
                handler(&ctx, ev);
            }
        })
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

/// A listener argument: either the listener itself or only its identity token.
///
/// Subscribing requires a callable [`ListenerRef::Listener`]; removal accepts both.
#[derive(Clone, Debug)]
pub enum ListenerRef {
    /// A callable listener.
    Listener(Listener),
    /// An identity token, e.g. the handle returned by `on`.
    Id(ListenerId),
}

impl ListenerRef {
    /// Identity token of the referenced listener.
    pub fn id(&self) -> ListenerId {
        match self {
            ListenerRef::Listener(l) => l.id(),
            ListenerRef::Id(id) => *id,
        }
    }

    /// The callable listener, if this reference carries one.
    pub fn callable(&self) -> Option<&Listener> {
        match self {
            ListenerRef::Listener(l) => Some(l),
            ListenerRef::Id(_) => None,
        }
    }
}

impl From<Listener> for ListenerRef {
    fn from(l: Listener) -> Self {
        ListenerRef::Listener(l)
    }
}

impl From<&Listener> for ListenerRef {
    fn from(l: &Listener) -> Self {
        ListenerRef::Listener(l.clone())
    }
}

impl From<ListenerId> for ListenerRef {
    fn from(id: ListenerId) -> Self {
        ListenerRef::Id(id)
    }
}
