//! # The evented handle: `on`, `one`, `any`, `off`, `trigger`.
//!
//! [`Evented`] owns one [`EventBus`] and a relationship table. Operations come
//! in two explicit shapes:
//!
//! - `on(types, listener)`: subscribe on this object;
//! - `on_target(target, types, listener)`: subscribe on another evented object
//!   or bus node. Passing this object (or its bus) as the target is the same as
//!   the first shape.
//!
//! ## Cross-object lifecycle
//! ```text
//!   A.on_target(B, T, fn)
//!     ├─► B.bus: T        ─► fn (context A)
//!     ├─► A.bus: dispose  ─► (a) drop fn from B
//!     ├─► B.bus: dispose  ─► (b) drop (a) from A
//!     └─► links on A and B
//!
//!   A.dispose():  teardown walks A.links ─► fn, (b), B's link gone
//!   B.dispose():  teardown walks B.links ─► (a), A's link gone
//!   A.off_target(B, T, fn): fn, (a), (b), both links gone
//! ```
//!
//! ## Rules
//! - Validation happens before anything is bound (`EventedError`, nothing changed).
//! - Listeners always run with the subscribing object as context.
//! - The subscribing object is held weakly by everything it installs elsewhere.
//! - Disposal clears every listener on the bus, then releases the bus reference
//!   per [`ReleaseMode`](crate::ReleaseMode).

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::config::{Config, ReleaseMode};
use crate::error::EventedError;
use crate::events::{Callback, EntryKey, Event, EventBus, EventTypes, ListenerId, ListenerRef};

use super::args::{self, ListenArgs};
use super::links::{Link, Links, Peer, PeerKey, Role};
use super::release;
use super::target::Target;

static OBJECT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Primitive binder used for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Method {
    On,
    One,
    Any,
}

struct Inner {
    id: u64,
    bus: RwLock<Option<EventBus>>,
    links: Links,
    release: ReleaseMode,
    /// Registration of the dispose cleanup on `bus`.
    cleanup: Mutex<Option<EntryKey>>,
}

impl Drop for Inner {
    /// Dropped without `dispose()`: detach from every peer so none keeps a dead half.
    fn drop(&mut self) {
        let bus = self.bus.get_mut().clone();
        let links = self.links.take_all();
        if !links.is_empty() {
            tracing::debug!(object = self.id, links = links.len(), "dropped while linked");
        }
        unlink(PeerKey::Evented(self.id), bus.as_ref(), links);

        if let (Some(bus), Some(key)) = (bus, self.cleanup.get_mut().take()) {
            bus.unbind_entry(key);
        }
    }
}

/// An object with the evented capability.
///
/// Cheap to clone; clones are the same object.
#[derive(Clone)]
pub struct Evented {
    inner: Arc<Inner>,
}

/// Non-owning reference to an [`Evented`].
#[derive(Clone)]
pub struct WeakEvented {
    id: u64,
    inner: Weak<Inner>,
}

impl WeakEvented {
    pub fn upgrade(&self) -> Option<Evented> {
        self.inner.upgrade().map(|inner| Evented { inner })
    }

    /// Id of the referenced object (valid even after it was dropped).
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Evented {
    /// Creates an evented object with a fresh bus and default configuration.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Creates an evented object with a fresh bus labelled per `config`.
    pub fn with_config(config: &Config) -> Self {
        Self::on_bus(EventBus::new(config.bus_label()), config)
    }

    /// Creates an evented object dispatching through an existing bus node.
    pub fn on_bus(bus: EventBus, config: &Config) -> Self {
        let ev = Self {
            inner: Arc::new(Inner {
                id: OBJECT_SEQ.fetch_add(1, Ordering::Relaxed),
                bus: RwLock::new(Some(bus.clone())),
                links: Links::default(),
                release: config.release,
                cleanup: Mutex::new(None),
            }),
        };

        // Registered first so it runs before any user `dispose` listener.
        ev.install_cleanup(&bus);

        tracing::debug!(object = ev.id(), bus = bus.id(), label = bus.label(), "evented");
        ev
    }

    /// Process-unique id of this object.
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The event bus, until it is released after disposal.
    pub fn bus(&self) -> Option<EventBus> {
        self.inner.bus.read().clone()
    }

    /// True until the bus reference has been released.
    pub fn is_live(&self) -> bool {
        self.inner.bus.read().is_some()
    }

    pub fn downgrade(&self) -> WeakEvented {
        WeakEvented {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current cross-object relationships this object takes part in.
    pub fn links(&self) -> Vec<Link> {
        self.inner.links.snapshot()
    }

    /// Number of listeners bound on this object's bus for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.bus().map_or(0, |bus| bus.listener_count(event_type))
    }

    /// Adds `listener` for `types` on this object.
    ///
    /// Returns the listener's id, usable as a handle for [`Evented::off`].
    pub fn on(
        &self,
        types: impl Into<EventTypes>,
        listener: impl Into<ListenerRef>,
    ) -> Result<ListenerId, EventedError> {
        self.subscribe(Method::On, None, types.into(), listener.into())
    }

    /// Adds `listener` for `types` on `target`, coupled to both lifetimes.
    ///
    /// # Example
    /// ```
    /// use evented::{Evented, Listener};
    ///
    /// let (a, b) = (Evented::new(), Evented::new());
    /// let fn_ = Listener::new(|_ctx, _ev| {});
    /// a.on_target(&b, "play", &fn_).unwrap();
    /// assert_eq!(b.listener_count("play"), 1);
    ///
    /// a.off_target(&b, "play", &fn_).unwrap();
    /// assert_eq!(b.listener_count("play"), 0);
    /// assert!(a.links().is_empty() && b.links().is_empty());
    /// ```
    pub fn on_target(
        &self,
        target: impl Into<Target>,
        types: impl Into<EventTypes>,
        listener: impl Into<ListenerRef>,
    ) -> Result<ListenerId, EventedError> {
        self.subscribe(Method::On, Some(target.into()), types.into(), listener.into())
    }

    /// Adds `listener` for `types` on this object; it runs at most once per type.
    pub fn one(
        &self,
        types: impl Into<EventTypes>,
        listener: impl Into<ListenerRef>,
    ) -> Result<ListenerId, EventedError> {
        self.subscribe(Method::One, None, types.into(), listener.into())
    }

    /// Like [`Evented::on_target`], but the listener runs at most once per type.
    ///
    /// The relationship is dissolved once every subscribed type has fired.
    pub fn one_target(
        &self,
        target: impl Into<Target>,
        types: impl Into<EventTypes>,
        listener: impl Into<ListenerRef>,
    ) -> Result<ListenerId, EventedError> {
        self.subscribe(Method::One, Some(target.into()), types.into(), listener.into())
    }

    /// Adds `listener` on this object for the first of `types` to fire.
    pub fn any(
        &self,
        types: impl Into<EventTypes>,
        listener: impl Into<ListenerRef>,
    ) -> Result<ListenerId, EventedError> {
        self.subscribe(Method::Any, None, types.into(), listener.into())
    }

    /// Adds `listener` on `target` for the first of `types` to fire.
    ///
    /// That first dispatch detaches it from every type and dissolves the relationship.
    pub fn any_target(
        &self,
        target: impl Into<Target>,
        types: impl Into<EventTypes>,
        listener: impl Into<ListenerRef>,
    ) -> Result<ListenerId, EventedError> {
        self.subscribe(Method::Any, Some(target.into()), types.into(), listener.into())
    }

    /// Removes every listener bound on this object. No-op when there are none.
    ///
    /// The object's own dispose cleanup stays in place.
    pub fn off_all(&self) {
        let Some(bus) = self.bus() else {
            return;
        };
        if bus.unbind(None, None) > 0 {
            self.install_cleanup(&bus);
        }
    }

    /// Removes every listener for `types` on this object.
    pub fn off_type(&self, types: impl Into<EventTypes>) -> Result<(), EventedError> {
        let types = types.into();
        args::validate_event_type(&types)?;
        if let Some(bus) = self.bus() {
            if bus.unbind(Some(&types), None) > 0 && types.contains(crate::events::DISPOSE) {
                self.install_cleanup(&bus);
            }
        }
        Ok(())
    }

    /// Removes `listener` (or every listener with that id) for `types` on this object.
    pub fn off(
        &self,
        types: impl Into<EventTypes>,
        listener: impl Into<ListenerRef>,
    ) -> Result<(), EventedError> {
        let types = types.into();
        args::validate_event_type(&types)?;
        let id = listener.into().id();
        if let Some(bus) = self.bus() {
            bus.unbind(Some(&types), Some(id));
        }
        Ok(())
    }

    /// Removes `listener` for `types` from `target`, with its coupling listeners.
    pub fn off_target(
        &self,
        target: impl Into<Target>,
        types: impl Into<EventTypes>,
        listener: impl Into<ListenerRef>,
    ) -> Result<(), EventedError> {
        let target = target.into();
        let types = types.into();
        let listener = listener.into();

        if target.refers_to(self, self.bus().as_ref()) {
            return self.off(types, listener);
        }

        args::validate_target(&target)?;
        args::validate_event_type(&types)?;
        let peer = target.peer().ok_or(EventedError::InvalidTarget)?;
        self.detach(&peer, Some(&types), listener.id());
        Ok(())
    }

    /// Fires `event` on this object.
    ///
    /// Returns `false` if a listener called [`Event::prevent_default`], `true`
    /// otherwise. A released bus fires nothing and returns `true`.
    pub fn trigger(&self, event: impl Into<Event>) -> bool {
        let mut event = event.into();
        match self.bus() {
            Some(bus) => bus.fire(&mut event),
            None => {
                tracing::debug!(
                    object = self.id(),
                    event = event.event_type(),
                    "trigger on released bus"
                );
                true
            }
        }
    }

    /// Fires `event` with `data` attached as its payload.
    pub fn trigger_with<T: Any + Send + Sync>(&self, event: impl Into<Event>, data: T) -> bool {
        self.trigger(event.into().with_data(data))
    }

    /// Tears the object down by firing [`DISPOSE`](crate::DISPOSE).
    pub fn dispose(&self) {
        self.trigger(crate::events::DISPOSE);
    }

    // ---------------------------
    // Binding
    // ---------------------------

    fn subscribe(
        &self,
        method: Method,
        target: Option<Target>,
        types: EventTypes,
        listener: ListenerRef,
    ) -> Result<ListenerId, EventedError> {
        let ListenArgs {
            peer,
            self_bus,
            target_bus,
            types,
            listener,
            callback,
        } = args::normalize(self, target, types, listener)?;
        let id = listener.id();

        let Some(peer) = peer else {
            listen(&target_bus, method, &types, id, callback);
            return Ok(id);
        };

        let callback = match method {
            Method::On => callback,
            Method::One | Method::Any => self.detaching(&peer, method, &types, id, callback),
        };
        listen(&target_bus, method, &types, id, callback);
        self.couple(&self_bus, &target_bus, peer, types, id);
        Ok(id)
    }

    /// Wraps a foreign single-shot listener so the relationship follows it.
    ///
    /// The bus already detaches the entry (per type for `One`, from all types
    /// for `Any`); the wrapper trims the links and, once nothing is left,
    /// drops the coupling listeners.
    fn detaching(
        &self,
        peer: &Peer,
        method: Method,
        types: &EventTypes,
        id: ListenerId,
        callback: Callback,
    ) -> Callback {
        let me = self.downgrade();
        let peer = peer.clone();
        let types = types.clone();
        Arc::new(move |ev: &mut Event| {
            if let Some(me) = me.upgrade() {
                let fired = match method {
                    Method::Any => types.clone(),
                    _ => EventTypes::from(ev.event_type()),
                };
                me.detach(&peer, Some(&fired), id);
            }
            callback(ev);
        })
    }

    /// Installs the dispose-coupling pair and records the relationship.
    fn couple(
        &self,
        self_bus: &EventBus,
        target_bus: &EventBus,
        peer: Peer,
        types: EventTypes,
        id: ListenerId,
    ) {
        let peer_key = peer.key();
        let dispose = EventTypes::dispose();

        // (a) this object goes away: drop the subscription on the peer.
        let local_aux = {
            let me = self.downgrade();
            let peer = peer.clone();
            let remove_listener: Callback = Arc::new(move |_ev: &mut Event| {
                let Some(me) = me.upgrade() else {
                    return;
                };
                if me.inner.links.contains(Role::Listening, peer_key, id) {
                    me.detach(&peer, None, id);
                }
            });
            self_bus.bind(&dispose, id, remove_listener)
        };

        // (b) the peer goes away: drop (a).
        let remote_aux = {
            let me = self.downgrade();
            let remove_remover: Callback = Arc::new(move |_ev: &mut Event| {
                if let Some(me) = me.upgrade() {
                    me.forget(peer_key, id);
                }
            });
            target_bus.bind(&dispose, id, remove_remover)
        };

        if let Some(other) = peer.evented() {
            other.inner.links.push(Link {
                peer: Peer::Evented(self.downgrade()),
                role: Role::ListenedTo,
                types: types.clone(),
                listener: id,
                local_aux: remote_aux,
                remote_aux: local_aux,
            });
        }
        self.inner.links.push(Link {
            peer,
            role: Role::Listening,
            types,
            listener: id,
            local_aux,
            remote_aux,
        });

        tracing::debug!(object = self.id(), peer = ?peer_key, listener = %id, "coupled");
    }

    // ---------------------------
    // Unbinding
    // ---------------------------

    fn key(&self) -> PeerKey {
        PeerKey::Evented(self.inner.id)
    }

    /// Drops the subscription `id` on `peer` for `types` (all recorded types with `None`).
    ///
    /// Coupling listeners go away with the last type of a link.
    fn detach(&self, peer: &Peer, types: Option<&EventTypes>, id: ListenerId) {
        let recorded = self
            .inner
            .links
            .snapshot()
            .into_iter()
            .filter(|l| l.role == Role::Listening && l.peer.key() == peer.key() && l.listener == id)
            .flat_map(|l| l.types.iter().cloned().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let types = types.cloned().unwrap_or_else(|| EventTypes::from(recorded));

        let dropped = self
            .inner
            .links
            .release(Role::Listening, peer.key(), id, Some(&types));

        if let Some(bus) = self.bus() {
            for link in &dropped {
                bus.unbind_entry(link.local_aux);
            }
        }
        if let Some(peer_bus) = peer.bus() {
            if !types.is_empty() {
                peer_bus.unbind(Some(&types), Some(id));
            }
            for link in &dropped {
                peer_bus.unbind_entry(link.remote_aux);
            }
        }
        if let Some(other) = peer.evented() {
            other
                .inner
                .links
                .release(Role::ListenedTo, self.key(), id, Some(&types));
        }

        tracing::debug!(object = self.id(), peer = ?peer.key(), listener = %id, dropped = dropped.len(), "detached");
    }

    /// The peer went away first: drop the links to it and their local coupling listeners.
    fn forget(&self, peer: PeerKey, id: ListenerId) {
        let dropped = self.inner.links.release(Role::Listening, peer, id, None);
        if dropped.is_empty() {
            return;
        }
        if let Some(bus) = self.bus() {
            for link in &dropped {
                bus.unbind_entry(link.local_aux);
            }
        }
        tracing::debug!(object = self.id(), peer = ?peer, listener = %id, "forgot peer");
    }

    fn install_cleanup(&self, bus: &EventBus) {
        let weak = self.downgrade();
        let cleanup: Callback = Arc::new(move |_ev: &mut Event| {
            if let Some(me) = weak.upgrade() {
                me.teardown();
            }
        });
        let key = bus.bind(&EventTypes::dispose(), ListenerId::next(), cleanup);
        *self.inner.cleanup.lock() = Some(key);
    }

    /// Dispose handler: walk the relationship table, clear the bus, schedule release.
    fn teardown(&self) {
        let bus = self.bus();
        unlink(self.key(), bus.as_ref(), self.inner.links.take_all());

        let Some(bus) = bus else {
            return;
        };
        bus.unbind(None, None);
        self.inner.cleanup.lock().take();
        tracing::debug!(object = self.id(), bus = bus.id(), "disposed");
        release::schedule(self, &bus, self.inner.release);
    }

    pub(crate) fn release_bus(&self) {
        if self.inner.bus.write().take().is_some() {
            tracing::debug!(object = self.id(), "bus released");
        }
    }
}

/// Dissolves every relationship in `links` held by the object `key` owning `own_bus`.
///
/// Removes the entries each relationship put on either bus and the peer's
/// side of the table.
fn unlink(key: PeerKey, own_bus: Option<&EventBus>, links: Vec<Link>) {
    for link in links {
        match link.role {
            Role::Listening => {
                if let Some(bus) = own_bus {
                    bus.unbind_entry(link.local_aux);
                }
                if let Some(peer_bus) = link.peer.bus() {
                    peer_bus.unbind(Some(&link.types), Some(link.listener));
                    peer_bus.unbind_entry(link.remote_aux);
                }
                if let Some(other) = link.peer.evented() {
                    other
                        .inner
                        .links
                        .release(Role::ListenedTo, key, link.listener, None);
                }
            }
            Role::ListenedTo => {
                if let Some(bus) = own_bus {
                    bus.unbind(Some(&link.types), Some(link.listener));
                    bus.unbind_entry(link.local_aux);
                }
                if let Some(other) = link.peer.evented() {
                    other
                        .inner
                        .links
                        .release(Role::Listening, key, link.listener, None);
                    if let Some(other_bus) = other.bus() {
                        other_bus.unbind_entry(link.remote_aux);
                    }
                }
            }
        }
    }
}

/// Binds `callback` on `bus` with the primitive matching `method`.
pub(crate) fn listen(
    bus: &EventBus,
    method: Method,
    types: &EventTypes,
    id: ListenerId,
    callback: Callback,
) {
    match method {
        Method::On => bus.bind(types, id, callback),
        Method::One => bus.bind_once(types, id, callback),
        Method::Any => bus.bind_any(types, id, callback),
    };
}

impl Default for Evented {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Evented {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Evented {}

impl fmt::Debug for Evented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evented")
            .field("id", &self.inner.id)
            .field("bus", &*self.inner.bus.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use crate::events::Listener;

    fn after_dispatch() -> Config {
        Config::default().with_release(ReleaseMode::AfterDispatch)
    }

    fn pair() -> (Evented, Evented) {
        (
            Evented::with_config(&after_dispatch()),
            Evented::with_config(&after_dispatch()),
        )
    }

    /// Listener counting its calls and recording the id of its context.
    fn recording() -> (Listener, Arc<AtomicUsize>, Arc<Mutex<Vec<u64>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let contexts = Arc::new(Mutex::new(Vec::new()));
        let (c, x) = (Arc::clone(&calls), Arc::clone(&contexts));
        let l = Listener::new(move |ctx, _ev| {
            c.fetch_add(1, Ordering::SeqCst);
            x.lock().push(ctx.id());
        });
        (l, calls, contexts)
    }

    // ---------------------------
    // Self subscriptions
    // ---------------------------

    #[test]
    fn test_on_self_runs_with_own_context() {
        let ev = Evented::new();
        let (l, calls, contexts) = recording();

        let id = ev.on("play", &l).unwrap();
        assert_eq!(id, l.id());
        ev.trigger("play");
        ev.trigger("play");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*contexts.lock(), vec![ev.id(), ev.id()]);
    }

    #[test]
    fn test_one_self_is_per_type() {
        let ev = Evented::new();
        let (l, calls, _) = recording();
        ev.one(["a", "b"], &l).unwrap();

        ev.trigger("a");
        ev.trigger("a");
        ev.trigger("b");
        ev.trigger("b");
        assert_eq!(calls.load(Ordering::SeqCst), 2, "once per subscribed type");
    }

    #[test]
    fn test_any_self_runs_once_for_all_types() {
        let ev = Evented::new();
        let (l, calls, _) = recording();
        ev.any(["a", "b"], &l).unwrap();

        ev.trigger("b");
        ev.trigger("a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ev.listener_count("a"), 0);
        assert_eq!(ev.listener_count("b"), 0);
    }

    #[test]
    fn test_off_accepts_listener_or_handle() {
        let ev = Evented::new();
        let (l, calls, _) = recording();

        ev.on("play", &l).unwrap();
        ev.off("play", &l).unwrap();
        ev.trigger("play");

        let id = ev.on("play", &l).unwrap();
        ev.off("play", id).unwrap();
        ev.trigger("play");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_off_type_and_off_all() {
        let ev = Evented::new();
        let (l1, c1, _) = recording();
        let (l2, c2, _) = recording();
        ev.on(["a", "b"], &l1).unwrap();
        ev.on("b", &l2).unwrap();

        ev.off_type("b").unwrap();
        ev.trigger("a");
        ev.trigger("b");
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 0);

        ev.off_all();
        ev.trigger("a");
        assert_eq!(c1.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_all_without_listeners_is_noop() {
        let ev = Evented::new();
        ev.off_all();
        ev.off_all();
        assert!(ev.is_live());
        assert_eq!(ev.listener_count("dispose"), 1, "dispose cleanup survives off_all");
    }

    #[test]
    fn test_trigger_reports_prevent_default() {
        let ev = Evented::new();
        assert!(ev.trigger("nothing-bound"));

        let l = Listener::new(|_ctx, ev| ev.prevent_default());
        ev.on("seek", &l).unwrap();
        assert!(!ev.trigger("seek"));
    }

    #[test]
    fn test_trigger_with_passes_payload() {
        let ev = Evented::new();
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let l = Listener::new(move |_ctx, ev| {
            *s.lock() = ev.data::<f64>().copied();
        });
        ev.on("timeupdate", &l).unwrap();

        ev.trigger_with("timeupdate", 12.5f64);
        assert_eq!(*seen.lock(), Some(12.5));
    }

    // ---------------------------
    // Validation
    // ---------------------------

    #[test]
    fn test_bare_handle_is_not_a_listener() {
        let (a, b) = pair();
        let err = a.on("play", ListenerId::next()).unwrap_err();
        assert_eq!(err, EventedError::InvalidListener);
        let err = a.on_target(&b, "play", ListenerId::next()).unwrap_err();
        assert_eq!(err, EventedError::InvalidListener);

        assert_eq!(a.listener_count("play"), 0);
        assert_eq!(b.listener_count("play"), 0);
        assert_eq!(b.listener_count("dispose"), 1, "no coupling on failure");
        assert!(a.links().is_empty());
    }

    #[test]
    fn test_invalid_types_and_targets() {
        let (a, _) = pair();
        let (l, _, _) = recording();

        assert_eq!(a.on("", &l), Err(EventedError::InvalidEventType));
        assert_eq!(a.on(Vec::<&str>::new(), &l), Err(EventedError::InvalidEventType));
        assert_eq!(a.on(vec!["play", " "], &l), Err(EventedError::InvalidEventType));
        assert_eq!(a.off_type(" "), Err(EventedError::InvalidEventType));
        assert_eq!(a.on_target(Target::Inert, "play", &l), Err(EventedError::InvalidTarget));
        assert_eq!(
            a.off_target(Target::Inert, "play", &l),
            Err(EventedError::InvalidTarget)
        );
    }

    #[test]
    fn test_disposed_target_is_invalid() {
        let (a, b) = pair();
        let (l, _, _) = recording();
        b.dispose();
        assert!(!b.is_live());
        assert_eq!(a.on_target(&b, "play", &l), Err(EventedError::InvalidTarget));
        assert_eq!(b.on("play", &l), Err(EventedError::InvalidTarget));
    }

    // ---------------------------
    // Cross-object coupling
    // ---------------------------

    #[test]
    fn test_on_target_runs_with_listener_context() {
        let (a, b) = pair();
        let (l, calls, contexts) = recording();

        a.on_target(&b, "play", &l).unwrap();
        b.trigger("play");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*contexts.lock(), vec![a.id()], "context is the subscriber");
        assert_eq!(a.listener_count("dispose"), 2, "cleanup + remove-listener");
        assert_eq!(b.listener_count("dispose"), 2, "cleanup + remove-remover");

        let (la, lb) = (a.links(), b.links());
        assert_eq!(la.len(), 1);
        assert_eq!(lb.len(), 1);
        assert_eq!(la[0].role, Role::Listening);
        assert_eq!(lb[0].role, Role::ListenedTo);
        assert_eq!(la[0].peer.key(), PeerKey::Evented(b.id()));
        assert_eq!(lb[0].peer.key(), PeerKey::Evented(a.id()));
    }

    #[test]
    fn test_self_target_is_plain_on() {
        let (a, _) = pair();
        let (l, calls, _) = recording();
        let bus = a.bus().unwrap();

        a.on_target(&a, "x", &l).unwrap();
        a.on_target(&bus, "y", &l).unwrap();
        a.trigger("x");
        a.trigger("y");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(a.links().is_empty());
        assert_eq!(a.listener_count("dispose"), 1);

        a.off_target(&a, ["x", "y"], &l).unwrap();
        assert_eq!(a.listener_count("x") + a.listener_count("y"), 0);
    }

    #[test]
    fn test_listener_dropped_when_subscriber_disposed_first() {
        let (a, b) = pair();
        let (l, calls, _) = recording();

        a.on_target(&b, "play", &l).unwrap();
        a.dispose();
        b.trigger("play");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(b.listener_count("play"), 0);
        assert_eq!(b.listener_count("dispose"), 1, "remove-remover gone");
        assert!(b.links().is_empty());
        assert!(!a.is_live());
    }

    #[test]
    fn test_target_disposed_first_then_subscriber() {
        let (a, b) = pair();
        let (l, calls, _) = recording();

        a.on_target(&b, "play", &l).unwrap();
        b.dispose();

        assert!(a.links().is_empty());
        assert_eq!(a.listener_count("dispose"), 1, "remove-listener gone");

        a.dispose();
        assert!(!a.is_live() && !b.is_live());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_off_target_removes_pair_and_links() {
        let (a, b) = pair();
        let (l, calls, _) = recording();

        let id = a.on_target(&b, "play", &l).unwrap();
        a.off_target(&b, "play", id).unwrap();
        b.trigger("play");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(b.listener_count("play"), 0);
        assert_eq!(a.listener_count("dispose"), 1);
        assert_eq!(b.listener_count("dispose"), 1);
        assert!(a.links().is_empty() && b.links().is_empty());
    }

    #[test]
    fn test_off_target_partial_types_keeps_coupling() {
        let (a, b) = pair();
        let (l, calls, _) = recording();

        a.on_target(&b, ["play", "pause"], &l).unwrap();
        a.off_target(&b, "play", &l).unwrap();

        b.trigger("play");
        b.trigger("pause");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.links()[0].types, EventTypes::from("pause"));
        assert_eq!(a.listener_count("dispose"), 2);

        a.off_target(&b, "pause", &l).unwrap();
        assert!(a.links().is_empty() && b.links().is_empty());
        assert_eq!(b.listener_count("dispose"), 1);
    }

    #[test]
    fn test_one_target_runs_once() {
        let (a, b) = pair();
        let (l, calls, contexts) = recording();

        a.one_target(&b, "play", &l).unwrap();
        b.trigger("play");
        b.trigger("play");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*contexts.lock(), vec![a.id()]);
        assert!(a.links().is_empty() && b.links().is_empty());
        assert_eq!(a.listener_count("dispose"), 1);
        assert_eq!(b.listener_count("dispose"), 1);
    }

    #[test]
    fn test_one_target_dissolves_after_every_type() {
        let (a, b) = pair();
        let (l, calls, _) = recording();

        a.one_target(&b, ["a", "b"], &l).unwrap();
        b.trigger("a");
        b.trigger("a");
        assert_eq!(a.links().len(), 1, "b still pending");

        b.trigger("b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(a.links().is_empty());
        assert_eq!(b.listener_count("dispose"), 1);
    }

    #[test]
    fn test_any_target_detaches_from_all_types() {
        let (a, b) = pair();
        let (l, calls, _) = recording();

        a.any_target(&b, ["t1", "t2"], &l).unwrap();
        b.trigger("t1");
        b.trigger("t2");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.listener_count("t1") + b.listener_count("t2"), 0);
        assert!(a.links().is_empty() && b.links().is_empty());
        assert_eq!(a.listener_count("dispose"), 1);
    }

    #[test]
    fn test_listen_to_bus_node() {
        let a = Evented::with_config(&after_dispatch());
        let node = EventBus::new("node");
        let (l, calls, _) = recording();

        a.on_target(&node, "click", &l).unwrap();
        node.fire(&mut "click".into());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.links()[0].peer.key(), PeerKey::Node(node.id()));

        a.dispose();
        node.fire(&mut "click".into());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(node.is_empty());
    }

    #[test]
    fn test_user_dispose_listener_sees_live_object() {
        let ev = Evented::with_config(&after_dispatch());
        let live = Arc::new(Mutex::new(None));
        let s = Arc::clone(&live);
        let l = Listener::new(move |ctx, _ev| *s.lock() = Some(ctx.is_live()));
        ev.on("dispose", &l).unwrap();

        ev.dispose();
        assert_eq!(*live.lock(), Some(true), "released only after dispatch");
        assert!(!ev.is_live());
        assert!(ev.trigger("play"), "released bus fires nothing");
    }

    #[test]
    fn test_off_all_keeps_teardown() {
        let (a, b) = pair();
        let (l, _, _) = recording();

        a.on_target(&b, "play", &l).unwrap();
        a.off_all();
        a.dispose();

        assert_eq!(b.listener_count("play"), 0);
        assert!(b.links().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_release_after_yield() {
        let ev = Evented::new();
        ev.dispose();
        assert!(ev.is_live(), "release is deferred to a task");

        for _ in 0..16 {
            if !ev.is_live() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!ev.is_live());
    }

    #[test]
    fn test_spawn_without_runtime_falls_back() {
        let ev = Evented::new();
        ev.dispose();
        assert!(!ev.is_live());
    }

    #[test]
    fn test_off_on_disposed_object_is_noop() {
        let a = Evented::with_config(&after_dispatch());
        let (l, _, _) = recording();
        a.dispose();

        assert_eq!(a.off("x", &l), Ok(()));
        assert_eq!(a.off_type("x"), Ok(()));
        a.off_all();
        assert_eq!(a.off_target(&a, "x", &l), Ok(()), "self target after release");
    }

    #[test]
    fn test_dropped_subscriber_detaches_from_peer() {
        let b = Evented::with_config(&after_dispatch());
        let (l, calls, _) = recording();

        for _ in 0..3 {
            let a = Evented::with_config(&after_dispatch());
            a.on_target(&b, "play", &l).unwrap();
            a.on_target(&b, "pause", &l).unwrap();
        }
        b.trigger("play");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(b.listener_count("play") + b.listener_count("pause"), 0);
        assert_eq!(b.listener_count("dispose"), 1, "only b's own cleanup left");
        assert!(b.links().is_empty());
    }

    #[test]
    fn test_dropped_target_detaches_subscriber() {
        let a = Evented::with_config(&after_dispatch());
        let (l, _, _) = recording();
        {
            let b = Evented::with_config(&after_dispatch());
            a.on_target(&b, "play", &l).unwrap();
            assert_eq!(a.listener_count("dispose"), 2);
        }

        assert!(a.links().is_empty());
        assert_eq!(a.listener_count("dispose"), 1);
    }

    #[test]
    fn test_listener_panic_leaves_state_consistent() {
        let ev = Evented::with_config(&after_dispatch());
        let bus = ev.bus().unwrap();
        let deferred = Arc::new(AtomicUsize::new(0));

        let d = Arc::clone(&deferred);
        let boom = Listener::new(move |ctx, _ev| {
            let d = Arc::clone(&d);
            if let Some(bus) = ctx.bus() {
                bus.defer(move || {
                    d.fetch_add(1, Ordering::SeqCst);
                });
            }
            panic!("listener failure");
        });
        ev.on("x", &boom).unwrap();

        let res = panic::catch_unwind(AssertUnwindSafe(|| ev.trigger("x")));
        assert!(res.is_err(), "panic unwinds out of trigger");
        assert!(!bus.is_dispatching());
        assert_eq!(deferred.load(Ordering::SeqCst), 1, "deferred job ran on unwind");

        let (l, calls, _) = recording();
        ev.on("y", &l).unwrap();
        assert!(ev.trigger("y"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        ev.dispose();
        assert!(!ev.is_live());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawn_release_waits_for_dispose_dispatch() {
        let ev = Evented::new();
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let slow = Listener::new(move |ctx, _ev| {
            std::thread::sleep(Duration::from_millis(50));
            *s.lock() = Some(ctx.is_live());
        });
        ev.on("dispose", &slow).unwrap();

        ev.dispose();
        assert_eq!(*seen.lock(), Some(true), "bus released during dispose dispatch");

        for _ in 0..200 {
            if !ev.is_live() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(!ev.is_live());
    }
}
