//! # Event bus: the primitive dispatch target.
//!
//! [`EventBus`] stores callbacks per event type and fires them synchronously.
//! It is the "node" an evented object dispatches through, and it can also be
//! used directly as a listen target (`on_target(&bus, ...)`).
//!
//! ## Architecture
//! ```text
//!   bind(types, id, cb) ──► handlers: type → [Entry{key, id, cb, mode}, ...]
//!                                              │
//!   fire(&mut Event) ──► snapshot(type) ───────┴──► cb(&mut Event) in order
//!                            │
//!                            └─ depth guard ──► deferred jobs run when the
//!                                               outermost fire unwinds
//! ```
//!
//! ## Rules
//! - **Identity**: entries carry the [`ListenerId`] of the listener they were
//!   created for; `unbind` by id removes every entry stamped with it.
//! - **Registration key**: each bind returns an [`EntryKey`] that names exactly
//!   that registration across all of its types.
//! - **Snapshot dispatch**: `fire` iterates a copy of the entries for the type, so
//!   listeners may bind/unbind/fire re-entrantly. Entries removed mid-dispatch still
//!   see the current dispatch; entries added mid-dispatch do not.
//! - **Single shot**: once/any entries flip an atomic flag before running and never
//!   run twice, even under re-entrant firing.
//! - **No locks held** while a callback runs.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::event::{Event, EventTypes};
use super::listener::{Callback, ListenerId};

static BUS_SEQ: AtomicU64 = AtomicU64::new(1);
static ENTRY_SEQ: AtomicU64 = AtomicU64::new(1);

/// Names one registration (`bind`, `bind_once` or `bind_any` call) on a bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryKey(u64);

impl EntryKey {
    fn next() -> Self {
        Self(ENTRY_SEQ.fetch_add(1, Ordering::Relaxed))
    }
}

enum Mode {
    Always,
    /// Single shot for the entry's own type.
    Once(AtomicBool),
    /// Single shot shared by every type of the registration.
    Any(Arc<AtomicBool>),
}

struct Entry {
    key: EntryKey,
    id: ListenerId,
    callback: Callback,
    mode: Mode,
}

type Job = Box<dyn FnOnce() + Send>;

struct Inner {
    id: u64,
    label: Cow<'static, str>,
    handlers: Mutex<HashMap<Arc<str>, Vec<Arc<Entry>>>>,
    depth: AtomicUsize,
    deferred: Mutex<Vec<Job>>,
}

/// Primitive dispatch target.
///
/// Cheap to clone (internally an `Arc`); clones refer to the same node.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: BUS_SEQ.fetch_add(1, Ordering::Relaxed),
                label: label.into(),
                handlers: Mutex::new(HashMap::new()),
                depth: AtomicUsize::new(0),
                deferred: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Process-unique id of this node.
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Registers `callback` for every type in `types`.
    pub fn bind(&self, types: &EventTypes, id: ListenerId, callback: Callback) -> EntryKey {
        self.attach(types, id, callback, || Mode::Always)
    }

    /// Registers `callback` to run at most once per type in `types`.
    pub fn bind_once(&self, types: &EventTypes, id: ListenerId, callback: Callback) -> EntryKey {
        self.attach(types, id, callback, || Mode::Once(AtomicBool::new(false)))
    }

    /// Registers `callback` to run once for whichever type in `types` fires first.
    ///
    /// The first dispatch detaches the registration from every type before the
    /// callback runs.
    pub fn bind_any(&self, types: &EventTypes, id: ListenerId, callback: Callback) -> EntryKey {
        let fired = Arc::new(AtomicBool::new(false));
        self.attach(types, id, callback, || Mode::Any(Arc::clone(&fired)))
    }

    fn attach(
        &self,
        types: &EventTypes,
        id: ListenerId,
        callback: Callback,
        mode: impl Fn() -> Mode,
    ) -> EntryKey {
        let key = EntryKey::next();
        let mut handlers = self.inner.handlers.lock();
        for t in types.iter() {
            let entry = Arc::new(Entry {
                key,
                id,
                callback: Arc::clone(&callback),
                mode: mode(),
            });
            handlers.entry(Arc::clone(t)).or_default().push(entry);
        }
        tracing::trace!(bus = self.inner.id, listener = %id, types = ?types, "bind");
        key
    }

    /// Removes listeners and returns how many entries were dropped.
    ///
    /// - `unbind(None, None)` removes everything;
    /// - `unbind(Some(types), None)` removes every entry of those types;
    /// - `unbind(types, Some(id))` removes only entries stamped with `id`.
    pub fn unbind(&self, types: Option<&EventTypes>, id: Option<ListenerId>) -> usize {
        let mut handlers = self.inner.handlers.lock();
        let before: usize = handlers.values().map(Vec::len).sum();

        match (types, id) {
            (None, None) => handlers.clear(),
            (None, Some(id)) => {
                for entries in handlers.values_mut() {
                    entries.retain(|e| e.id != id);
                }
            }
            (Some(types), None) => {
                for t in types.iter() {
                    handlers.remove(t);
                }
            }
            (Some(types), Some(id)) => {
                for t in types.iter() {
                    if let Some(entries) = handlers.get_mut(t) {
                        entries.retain(|e| e.id != id);
                    }
                }
            }
        }
        handlers.retain(|_, entries| !entries.is_empty());

        let after: usize = handlers.values().map(Vec::len).sum();
        let removed = before - after;
        if removed > 0 {
            tracing::trace!(bus = self.inner.id, removed, "unbind");
        }
        removed
    }

    /// Removes exactly the registration named by `key`, across all its types.
    pub fn unbind_entry(&self, key: EntryKey) -> usize {
        let mut handlers = self.inner.handlers.lock();
        let mut removed = 0;
        for entries in handlers.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.key != key);
            removed += before - entries.len();
        }
        handlers.retain(|_, entries| !entries.is_empty());
        removed
    }

    fn unbind_entry_for(&self, event_type: &str, key: EntryKey) {
        let mut handlers = self.inner.handlers.lock();
        if let Some(entries) = handlers.get_mut(event_type) {
            entries.retain(|e| e.key != key);
            if entries.is_empty() {
                handlers.remove(event_type);
            }
        }
    }

    /// Fires `event` and returns `false` if a listener prevented the default.
    pub fn fire(&self, event: &mut Event) -> bool {
        let snapshot: Vec<Arc<Entry>> = self
            .inner
            .handlers
            .lock()
            .get(event.event_type())
            .cloned()
            .unwrap_or_default();

        tracing::trace!(
            bus = self.inner.id,
            event = event.event_type(),
            listeners = snapshot.len(),
            "fire"
        );

        let _guard = DispatchGuard::enter(self);
        for entry in snapshot {
            if event.is_immediate_propagation_stopped() {
                break;
            }
            match &entry.mode {
                Mode::Always => {}
                Mode::Once(fired) => {
                    if fired.swap(true, Ordering::AcqRel) {
                        continue;
                    }
                    self.unbind_entry_for(event.event_type(), entry.key);
                }
                Mode::Any(fired) => {
                    if fired.swap(true, Ordering::AcqRel) {
                        continue;
                    }
                    self.unbind_entry(entry.key);
                }
            }
            (entry.callback)(event);
        }

        !event.is_default_prevented()
    }

    /// Runs `job` once no dispatch is in flight on this bus.
    ///
    /// Outside of `fire` the job runs immediately.
    pub fn defer(&self, job: impl FnOnce() + Send + 'static) {
        if self.is_dispatching() {
            self.inner.deferred.lock().push(Box::new(job));
        } else {
            job();
        }
    }

    /// True while a `fire` on this bus is on the stack.
    #[inline]
    pub fn is_dispatching(&self) -> bool {
        self.inner.depth.load(Ordering::Acquire) > 0
    }

    /// Number of entries bound for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .handlers
            .lock()
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Number of entries for `event_type` stamped with `id`.
    pub fn count_for(&self, event_type: &str, id: ListenerId) -> usize {
        self.inner
            .handlers
            .lock()
            .get(event_type)
            .map_or(0, |entries| entries.iter().filter(|e| e.id == id).count())
    }

    /// True if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.inner.handlers.lock().is_empty()
    }

    /// Sorted list of event types with at least one entry.
    pub fn event_types(&self) -> Vec<Arc<str>> {
        let mut types: Vec<Arc<str>> = self.inner.handlers.lock().keys().cloned().collect();
        types.sort_unstable();
        types
    }
}

impl PartialEq for EventBus {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for EventBus {}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .finish()
    }
}

/// Tracks dispatch depth; the outermost guard drains deferred jobs.
struct DispatchGuard<'a> {
    bus: &'a EventBus,
}

impl<'a> DispatchGuard<'a> {
    fn enter(bus: &'a EventBus) -> Self {
        bus.inner.depth.fetch_add(1, Ordering::AcqRel);
        Self { bus }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.bus.inner.depth.fetch_sub(1, Ordering::AcqRel) == 1 {
            let jobs = std::mem::take(&mut *self.bus.inner.deferred.lock());
            for job in jobs {
                job();
            }
        }
    }
}
