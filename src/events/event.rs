//! # Events fired through an event bus.
//!
//! An [`Event`] carries its type name, an optional opaque payload and two
//! dispatch flags (default prevented, immediate propagation stopped). Listeners
//! receive `&mut Event` so they can flip those flags.
//!
//! [`EventTypes`] is the validated-on-use list of type names accepted by
//! `on`/`one`/`any`/`off`. It converts from a single `&str`/`String` or from a
//! list of them.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use evented::Event;
//!
//! let mut ev = Event::new("play").with_data(42u32);
//! assert_eq!(ev.event_type(), "play");
//! assert_eq!(ev.data::<u32>(), Some(&42));
//!
//! ev.prevent_default();
//! assert!(ev.is_default_prevented());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Type of the event fired when an evented object is torn down.
pub const DISPOSE: &str = "dispose";

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque auxiliary data passed along with an event.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// A single dispatch of an event type.
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    event_type: Arc<str>,
    data: Option<Payload>,
    default_prevented: bool,
    immediate_stopped: bool,
}

impl Event {
    /// Creates a new event of the given type with current timestamp and next sequence number.
    pub fn new(event_type: impl Into<Arc<str>>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            event_type: event_type.into(),
            data: None,
            default_prevented: false,
            immediate_stopped: false,
        }
    }

    /// Attaches an opaque payload.
    #[inline]
    pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    /// Attaches an already shared payload.
    #[inline]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.data = Some(payload);
        self
    }

    /// The event type name.
    #[inline]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Downcasts the payload, if any, to `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_deref().and_then(|d| d.downcast_ref::<T>())
    }

    /// The raw payload.
    #[inline]
    pub fn payload(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    /// Cancels the default behavior; `trigger` then returns `false`.
    #[inline]
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[inline]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Skips the remaining listeners of the current dispatch.
    #[inline]
    pub fn stop_immediate_propagation(&mut self) {
        self.immediate_stopped = true;
    }

    #[inline]
    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_stopped
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("seq", &self.seq)
            .field("type", &self.event_type)
            .field("has_data", &self.data.is_some())
            .field("default_prevented", &self.default_prevented)
            .finish()
    }
}

impl From<&str> for Event {
    fn from(event_type: &str) -> Self {
        Event::new(event_type)
    }
}

impl From<String> for Event {
    fn from(event_type: String) -> Self {
        Event::new(event_type)
    }
}

/// One or more event type names.
///
/// Construction never fails; validity (non-empty, no blank names) is checked
/// where the types are consumed so the caller gets `InvalidEventType`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventTypes(Vec<Arc<str>>);

impl EventTypes {
    /// Iterates over the type names.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<str>> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `event_type` is one of the names.
    pub fn contains(&self, event_type: &str) -> bool {
        self.0.iter().any(|t| &**t == event_type)
    }

    /// True if the list is non-empty and every name has a non-whitespace character.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|t| t.chars().any(|c| !c.is_whitespace()))
    }

    pub(crate) fn dispose() -> Self {
        Self(vec![Arc::from(DISPOSE)])
    }
}

impl From<&str> for EventTypes {
    fn from(t: &str) -> Self {
        Self(vec![Arc::from(t)])
    }
}

impl From<String> for EventTypes {
    fn from(t: String) -> Self {
        Self(vec![Arc::from(t)])
    }
}

impl From<&String> for EventTypes {
    fn from(t: &String) -> Self {
        Self(vec![Arc::from(t.as_str())])
    }
}

impl From<Vec<&str>> for EventTypes {
    fn from(ts: Vec<&str>) -> Self {
        Self(ts.into_iter().map(Arc::from).collect())
    }
}

impl From<Vec<String>> for EventTypes {
    fn from(ts: Vec<String>) -> Self {
        Self(ts.into_iter().map(Arc::from).collect())
    }
}

impl From<Vec<Arc<str>>> for EventTypes {
    fn from(ts: Vec<Arc<str>>) -> Self {
        Self(ts)
    }
}

impl From<&[&str]> for EventTypes {
    fn from(ts: &[&str]) -> Self {
        Self(ts.iter().copied().map(Arc::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EventTypes {
    fn from(ts: [&str; N]) -> Self {
        Self(ts.into_iter().map(Arc::from).collect())
    }
}

impl From<&EventTypes> for EventTypes {
    fn from(ts: &EventTypes) -> Self {
        ts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_increases() {
        let a = Event::new("a");
        let b = Event::new("b");
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_payload_downcast() {
        let ev = Event::new("progress").with_data(String::from("50%"));
        assert_eq!(ev.data::<String>().map(String::as_str), Some("50%"));
        assert!(ev.data::<u32>().is_none());
    }

    #[test]
    fn test_type_validity() {
        assert!(EventTypes::from("play").is_valid());
        assert!(EventTypes::from(["play", "pause"]).is_valid());
        assert!(!EventTypes::from("").is_valid());
        assert!(!EventTypes::from("  \t").is_valid());
        assert!(!EventTypes::from(Vec::<&str>::new()).is_valid());
        assert!(!EventTypes::from(vec!["play", " "]).is_valid());
    }

    #[test]
    fn test_types_contains() {
        let ts = EventTypes::from(vec!["a", "b"]);
        assert!(ts.contains("b"));
        assert!(!ts.contains("c"));
        assert_eq!(ts.len(), 2);
    }
}
