//! Error types raised by the evented capability.
//!
//! Every error here is a synchronous validation failure that signals a
//! programmer error at the call site. Nothing is bound or removed before
//! validation completes, so an `Err` always means "no state changed".
//!
//! [`EventedError`] provides helper methods (`as_label`, `as_message`) for
//! logs/metrics, in the same shape as the rest of the runtime.

use thiserror::Error;

/// # Errors produced by `on`/`one`/`any`/`off` and the installer.
///
/// None of these are retryable; they are returned to the caller unmodified.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventedError {
    /// Target is neither an event bus node nor a live evented object.
    ///
    /// Also returned when the calling object's own bus was already released.
    #[error("invalid target; must be an event bus node or a live evented object")]
    InvalidTarget,

    /// Event type is not a non-empty string nor a non-empty list of strings.
    #[error("invalid event type; must be a non-empty string or a non-empty list of strings")]
    InvalidEventType,

    /// Listener is not callable (a bare identity token was passed where a function is required).
    #[error("invalid listener; must be a callable listener")]
    InvalidListener,

    /// The configured bus key does not name an event bus node on the host.
    #[error("the event bus key {key:?} does not refer to an event bus node")]
    InvalidEventBusKey {
        /// Key that was looked up on the host.
        key: String,
    },
}

impl EventedError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use evented::EventedError;
    ///
    /// assert_eq!(EventedError::InvalidListener.as_label(), "invalid_listener");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EventedError::InvalidTarget => "invalid_target",
            EventedError::InvalidEventType => "invalid_event_type",
            EventedError::InvalidListener => "invalid_listener",
            EventedError::InvalidEventBusKey { .. } => "invalid_event_bus_key",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EventedError::InvalidTarget => "target: not a bus node or live evented object".into(),
            EventedError::InvalidEventType => "event type: empty or blank".into(),
            EventedError::InvalidListener => "listener: not callable".into(),
            EventedError::InvalidEventBusKey { key } => format!("event bus key: {key:?} missing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(EventedError::InvalidTarget.as_label(), "invalid_target");
        assert_eq!(EventedError::InvalidEventType.as_label(), "invalid_event_type");
        assert_eq!(
            EventedError::InvalidEventBusKey { key: "el".into() }.as_label(),
            "invalid_event_bus_key"
        );
    }

    #[test]
    fn test_bus_key_error_names_the_key() {
        let err = EventedError::InvalidEventBusKey { key: "video".into() };
        assert!(err.to_string().contains("\"video\""));
        assert!(err.as_message().contains("video"));
    }
}
