//! # evented
//!
//! **Evented** grants any object a publish/subscribe interface
//! (`on`, `one`, `any`, `off`, `trigger`) and wires listeners between objects
//! so that tearing down either side never leaks or double-fires a listener.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Player    │   │  Component   │   │   Evented    │
//!     │ (Eventable)  │   │ (Eventable)  │   │ (standalone) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  │
//!     ┌─────────────────────────────────────┐      │
//!     │  evented(host, config)              │      │
//!     │  - EventedSlot (handle + callbacks) │      │
//!     │  - bus: allocated or host node      │      │
//!     └──────────────────┬──────────────────┘      │
//!                        ▼                         ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Evented (handle)                                                 │
//! │  - EventBus (type → [listener entries], snapshot dispatch)        │
//! │  - Links (relationship table, both sides of every coupling)       │
//! │  - dispose cleanup (first dispose listener)                       │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   on/one/any          off/off_*          trigger/dispose
//!   (validate,          (by listener       (fire, report
//!    bind, couple)       or handle)         prevent_default)
//! ```
//!
//! ### Cross-object lifecycle
//! ```text
//! A.on_target(B, "play", fn)
//!   ├─► B.bus:  "play"    ─► fn (context A)
//!   ├─► A.bus:  "dispose" ─► remove fn from B
//!   ├─► B.bus:  "dispose" ─► remove A's remover
//!   └─► A.links / B.links record the relationship
//!
//! A.dispose() ──► teardown(A.links) ──► fn and B's aux gone ──► A.bus cleared
//!                                                          └──► bus released later
//! B.dispose() ──► teardown(B.links) ──► A's aux gone, A.links updated
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                      |
//! |-------------------|------------------------------------------------------------------|-----------------------------------------|
//! | **Objects**       | Publish/subscribe handle with dispose coupling.                  | [`Evented`], [`Target`]                 |
//! | **Hosts**         | Grant the capability to your own types.                          | [`Eventable`], [`EventedSlot`], [`evented()`] |
//! | **Events**        | Event values, type lists, listeners and identity tokens.         | [`Event`], [`EventTypes`], [`Listener`] |
//! | **Dispatch**      | Primitive bus usable as a listen target on its own.              | [`EventBus`]                            |
//! | **Errors**        | Typed validation errors.                                         | [`EventedError`]                        |
//! | **Configuration** | Bus reuse, labels and release scheduling.                        | [`EventedConfig`], [`ReleaseMode`]      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use evented::{Evented, EventedConfig, Listener, ReleaseMode};
//!
//! let cfg = EventedConfig::default().with_release(ReleaseMode::AfterDispatch);
//! let (player, overlay) = (Evented::with_config(&cfg), Evented::with_config(&cfg));
//!
//! let shown = Arc::new(AtomicUsize::new(0));
//! let s = Arc::clone(&shown);
//! let on_pause = Listener::new(move |_overlay, _ev| {
//!     s.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! // The overlay listens to the player; disposing the overlay unhooks it.
//! overlay.on_target(&player, "pause", &on_pause).unwrap();
//! player.trigger("pause");
//! overlay.dispose();
//! player.trigger("pause");
//!
//! assert_eq!(shown.load(Ordering::SeqCst), 1);
//! assert!(player.links().is_empty());
//! ```
mod config;
mod core;
mod error;
mod events;

// ---- Public re-exports ----

pub use config::{Config as EventedConfig, DEFAULT_BUS_LABEL, ReleaseMode};
pub use core::{
    Eventable, Evented, EventedSlot, Link, MaybeEvented, Peer, PeerKey, Role, Target, WeakEvented,
    add_evented_callback, evented, is_evented,
};
pub use error::EventedError;
pub use events::{
    Callback, DISPOSE, EntryKey, Event, EventBus, EventTypes, Listener, ListenerId, ListenerRef,
    Payload,
};

// Optional: expose a simple built-in logger listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod subscribers;
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
