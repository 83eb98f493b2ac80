//! Evented core: objects, relationships and the capability installer.
//!
//! The public API from this module is [`Evented`] plus the host-facing
//! pieces ([`Eventable`], [`EventedSlot`], [`evented()`], [`is_evented`],
//! [`add_evented_callback`]).
//!
//! Internal modules:
//! - `evented`: the handle, `on`/`one`/`any`/`off`/`trigger` and dispose coupling;
//! - [`args`]: validation and normalization of subscription arguments;
//! - [`links`]: per-object relationship table;
//! - [`target`]: listen targets (bus node or evented object);
//! - [`detect`]: host capability, detection, deferred callbacks;
//! - [`install`]: the `evented(host, config)` installer;
//! - [`release`]: post-dispose bus release scheduling.

mod args;
mod detect;
mod evented;
mod install;
mod links;
mod release;
mod target;

pub use detect::{Eventable, EventedSlot, MaybeEvented, add_evented_callback, is_evented};
pub use evented::{Evented, WeakEvented};
pub use install::evented;
pub use links::{Link, Peer, PeerKey, Role};
pub use target::Target;
