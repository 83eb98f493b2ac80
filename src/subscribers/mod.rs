//! # Built-in listeners.
//!
//! Ready-made listeners for observing evented objects. Only [`LogWriter`] for
//! now, behind the `logging` feature.
//!
//! ```text
//!   ev.trigger("play") ──► EventBus ──► user listeners
//!                                  └──► LogWriter ──► tracing::info!
//! ```

mod log;

pub use log::LogWriter;
