//! # Example: cross_object
//!
//! A control bar listens to a player it does not own. Disposing either side
//! unhooks the relationship on both.
//!
//! Demonstrates how to:
//! - Grant the capability to a host type with [`evented`].
//! - Queue setup with [`add_evented_callback`] before the host is evented.
//! - Listen across objects with `on_target` / `one_target` / `any_target`.
//! - Observe events with the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! Player (host) ──► evented() ──► queued callbacks run
//! ControlBar.on_target(player, "timeupdate")
//! ControlBar.one_target(player, "loadedmetadata")
//! ControlBar.any_target(player, ["ended", "error"])
//!     ├─► player.trigger(...) ──► control bar listeners (context: control bar)
//!     └─► control_bar.dispose() ──► player no longer carries its listeners
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example cross_object --features logging
//! ```

use std::time::Duration;

use evented::{
    Eventable, Evented, EventedConfig, EventedSlot, Listener, LogWriter, add_evented_callback,
    evented,
};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Player {
    slot: EventedSlot,
}

impl Eventable for Player {
    fn evented_slot(&self) -> &EventedSlot {
        &self.slot
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let player = Player::default();
    add_evented_callback(&player, |ev| {
        println!("[player] evented as object {}", ev.id());
    });

    let ev = evented(&player, &EventedConfig::default().with_bus_label("player"))?;
    let log = LogWriter::named("player");
    log.attach(&ev, ["timeupdate", "loadedmetadata", "ended", "dispose"])?;

    let control_bar = Evented::with_config(&EventedConfig::default().with_bus_label("control-bar"));

    let on_time = Listener::new(|bar, e| {
        let t = e.data::<f64>().copied().unwrap_or_default();
        println!("[control-bar #{}] time={t:.1}s", bar.id());
    });
    let on_meta = Listener::new(|bar, _e| {
        println!("[control-bar #{}] metadata loaded", bar.id());
    });
    let on_end = Listener::new(|bar, e| {
        println!("[control-bar #{}] finished with {:?}", bar.id(), e.event_type());
    });

    control_bar.on_target(&ev, "timeupdate", &on_time)?;
    control_bar.one_target(&ev, "loadedmetadata", &on_meta)?;
    control_bar.any_target(&ev, ["ended", "error"], &on_end)?;
    println!("[player] links={}", ev.links().len());

    ev.trigger("loadedmetadata");
    ev.trigger("loadedmetadata");
    for t in [0.0, 0.5, 1.0] {
        ev.trigger_with("timeupdate", t);
    }
    ev.trigger("ended");
    println!("[player] links={}", ev.links().len());

    control_bar.dispose();
    ev.trigger_with("timeupdate", 1.5);
    println!(
        "[player] links={} timeupdate listeners={}",
        ev.links().len(),
        ev.listener_count("timeupdate")
    );

    ev.dispose();
    tokio::time::sleep(Duration::from_millis(10)).await;
    println!("[player] live={}", ev.is_live());
    Ok(())
}
