//! Floor timeline
//!
//! An interactive event and floor-segment timeline kept in sync with an
//! embedded video player, plus the proxy that looks up video durations.

pub mod constants;
pub mod core;
pub mod proxy;
pub mod state;
pub mod utils;

/// Install the `tracing` subscriber shared by both binaries. `RUST_LOG`
/// overrides the default `info` level.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
