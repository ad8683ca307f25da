//! Structured logging setup using `tracing-subscriber`.
//!
//! The pipe normally lives inside a host process that owns the global
//! subscriber, so the library never installs one itself. The harness binary
//! calls [`init`] for console output on stderr, controlled by `RUST_LOG`
//! (default: `info`).

use tracing_subscriber::EnvFilter;

/// Initialise console logging for the harness binary.
///
/// Emits human-readable output to stderr only. Controlled by `RUST_LOG`
/// (default: `info`).
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
