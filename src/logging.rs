//! Diagnostic tracing for switchboard.
//!
//! Everything goes to stderr so stdout carries only conversation output.
//! Filtered by `RUST_LOG`, e.g. `RUST_LOG=switchboard=debug` to follow each
//! provider round-trip and tool dispatch.

use std::io::IsTerminal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Defaults to `warn` when `RUST_LOG` is unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .compact(),
        )
        .init();
}
