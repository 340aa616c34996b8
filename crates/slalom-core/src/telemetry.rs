//! Tracing subscriber setup for the `slalom` binary.
//!
//! Log lines go to stderr; stdout carries command output.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter from `RUST_LOG` when set and parseable, else `level` for every target.
fn default_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber, plain text or newline-delimited JSON.
/// Only the first call in a process has an effect.
pub fn init_tracing(json: bool, level: Level) {
    let plain = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });
    let structured = json.then(|| fmt::layer().with_writer(std::io::stderr).json());

    tracing_subscriber::registry()
        .with(default_filter(level))
        .with(plain)
        .with(structured)
        .try_init()
        .ok();
}
