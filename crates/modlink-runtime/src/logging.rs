//! Tracing initialisation

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber driven by `RUST_LOG`
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once; only
/// the first call has any effect.
///
/// ```text
/// RUST_LOG=modlink_engine=trace,modlink_runtime=debug
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
