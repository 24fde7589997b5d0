//! Diagnostic output on stderr.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::{prelude::*, registry};

/// Install the global subscriber. `RUST_LOG` can raise verbosity; the
/// default is one line per device action. No timestamps, systemd adds them.
pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(env_filter);

    registry().with(fmt_layer).init();
}
