//! # Logging
//!
//! Log output goes through `tracing`, printed to the console by
//! `tracing_subscriber::fmt`. Verbosity follows `RUST_LOG` and defaults to
//! `info`:
//!
//! ```bash
//! RUST_LOG=sfid=trace,sfid_server=debug cargo run -p sfid-server
//! ```
//!
//! At `trace`, every generated ID gets a span carrying the worker and
//! datacenter ids. Clock rollbacks are logged at `debug` (waited out) or
//! `warn` (backup worker id, or refused).

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;

    Ok(())
}
