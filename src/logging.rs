//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding per-module log levels.
pub const LOG_ENV_VAR: &str = "SYS_HEALTH_LOG";

/// Filter used when neither the environment nor the config file sets one.
pub const DEFAULT_FILTER: &str = "sys_health=info";

static INIT: Once = Once::new();

/// Installs the global subscriber writing to stderr.
///
/// `SYS_HEALTH_LOG` (e.g. `SYS_HEALTH_LOG=sys_health::collectors=debug`)
/// wins over `default_filter`; an invalid value falls back to it.
/// Only the first call has any effect.
pub fn init_tracing(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .init();
    });
}
