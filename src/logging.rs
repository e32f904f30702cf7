// SPDX-License-Identifier: MIT
//
// Logging setup.
//
// The player owns the terminal, so nothing may be logged to it. Events go
// to a file instead: $RECITAL_LOG_DIR/recital.log, or the temp dir. The
// filter comes from RUST_LOG when set.

use std::path::PathBuf;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "recital=info,recital_stage=info,warn";

/// Where the log file goes.
pub fn log_dir() -> PathBuf {
    std::env::var_os("RECITAL_LOG_DIR").map_or_else(std::env::temp_dir, PathBuf::from)
}

/// Install the global subscriber. Keep the guard alive until exit or the
/// last events are lost.
pub fn init() -> WorkerGuard {
    let dir = log_dir();
    let appender = tracing_appender::rolling::never(&dir, "recital.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    info!("recital {} logging to {}/recital.log", env!("CARGO_PKG_VERSION"), dir.display());
    guard
}
