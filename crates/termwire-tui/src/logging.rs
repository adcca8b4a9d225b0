//! Log setup for the terminal shell.
//!
//! The terminal runs in raw mode and every byte on stdout belongs to the
//! session, so logs only ever go to a file.

use std::{fs::OpenOptions, io, path::Path};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a file logger.
///
/// `RUST_LOG` takes precedence over `level`. Keep the returned guard alive
/// for as long as logs should be flushed.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened for appending.
pub fn init_file(path: &Path, level: &str) -> io::Result<WorkerGuard> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}
