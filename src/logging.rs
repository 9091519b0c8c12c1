//! Log setup for both drivers.
//!
//! The terminal belongs to the TUI while it runs, so interactive sessions
//! log to a file. Headless commands log to stderr. `RUST_LOG` overrides the
//! default level either way.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Default log file: `<cache dir>/ringflow/ringflow.log`.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("ringflow").join("ringflow.log"))
}

/// Open (append) the log file, creating parent directories as needed.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Send logs to `path`. Safe to call once per process; later calls are
/// ignored.
pub fn init_file(path: &Path) -> io::Result<()> {
    let file = open_log_file(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

/// Send logs to stderr. Quiet unless `RUST_LOG` asks for more than warnings.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(io::stderr)
        .try_init();
}
