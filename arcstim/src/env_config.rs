//! Shared environment configuration for the arcstim binaries.
//!
//! Consolidates `ARCSTIM_BASE_PATH` and `ARCSTIM_LOG` reads. Everything else
//! is configured through command-line flags or a JSON config file.

use std::path::{Path, PathBuf};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const BASE_PATH_VAR: &str = "ARCSTIM_BASE_PATH";
pub const LOG_VAR: &str = "ARCSTIM_LOG";
const DEFAULT_LOG_FILTER: &str = "arcstim=info";

/// Read `ARCSTIM_BASE_PATH` (default `"."`).
pub fn base_path() -> PathBuf {
    let base = std::env::var(BASE_PATH_VAR).unwrap_or_else(|_| ".".to_string());
    PathBuf::from(base)
}

/// Resolve a relative path against [`base_path`]; absolute paths pass through.
pub fn resolve(path: &Path) -> PathBuf {
    resolve_against(&base_path(), path)
}

pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Install a stderr subscriber filtered by `ARCSTIM_LOG` (default
/// `arcstim=info`). Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
