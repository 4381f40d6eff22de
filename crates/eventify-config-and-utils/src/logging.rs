//! Logging initialization.
//!
//! Thin wrapper over the observability crate so binaries only pass a service
//! name and level.

use crate::Paths;
use observability::LogConfig;

/// Initialize the logging system.
///
/// Writes JSONL to `~/.eventify/logs/eventify.jsonl` (or under the given
/// paths) and mirrors to stderr when `also_stderr` is set. `RUST_LOG` takes
/// precedence over `level`.
pub fn init_logging(service_name: &str, level: &str, paths: Option<&Paths>, also_stderr: bool) {
    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        log_path: paths.map(Paths::log_file),
        also_stderr,
    });
}
