// Tracing setup: stdout plus a live log file in the data directory

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LIVE_LOG_FILE: &str = "autobp-live.log";
const DEFAULT_FILTER: &str = "autobp=info,autobp_lib=info,warn";

/// Keeps the background log writers alive; drop it last.
pub struct LogGuard {
  _guards: Vec<WorkerGuard>,
}

pub fn logs_dir(data_dir: &Path) -> PathBuf {
  data_dir.join("logs")
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter. When `data_dir` is
/// given, everything is also appended to `logs/autobp-live.log` there.
pub fn init(data_dir: Option<&Path>) -> LogGuard {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  let mut guards = Vec::new();

  let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
  guards.push(stdout_guard);
  let stdout_layer = tracing_subscriber::fmt::layer()
    .with_writer(stdout)
    .with_target(true);

  let mut file_error = None;
  let file_layer = data_dir.and_then(|dir| {
    let dir = logs_dir(dir);
    if let Err(e) = fs::create_dir_all(&dir) {
      // Not fatal: stdout logging still works
      file_error = Some(format!("failed to create {}: {}", dir.display(), e));
      return None;
    }
    let appender = tracing_appender::rolling::never(&dir, LIVE_LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    guards.push(guard);
    Some(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true),
    )
  });

  let _ = tracing_subscriber::registry()
    .with(filter)
    .with(stdout_layer)
    .with(file_layer)
    .try_init();

  if let Some(e) = file_error {
    tracing::warn!("live log disabled: {}", e);
  }

  LogGuard { _guards: guards }
}
