use anyhow::Context;

use autobp_lib::config::app_data_dir;
use autobp_lib::{logging, App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let data_dir = app_data_dir().context("failed to resolve data directory")?;
  let _log_guard = logging::init(Some(&data_dir));

  tracing::info!("AutoBP {} starting", env!("CARGO_PKG_VERSION"));
  let app = App::startup().context("failed to start")?;

  let config = app.config();
  tracing::info!(
    auto_accept = config.auto_accept_enabled,
    preselect = config.preselect_enabled,
    auto_ban = config.auto_ban_enabled,
    auto_pick = config.auto_pick_enabled,
    "Automation settings loaded from {}",
    app.data_dir().display()
  );

  tokio::signal::ctrl_c()
    .await
    .context("failed to listen for ctrl-c")?;

  app.shutdown();
  Ok(())
}
