// Application wiring: config, champion catalog and the LCU connection

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::champions::{CatalogError, Champion, ChampionCatalog, CHAMPIONS_FILE};
use crate::config::{app_data_dir, AutomationConfig, ConfigError, ConfigStore};
use crate::lcu::{LcuConnector, LcuError, LcuStatus, LockfileProvider};

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error(transparent)]
  Catalog(#[from] CatalogError),
  #[error(transparent)]
  Lcu(#[from] LcuError),
}

pub type AppResult<T> = Result<T, AppError>;

pub struct App {
  data_dir: PathBuf,
  config: Arc<ConfigStore>,
  catalog: Arc<ChampionCatalog>,
  connector: RwLock<Option<Arc<LcuConnector>>>,
}

impl App {
  /// Loads config and the cached champion list from `data_dir`. Starts no background work.
  pub fn new(data_dir: &Path) -> AppResult<Self> {
    let config = Arc::new(ConfigStore::open_or_default(data_dir));

    let catalog = ChampionCatalog::new(data_dir.join(CHAMPIONS_FILE))?;
    if let Err(e) = catalog.load() {
      tracing::error!("Failed to load champions: {}", e);
    }

    Ok(Self {
      data_dir: data_dir.to_path_buf(),
      config,
      catalog: Arc::new(catalog),
      connector: RwLock::new(None),
    })
  }

  /// Full startup in the default data directory: refreshes champions and connects to the
  /// client in the background.
  pub fn startup() -> AppResult<Self> {
    let data_dir = app_data_dir()?;
    let app = Self::new(&data_dir)?;

    let catalog = app.catalog.clone();
    tokio::spawn(async move {
      catalog.update_if_needed().await;
    });

    app.reconnect()?;
    Ok(app)
  }

  pub fn data_dir(&self) -> &Path {
    &self.data_dir
  }

  fn connector(&self) -> Option<Arc<LcuConnector>> {
    self
      .connector
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }

  fn require_connector(&self) -> AppResult<Arc<LcuConnector>> {
    self.connector().ok_or(AppError::Lcu(LcuError::NotConnected))
  }

  pub fn status(&self) -> LcuStatus {
    self
      .connector()
      .map(|lcu| lcu.status())
      .unwrap_or_else(LcuStatus::disconnected)
  }

  /// Drops the current connection, if any, and connects again in the background.
  pub fn reconnect(&self) -> AppResult<()> {
    let provider = LockfileProvider::new(self.config.league_path().as_deref());
    let lcu = Arc::new(LcuConnector::new(Box::new(provider), self.config.clone())?);

    let previous = self
      .connector
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .replace(lcu.clone());
    if let Some(previous) = previous {
      previous.disconnect();
    }

    tokio::spawn(async move {
      if let Err(e) = lcu.connect().await {
        tracing::warn!("Failed to connect to LCU: {}", e);
      }
    });
    Ok(())
  }

  pub async fn start_ranked_queue(&self) -> AppResult<Value> {
    let lcu = self.require_connector()?;
    let lobby = lcu.start_ranked_queue().await?;
    tracing::info!("Ranked lobby created");
    Ok(lobby)
  }

  /// Leaves the lobby, returning the client to its main screen.
  pub async fn go_to_main_menu(&self) -> AppResult<()> {
    let lcu = self.require_connector()?;
    lcu.leave_lobby().await?;
    Ok(())
  }

  pub fn config(&self) -> AutomationConfig {
    self.config.get()
  }

  pub fn save_config(&self, partial: &Value) -> AppResult<()> {
    self.config.update(partial)?;
    Ok(())
  }

  pub fn champions(&self) -> Vec<Champion> {
    self.catalog.champions()
  }

  pub fn shutdown(&self) {
    let connector = self
      .connector
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .take();
    if let Some(lcu) = connector {
      lcu.disconnect();
    }
    tracing::info!("Shut down");
  }
}
