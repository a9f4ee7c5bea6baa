// Persisted automation settings

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::lcu::policy::{AutomationPolicy, PolicySource};

pub const POSITIONS: [&str; 5] = ["TOP", "JUNGLE", "MIDDLE", "BOTTOM", "UTILITY"];
const CONFIG_FILE: &str = "config.json";
const DATA_DIR_ENV: &str = "AUTOBP_DATA_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("could not resolve a data directory")]
  NoDataDir,
  #[error("config IO error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("invalid config: {0}")]
  Parse(#[from] serde_json::Error),
  #[error("config update must be a JSON object")]
  NotAnObject,
}

const DATA_DIR_NAME: &str = "AutoBP.exe";

/// Directory holding config.json, champions.json and logs.
/// `AUTOBP_DATA_DIR` wins, then `%APPDATA%\AutoBP.exe`, then `AutoBP.exe` under the home dir.
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
  let dir = resolve_data_dir(|k: &str| std::env::var_os(k)).ok_or(ConfigError::NoDataDir)?;
  fs::create_dir_all(&dir).map_err(|source| ConfigError::Io {
    path: dir.clone(),
    source,
  })?;
  Ok(dir)
}

fn resolve_data_dir(lookup: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
  let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
  if let Some(dir) = var(DATA_DIR_ENV) {
    return Some(PathBuf::from(dir));
  }
  var("APPDATA")
    .or_else(|| var("HOME"))
    .or_else(|| var("USERPROFILE"))
    .map(|base| PathBuf::from(base).join(DATA_DIR_NAME))
}

fn default_position_champions() -> BTreeMap<String, Option<i64>> {
  POSITIONS.iter().map(|p| (p.to_string(), None)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConfig {
  #[serde(default)]
  pub auto_accept_enabled: bool,
  #[serde(default)]
  pub preselect_enabled: bool,
  #[serde(default)]
  pub auto_ban_enabled: bool,
  #[serde(default)]
  pub auto_pick_enabled: bool,
  #[serde(default)]
  pub preselect_champion_id: Option<i64>,
  #[serde(default)]
  pub auto_ban_champion_id: Option<i64>,
  #[serde(default)]
  pub auto_pick_champion_id: Option<i64>,
  #[serde(default = "default_position_champions")]
  pub position_champions: BTreeMap<String, Option<i64>>,
  #[serde(default)]
  pub league_path: Option<String>,
}

impl Default for AutomationConfig {
  fn default() -> Self {
    Self {
      auto_accept_enabled: false,
      preselect_enabled: false,
      auto_ban_enabled: false,
      auto_pick_enabled: false,
      preselect_champion_id: None,
      auto_ban_champion_id: None,
      auto_pick_champion_id: None,
      position_champions: default_position_champions(),
      league_path: None,
    }
  }
}

impl AutomationConfig {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    if !path.exists() {
      return Ok(Self::default());
    }
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let mut config: Self = serde_json::from_str(&data)?;
    config.normalize_positions();
    Ok(config)
  }

  pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    let data = serde_json::to_string_pretty(self)?;
    fs::write(path, data).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Overwrites the fields present in `partial`; position entries are merged one by one.
  pub fn update(&mut self, partial: &Value) -> Result<(), ConfigError> {
    let partial = partial.as_object().ok_or(ConfigError::NotAnObject)?;
    let mut merged = serde_json::to_value(&*self)?;
    let target = merged.as_object_mut().ok_or(ConfigError::NotAnObject)?;

    for (key, value) in partial {
      if key == "position_champions" {
        let Some(positions) = value.as_object() else {
          continue;
        };
        let slot = target
          .entry(key.clone())
          .or_insert_with(|| Value::Object(Default::default()));
        if let Some(existing) = slot.as_object_mut() {
          for (pos, champ) in positions {
            existing.insert(pos.to_uppercase(), champ.clone());
          }
        }
      } else {
        target.insert(key.clone(), value.clone());
      }
    }

    let mut updated: Self = serde_json::from_value(merged)?;
    updated.normalize_positions();
    *self = updated;
    Ok(())
  }

  /// Case-insensitive role lookup.
  pub fn champion_id_for_position(&self, position: &str) -> Option<i64> {
    self
      .position_champions
      .get(&position.trim().to_uppercase())
      .copied()
      .flatten()
  }

  fn normalize_positions(&mut self) {
    let entries = std::mem::take(&mut self.position_champions);
    for (pos, champ) in entries {
      let key = pos.to_uppercase();
      // Keep a configured value over an empty duplicate
      let slot = self.position_champions.entry(key).or_insert(None);
      if champ.is_some() {
        *slot = champ;
      }
    }
    for pos in POSITIONS {
      self.position_champions.entry(pos.to_string()).or_insert(None);
    }
  }

  pub fn policy(&self) -> AutomationPolicy {
    AutomationPolicy {
      auto_accept_enabled: self.auto_accept_enabled,
      preselect_enabled: self.preselect_enabled,
      auto_ban_enabled: self.auto_ban_enabled,
      auto_pick_enabled: self.auto_pick_enabled,
      default_preselect_champion: self.preselect_champion_id,
      default_ban_champion: self.auto_ban_champion_id,
      default_pick_champion: self.auto_pick_champion_id,
      per_position: self
        .position_champions
        .iter()
        .filter_map(|(pos, champ)| champ.map(|c| (pos.clone(), c)))
        .collect(),
    }
  }
}

/// Shared, file-backed config. The automation only ever reads snapshots.
#[derive(Debug)]
pub struct ConfigStore {
  path: PathBuf,
  config: RwLock<AutomationConfig>,
}

impl ConfigStore {
  pub fn new(path: PathBuf, config: AutomationConfig) -> Self {
    Self {
      path,
      config: RwLock::new(config),
    }
  }

  pub fn open(path: PathBuf) -> Result<Self, ConfigError> {
    let config = AutomationConfig::load(&path)?;
    Ok(Self::new(path, config))
  }

  /// Opens `config.json` in `data_dir`, falling back to defaults when it is unreadable.
  pub fn open_or_default(data_dir: &Path) -> Self {
    let path = data_dir.join(CONFIG_FILE);
    match AutomationConfig::load(&path) {
      Ok(config) => Self::new(path, config),
      Err(e) => {
        tracing::error!("failed to load config, using defaults: {}", e);
        Self::new(path, AutomationConfig::default())
      }
    }
  }


  pub fn path(&self) -> &Path {
    &self.path
  }

  fn read(&self) -> RwLockReadGuard<'_, AutomationConfig> {
    self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn write(&self) -> RwLockWriteGuard<'_, AutomationConfig> {
    self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  pub fn get(&self) -> AutomationConfig {
    self.read().clone()
  }

  pub fn league_path(&self) -> Option<String> {
    self.read().league_path.clone()
  }

  /// Applies a partial update and persists the result.
  pub fn update(&self, partial: &Value) -> Result<(), ConfigError> {
    let snapshot = {
      let mut config = self.write();
      config.update(partial)?;
      config.clone()
    };
    snapshot.save(&self.path)?;
    tracing::info!("configuration saved to {}", self.path.display());
    Ok(())
  }

  pub fn replace(&self, config: AutomationConfig) -> Result<(), ConfigError> {
    config.save(&self.path)?;
    *self.write() = config;
    Ok(())
  }
}

impl PolicySource for ConfigStore {
  fn policy(&self) -> AutomationPolicy {
    self.read().policy()
  }
}
