// Champion names and ids from Data Dragon, cached on disk

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};
use std::time::Duration;
use thiserror::Error;

pub const DDRAGON_BASE_URL: &str = "https://ddragon.leagueoflegends.com";
pub const DEFAULT_LOCALE: &str = "zh_CN";
pub const CHAMPIONS_FILE: &str = "champions.json";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("champion cache IO error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("invalid champion data: {0}")]
  Parse(#[from] serde_json::Error),
  #[error("champion data request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Data Dragon returned HTTP {0}")]
  HttpStatus(u16),
  #[error("no versions found")]
  NoVersions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Champion {
  pub id: i64,
  pub name: String,
}

/// On-disk form: `{version, data: {key -> champion}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChampionData {
  #[serde(default)]
  pub version: String,
  #[serde(default)]
  pub data: HashMap<String, Champion>,
}

#[derive(Deserialize)]
struct DDragonChampion {
  key: String,
  name: String,
}

#[derive(Deserialize)]
struct DDragonResponse {
  data: HashMap<String, DDragonChampion>,
}

/// Converts a Data Dragon `champion.json` body. Entries whose key is not a number are skipped.
pub fn parse_ddragon_champions(body: &str) -> Result<HashMap<String, Champion>, CatalogError> {
  let response: DDragonResponse = serde_json::from_str(body)?;
  Ok(
    response
      .data
      .into_values()
      .filter_map(|champ| {
        let id = champ.key.trim().parse::<i64>().ok()?;
        Some((
          champ.key,
          Champion {
            id,
            name: champ.name,
          },
        ))
      })
      .collect(),
  )
}

pub struct ChampionCatalog {
  path: PathBuf,
  client: reqwest::Client,
  base_url: String,
  locale: String,
  data: RwLock<ChampionData>,
}

impl ChampionCatalog {
  pub fn new(path: PathBuf) -> Result<Self, CatalogError> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    Ok(Self {
      path,
      client,
      base_url: DDRAGON_BASE_URL.to_string(),
      locale: DEFAULT_LOCALE.to_string(),
      data: RwLock::new(ChampionData::default()),
    })
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
    self.locale = locale.into();
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn read(&self) -> RwLockReadGuard<'_, ChampionData> {
    self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn replace(&self, data: ChampionData) {
    *self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = data;
  }

  /// Loads the cache file. A missing file leaves the catalog empty.
  pub fn load(&self) -> Result<(), CatalogError> {
    if !self.path.exists() {
      self.replace(ChampionData::default());
      return Ok(());
    }
    let raw = fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
      path: self.path.clone(),
      source,
    })?;
    let data: ChampionData = serde_json::from_str(&raw)?;
    self.replace(data);
    Ok(())
  }

  pub fn save(&self) -> Result<(), CatalogError> {
    let raw = serde_json::to_string_pretty(&*self.read())?;
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).map_err(|source| CatalogError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    fs::write(&self.path, raw).map_err(|source| CatalogError::Io {
      path: self.path.clone(),
      source,
    })
  }

  async fn get_text(&self, url: &str) -> Result<String, CatalogError> {
    let resp = self.client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
      return Err(CatalogError::HttpStatus(status.as_u16()));
    }
    Ok(resp.text().await?)
  }

  /// Newest game version; Data Dragon lists them newest first.
  pub async fn latest_version(&self) -> Result<String, CatalogError> {
    let body = self
      .get_text(&format!("{}/api/versions.json", self.base_url))
      .await?;
    let versions: Vec<String> = serde_json::from_str(&body)?;
    versions.into_iter().next().ok_or(CatalogError::NoVersions)
  }

  pub async fn fetch(&self, version: &str) -> Result<ChampionData, CatalogError> {
    let url = format!(
      "{}/cdn/{}/data/{}/champion.json",
      self.base_url, version, self.locale
    );
    let body = self.get_text(&url).await?;
    Ok(ChampionData {
      version: version.to_string(),
      data: parse_ddragon_champions(&body)?,
    })
  }

  /// Refreshes the catalog when a newer version is out. Never fails: problems are logged and
  /// the current data stays in place. Returns whether the in-memory data changed.
  pub async fn update_if_needed(&self) -> bool {
    let latest = match self.latest_version().await {
      Ok(v) => v,
      Err(e) => {
        tracing::warn!("Failed to get latest version: {}", e);
        return false;
      }
    };

    let current = self.version();
    if current == latest {
      return false;
    }
    tracing::info!("Updating champions data from {:?} to {}", current, latest);

    let data = match self.fetch(&latest).await {
      Ok(data) => data,
      Err(e) => {
        tracing::warn!("Failed to fetch champions data: {}", e);
        return false;
      }
    };
    self.replace(data);

    if let Err(e) = self.save() {
      tracing::warn!("Failed to save champions data: {}", e);
    } else {
      tracing::info!("Champions data updated successfully");
    }
    true
  }

  pub fn version(&self) -> String {
    self.read().version.clone()
  }

  pub fn len(&self) -> usize {
    self.read().data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.read().data.is_empty()
  }

  /// All champions ordered by display name.
  pub fn champions(&self) -> Vec<Champion> {
    let mut list: Vec<Champion> = self.read().data.values().cloned().collect();
    list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    list
  }

  pub fn by_id(&self, id: i64) -> Option<Champion> {
    self.read().data.values().find(|c| c.id == id).cloned()
  }

  pub fn find_by_name(&self, name: &str) -> Option<Champion> {
    let wanted = name.trim().to_lowercase();
    self
      .read()
      .data
      .values()
      .find(|c| c.name.to_lowercase() == wanted)
      .cloned()
  }
}
