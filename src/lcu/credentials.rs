// Credential discovery for the local client API

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{LcuError, LcuResult};
use super::types::Credentials;

const LOCKFILE_NAMES: [&str; 3] = [
  "lockfile",
  "LeagueClientUx.lockfile",
  "LeagueClient.lockfile",
];

const DEFAULT_INSTALL_DIRS: [&str; 3] = [
  "C:\\Riot Games\\League of Legends",
  "C:\\Program Files\\Riot Games\\League of Legends",
  "C:\\Program Files (x86)\\Riot Games\\League of Legends",
];

/// Source of {host, port, token}. The connector asks once per connect attempt.
pub trait CredentialProvider: Send + Sync {
  fn discover(&self) -> LcuResult<Credentials>;
}

/// Fixed credentials, for callers that already know where the client listens.
pub struct StaticCredentials(pub Credentials);

impl CredentialProvider for StaticCredentials {
  fn discover(&self) -> LcuResult<Credentials> {
    Ok(self.0.clone())
  }
}

/// Reads the client's lockfile (`name:pid:port:token:protocol`) from the install directory.
pub struct LockfileProvider {
  search_dirs: Vec<PathBuf>,
}

impl LockfileProvider {
  /// Configured path first, then the usual install locations.
  pub fn new(league_path: Option<&str>) -> Self {
    let mut search_dirs = Vec::new();
    if let Some(path) = league_path.filter(|p| !p.trim().is_empty()) {
      search_dirs.push(PathBuf::from(path));
    }
    search_dirs.extend(DEFAULT_INSTALL_DIRS.iter().map(PathBuf::from));
    Self { search_dirs }
  }

  pub fn with_dirs(search_dirs: Vec<PathBuf>) -> Self {
    Self { search_dirs }
  }

  fn read_dir(dir: &Path) -> Option<Credentials> {
    for name in LOCKFILE_NAMES {
      let path = dir.join(name);
      if let Ok(content) = fs::read_to_string(&path) {
        if let Some(creds) = parse_lockfile(&content) {
          tracing::debug!(path = %path.display(), port = creds.port, "found LCU lockfile");
          return Some(creds);
        }
      }
    }
    None
  }
}

impl CredentialProvider for LockfileProvider {
  fn discover(&self) -> LcuResult<Credentials> {
    self
      .search_dirs
      .iter()
      .find_map(|dir| Self::read_dir(dir))
      .ok_or_else(|| {
        LcuError::CredentialsNotFound(
          "no valid lockfile found - League client may not be running".to_string(),
        )
      })
  }
}

pub fn parse_lockfile(content: &str) -> Option<Credentials> {
  let parts: Vec<&str> = content.trim().split(':').collect();
  if parts.len() < 5 {
    return None;
  }
  let port = parts[2].parse::<u16>().ok()?;
  let token = parts[3];
  if token.is_empty() {
    return None;
  }
  let mut creds = Credentials::new(port, token);
  if !parts[4].is_empty() {
    creds.scheme = parts[4].to_string();
  }
  Some(creds)
}
