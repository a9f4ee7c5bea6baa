// Types and constants shared across the LCU connector

use base64::{engine::general_purpose, Engine};
use serde::Serialize;
use std::fmt;

pub const LCU_HOST: &str = "127.0.0.1";
pub const LCU_PRINCIPAL: &str = "riot";

pub const GAMEFLOW_PHASE_PATH: &str = "/lol-gameflow/v1/gameflow-phase";
pub const READY_CHECK_PATH: &str = "/lol-matchmaking/v1/ready-check";
pub const READY_CHECK_ACCEPT_PATH: &str = "/lol-matchmaking/v1/ready-check/accept";
pub const CHAMP_SELECT_SESSION_PATH: &str = "/lol-champ-select/v1/session";
pub const LOBBY_PATH: &str = "/lol-lobby/v2/lobby";
pub const CURRENT_SUMMONER_PATH: &str = "/lol-summoner/v1/current-summoner";
pub const RANKED_STATS_PATH: &str = "/lol-ranked/v1/current-ranked-stats";

/// Ranked solo/duo queue
pub const RANKED_SOLO_QUEUE_ID: u32 = 420;

pub fn champ_select_action_path(action_id: i64) -> String {
  format!("{}/actions/{}", CHAMP_SELECT_SESSION_PATH, action_id)
}

/// Connection details for one running client. Replaced wholesale on reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub host: String,
  pub port: u16,
  pub token: String,
  pub scheme: String,
}

impl Credentials {
  pub fn new(port: u16, token: impl Into<String>) -> Self {
    Self {
      host: LCU_HOST.to_string(),
      port,
      token: token.into(),
      scheme: "https".to_string(),
    }
  }

  pub fn base_url(&self) -> String {
    format!("{}://{}:{}", self.scheme, self.host, self.port)
  }

  pub fn ws_url(&self) -> String {
    let scheme = if self.scheme == "http" { "ws" } else { "wss" };
    format!("{}://{}:{}/", scheme, self.host, self.port)
  }

  pub fn auth_header(&self) -> String {
    let auth = general_purpose::STANDARD.encode(format!("{}:{}", LCU_PRINCIPAL, self.token));
    format!("Basic {}", auth)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
  Disconnected,
  Connecting,
  Connected,
}

/// Coarse client state as reported by the gameflow-phase resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GamePhase {
  #[default]
  Unknown,
  Lobby,
  Matchmaking,
  ReadyCheck,
  ChampSelect,
  Other(String),
}

impl GamePhase {
  pub fn parse(raw: &str) -> Self {
    match raw {
      "Lobby" => Self::Lobby,
      "Matchmaking" => Self::Matchmaking,
      "ReadyCheck" => Self::ReadyCheck,
      "ChampSelect" => Self::ChampSelect,
      other => Self::Other(other.to_string()),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Unknown => "unknown",
      Self::Lobby => "Lobby",
      Self::Matchmaking => "Matchmaking",
      Self::ReadyCheck => "ReadyCheck",
      Self::ChampSelect => "ChampSelect",
      Self::Other(raw) => raw,
    }
  }

  /// Phases in which a fresh queue cycle starts and all per-match memory is dropped.
  pub fn is_queue_phase(&self) -> bool {
    matches!(self, Self::Lobby | Self::Matchmaking | Self::ReadyCheck)
  }
}

impl fmt::Display for GamePhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Point-in-time view of the connector for outside callers.
#[derive(Debug, Clone, Serialize)]
pub struct LcuStatus {
  pub connected: bool,
  pub client_status: String,
  pub champ_select: Option<serde_json::Value>,
}

impl LcuStatus {
  pub fn disconnected() -> Self {
    Self {
      connected: false,
      client_status: "Disconnected".to_string(),
      champ_select: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_credentials_urls_and_auth() {
    let creds = Credentials::new(51234, "abc");
    assert_eq!(creds.base_url(), "https://127.0.0.1:51234");
    assert_eq!(creds.ws_url(), "wss://127.0.0.1:51234/");
    // base64("riot:abc")
    assert_eq!(creds.auth_header(), "Basic cmlvdDphYmM=");
  }

  #[test]
  fn test_game_phase_parse_keeps_unknown_names() {
    assert_eq!(GamePhase::parse("ChampSelect"), GamePhase::ChampSelect);
    assert_eq!(
      GamePhase::parse("InProgress"),
      GamePhase::Other("InProgress".to_string())
    );
    assert_eq!(GamePhase::parse("InProgress").as_str(), "InProgress");
    assert!(GamePhase::ReadyCheck.is_queue_phase());
    assert!(!GamePhase::ChampSelect.is_queue_phase());
  }

  #[test]
  fn test_action_path() {
    assert_eq!(
      champ_select_action_path(7),
      "/lol-champ-select/v1/session/actions/7"
    );
  }
}
