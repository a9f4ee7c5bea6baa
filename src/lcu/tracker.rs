// Follows the gameflow phase and the champ select session, and drives the automation

use reqwest::Method;
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::executor::ActionExecutor;
use super::ledger::ActionLedger;
use super::policy::{Decision, PolicyEngine, PolicySource};
use super::session::ChampSelectSession;
use super::transport::LcuApi;
use super::types::{GamePhase, CHAMP_SELECT_SESSION_PATH};

/// Work spawned while handling one event. The read loop detaches these; tests await them.
pub type Dispatched = Vec<JoinHandle<bool>>;

pub struct PhaseTracker {
  api: Arc<dyn LcuApi>,
  policy: Arc<dyn PolicySource>,
  ledger: Arc<ActionLedger>,
  executor: ActionExecutor,
  session: RwLock<Option<ChampSelectSession>>,
}

impl PhaseTracker {
  pub fn new(api: Arc<dyn LcuApi>, policy: Arc<dyn PolicySource>) -> Self {
    let ledger = Arc::new(ActionLedger::new());
    let executor = ActionExecutor::new(api.clone(), ledger.clone());
    Self {
      api,
      policy,
      ledger,
      executor,
      session: RwLock::new(None),
    }
  }

  pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
    self.executor = self.executor.with_settle_delay(settle_delay);
    self
  }

  pub fn ledger(&self) -> &ActionLedger {
    &self.ledger
  }

  pub fn phase(&self) -> GamePhase {
    self.ledger.phase()
  }

  fn read_session(&self) -> RwLockReadGuard<'_, Option<ChampSelectSession>> {
    self
      .session
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  pub fn session(&self) -> Option<ChampSelectSession> {
    self.read_session().clone()
  }

  /// Raw session object for status queries.
  pub fn session_raw(&self) -> Option<Value> {
    self.read_session().as_ref().map(|s| s.raw.clone())
  }

  fn store_session(&self, session: Option<ChampSelectSession>) {
    let mut guard = self
      .session
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = session;
  }

  /// Forgets everything tied to the previous connection.
  pub fn reset(&self) {
    self.store_session(None);
    self.ledger.advance(GamePhase::Unknown);
  }

  /// Moves to `phase`. Returns false when it was already current.
  pub fn set_phase(&self, phase: GamePhase) -> bool {
    if self.ledger.phase() == phase {
      return false;
    }
    tracing::info!("Game phase changed to: {}", phase);
    self.ledger.advance(phase.clone());
    if phase != GamePhase::ChampSelect {
      self.store_session(None);
    }
    true
  }

  pub fn handle_ready_check(&self, data: &Value) -> Option<JoinHandle<bool>> {
    if !is_ready_signal(data) {
      return None;
    }
    if !self.policy.policy().auto_accept_enabled {
      return None;
    }

    let version = self.ledger.version();
    if self.ledger.phase() != GamePhase::ReadyCheck {
      tracing::debug!("ready check event outside the ReadyCheck phase");
      return None;
    }
    if !self.ledger.try_mark_ready_check_accepted() {
      return None;
    }

    Some(self.executor.spawn_ready_check_accept(version))
  }

  pub async fn handle_gameflow_phase(&self, data: &Value) -> Dispatched {
    let Some(raw) = data.as_str() else {
      return Vec::new();
    };
    let phase = GamePhase::parse(raw);
    if !self.set_phase(phase.clone()) {
      return Vec::new();
    }

    if phase == GamePhase::ChampSelect {
      return self.seed_champ_select().await;
    }
    Vec::new()
  }

  /// Fetches the session once on entry, since the first push may have been missed.
  async fn seed_champ_select(&self) -> Dispatched {
    match self
      .api
      .request(Method::GET, CHAMP_SELECT_SESSION_PATH, None)
      .await
    {
      Ok(session) => self.handle_champ_select_session(&session).await,
      Err(e) => {
        tracing::error!("Failed to get champ select details: {}", e);
        Vec::new()
      }
    }
  }

  pub async fn handle_champ_select_session(&self, data: &Value) -> Dispatched {
    let phase = self.ledger.phase();
    if !matches!(phase, GamePhase::ChampSelect | GamePhase::Unknown) {
      tracing::debug!("ignoring champ select session during {}", phase);
      return Vec::new();
    }

    let Some(session) = ChampSelectSession::decode(data) else {
      return Vec::new();
    };
    for issue in &session.issues {
      tracing::debug!(path = %issue.path, "unexpected type in champ select session");
    }
    self.store_session(Some(session.clone()));

    if session.local_cell().is_none() {
      return Vec::new();
    }

    let version = self.ledger.version();
    let policy = self.policy.policy();
    let decisions = PolicyEngine::new(&self.ledger).evaluate(&session, &policy);

    let mut dispatched = Vec::new();
    for decision in decisions {
      match decision {
        Decision::Preselect {
          action_id,
          champion_id,
        } => {
          self
            .executor
            .preselect(version, action_id, champion_id)
            .await;
        }
        Decision::Ban { .. } | Decision::Pick { .. } => {
          dispatched.push(self.executor.spawn_completion(version, decision));
        }
      }
    }
    dispatched
  }
}

/// `true`, or an in-progress ready check the player has not answered yet.
pub fn is_ready_signal(data: &Value) -> bool {
  match data {
    Value::Bool(ready) => *ready,
    Value::Object(obj) => {
      let in_progress = obj.get("state").and_then(Value::as_str) == Some("InProgress");
      let unanswered = match obj.get("playerResponse") {
        None | Some(Value::Null) => true,
        Some(response) => response.as_str() == Some("None"),
      };
      in_progress && unanswered
    }
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lcu::error::{LcuError, LcuResult};
  use crate::lcu::policy::AutomationPolicy;
  use async_trait::async_trait;
  use serde_json::json;

  struct OfflineApi;

  #[async_trait]
  impl LcuApi for OfflineApi {
    async fn request(&self, _: Method, _: &str, _: Option<Value>) -> LcuResult<Value> {
      Err(LcuError::NotConnected)
    }
  }

  #[test]
  fn test_session_survives_poisoned_lock() {
    let tracker = Arc::new(PhaseTracker::new(
      Arc::new(OfflineApi),
      Arc::new(AutomationPolicy::default()),
    ));
    let raw = json!({"localPlayerCellId": 2, "myTeam": [], "actions": []});
    tracker.store_session(ChampSelectSession::decode(&raw));

    let holder = tracker.clone();
    let panicked = std::thread::spawn(move || {
      let _guard = holder.session.write().unwrap();
      panic!("writer died holding the session lock");
    })
    .join();
    assert!(panicked.is_err());
    assert!(tracker.session.is_poisoned());

    assert!(tracker.session().is_some());
    assert_eq!(tracker.session_raw(), Some(raw));

    tracker.reset();
    assert!(tracker.session().is_none());
    assert!(tracker.session_raw().is_none());
  }

  #[test]
  fn test_ready_signal_shapes() {
    assert!(is_ready_signal(&json!(true)));
    assert!(!is_ready_signal(&json!(false)));
    assert!(is_ready_signal(&json!({"state": "InProgress"})));
    assert!(is_ready_signal(
      &json!({"state": "InProgress", "playerResponse": "None"})
    ));
    assert!(!is_ready_signal(
      &json!({"state": "InProgress", "playerResponse": "Accepted"})
    ));
    assert!(!is_ready_signal(&json!({"state": "Invalid"})));
    assert!(!is_ready_signal(&json!("InProgress")));
    assert!(!is_ready_signal(&Value::Null));
  }
}
