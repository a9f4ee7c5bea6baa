// Issues the mutating champ select and ready-check requests

use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::ledger::ActionLedger;
use super::policy::Decision;
use super::transport::LcuApi;
use super::types::{champ_select_action_path, GamePhase, READY_CHECK_ACCEPT_PATH};

/// Pause before locking in a ban or pick, so the client has settled the turn.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct ActionExecutor {
  api: Arc<dyn LcuApi>,
  ledger: Arc<ActionLedger>,
  settle_delay: Duration,
}

impl ActionExecutor {
  pub fn new(api: Arc<dyn LcuApi>, ledger: Arc<ActionLedger>) -> Self {
    Self {
      api,
      ledger,
      settle_delay: SETTLE_DELAY,
    }
  }

  pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
    self.settle_delay = settle_delay;
    self
  }

  pub fn ledger(&self) -> &Arc<ActionLedger> {
    &self.ledger
  }

  /// PATCHes one action. Failures are logged and reported as `false`; nothing is retried.
  pub async fn patch_action(&self, action_id: i64, champion_id: i64, completed: bool) -> bool {
    let body = json!({
      "championId": champion_id,
      "completed": completed,
    });
    match self
      .api
      .request(Method::PATCH, &champ_select_action_path(action_id), Some(body))
      .await
    {
      Ok(_) => true,
      Err(e) => {
        tracing::warn!(
          action_id,
          champion_id,
          completed,
          "champ select action failed: {}",
          e
        );
        false
      }
    }
  }

  /// Hovers the champion and records it for the epoch `version` on success.
  pub async fn preselect(&self, version: u64, action_id: i64, champion_id: i64) -> bool {
    if !self.patch_action(action_id, champion_id, false).await {
      return false;
    }
    if self.ledger.record_preselect(version, action_id, champion_id) {
      tracing::info!("Preselected champion {} (action {})", champion_id, action_id);
      true
    } else {
      tracing::debug!(action_id, "preselect landed after the phase changed");
      false
    }
  }

  /// Waits the settle delay, then locks in a ban or pick unless the epoch moved on.
  pub fn spawn_completion(&self, version: u64, decision: Decision) -> JoinHandle<bool> {
    let executor = self.clone();
    tokio::spawn(async move {
      tokio::time::sleep(executor.settle_delay).await;

      if executor.ledger.version() != version {
        tracing::info!(
          action_id = decision.action_id(),
          "phase changed before lock-in, dropping {:?}",
          decision
        );
        return false;
      }

      let done = executor
        .patch_action(decision.action_id(), decision.champion_id(), true)
        .await;
      if done {
        match decision {
          Decision::Ban { champion_id, .. } => tracing::info!("Banned champion {}", champion_id),
          Decision::Pick { champion_id, .. } => tracing::info!("Picked champion {}", champion_id),
          Decision::Preselect { .. } => {}
        }
      }
      done
    })
  }

  /// Accepts the ready check as long as the client is still in the phase it was offered in.
  pub fn spawn_ready_check_accept(&self, version: u64) -> JoinHandle<bool> {
    let executor = self.clone();
    tokio::spawn(async move {
      if executor.ledger.version() != version || executor.ledger.phase() != GamePhase::ReadyCheck {
        tracing::debug!("ready check went away before accepting");
        return false;
      }

      match executor
        .api
        .request(Method::POST, READY_CHECK_ACCEPT_PATH, None)
        .await
      {
        Ok(_) => {
          tracing::info!("Match accepted");
          true
        }
        Err(e) => {
          tracing::warn!("failed to accept match: {}", e);
          false
        }
      }
    })
  }
}
