// Decides which champ select action is due for a session snapshot

use std::collections::HashMap;

use super::ledger::{ActionKey, ActionLedger, Purpose, WarningKey};
use super::session::{ActionKind, ChampSelectSession, TimerPhase};

/// Read-only view of the user's automation settings, taken once per decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationPolicy {
  pub auto_accept_enabled: bool,
  pub preselect_enabled: bool,
  pub auto_ban_enabled: bool,
  pub auto_pick_enabled: bool,
  pub default_preselect_champion: Option<i64>,
  pub default_ban_champion: Option<i64>,
  pub default_pick_champion: Option<i64>,
  /// Keyed by uppercased position name.
  pub per_position: HashMap<String, i64>,
}

impl AutomationPolicy {
  pub fn champion_id_for_position(&self, position: &str) -> Option<i64> {
    self
      .per_position
      .get(&position.trim().to_uppercase())
      .copied()
  }
}

pub trait PolicySource: Send + Sync {
  fn policy(&self) -> AutomationPolicy;
}

impl PolicySource for AutomationPolicy {
  fn policy(&self) -> AutomationPolicy {
    self.clone()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  /// Hover the champion without locking in.
  Preselect { action_id: i64, champion_id: i64 },
  Ban { action_id: i64, champion_id: i64 },
  Pick { action_id: i64, champion_id: i64 },
}

impl Decision {
  pub fn action_id(&self) -> i64 {
    match self {
      Self::Preselect { action_id, .. }
      | Self::Ban { action_id, .. }
      | Self::Pick { action_id, .. } => *action_id,
    }
  }

  pub fn champion_id(&self) -> i64 {
    match self {
      Self::Preselect { champion_id, .. }
      | Self::Ban { champion_id, .. }
      | Self::Pick { champion_id, .. } => *champion_id,
    }
  }
}

pub struct PolicyEngine<'a> {
  ledger: &'a ActionLedger,
}

impl<'a> PolicyEngine<'a> {
  pub fn new(ledger: &'a ActionLedger) -> Self {
    Self { ledger }
  }

  /// Evaluates preselect, ban and pick in that order. Ban and pick are recorded in the ledger
  /// as soon as they are decided, so a replayed snapshot cannot produce them twice.
  pub fn evaluate(&self, session: &ChampSelectSession, policy: &AutomationPolicy) -> Vec<Decision> {
    let Some(cell) = session.local_cell() else {
      return Vec::new();
    };
    let phase = &session.timer_phase;

    let mut decisions = Vec::new();

    if policy.preselect_enabled
      && matches!(
        phase,
        TimerPhase::Planning | TimerPhase::BanPick | TimerPhase::Finalization
      )
    {
      decisions.extend(self.decide_preselect(session, cell, policy));
    }

    if policy.auto_ban_enabled
      && policy.default_ban_champion.is_some()
      && *phase == TimerPhase::BanPick
    {
      decisions.extend(self.decide_ban(session, cell, policy));
    }

    if policy.auto_pick_enabled && matches!(phase, TimerPhase::BanPick | TimerPhase::Finalization) {
      decisions.extend(self.decide_pick(session, cell, policy));
    }

    decisions
  }

  pub fn decide_preselect(
    &self,
    session: &ChampSelectSession,
    cell: i64,
    policy: &AutomationPolicy,
  ) -> Option<Decision> {
    let position = session.assigned_position(cell);
    let target = self.resolve_champion(
      policy,
      position.as_deref(),
      policy.default_preselect_champion,
      Purpose::Preselect,
    )?;

    if session.pick_intent(cell) == Some(target) && self.ledger.last_preselect() == Some(target) {
      return None;
    }

    let action = session.preselect_action(cell)?;
    if self.ledger.is_processed(&ActionKey::pick_preselect(action.id)) {
      return None;
    }

    Some(Decision::Preselect {
      action_id: action.id,
      champion_id: target,
    })
  }

  pub fn decide_ban(
    &self,
    session: &ChampSelectSession,
    cell: i64,
    policy: &AutomationPolicy,
  ) -> Option<Decision> {
    let champion_id = policy.default_ban_champion?;
    let action = session.current_action(cell, &ActionKind::Ban)?;
    if !self.ledger.mark_processed(ActionKey::ban(action.id)) {
      return None;
    }

    Some(Decision::Ban {
      action_id: action.id,
      champion_id,
    })
  }

  pub fn decide_pick(
    &self,
    session: &ChampSelectSession,
    cell: i64,
    policy: &AutomationPolicy,
  ) -> Option<Decision> {
    let action = session.current_action(cell, &ActionKind::Pick)?;
    let key = ActionKey::pick_completed(action.id);
    if self.ledger.is_processed(&key) {
      return None;
    }

    let position = session.assigned_position(cell);
    let champion_id = self.resolve_champion(
      policy,
      position.as_deref(),
      policy.default_pick_champion,
      Purpose::AutoPick,
    )?;

    if !self.ledger.mark_processed(key) {
      return None;
    }

    Some(Decision::Pick {
      action_id: action.id,
      champion_id,
    })
  }

  /// Role-specific champion when a role is assigned, otherwise the default for `purpose`.
  fn resolve_champion(
    &self,
    policy: &AutomationPolicy,
    position: Option<&str>,
    default: Option<i64>,
    purpose: Purpose,
  ) -> Option<i64> {
    match position {
      Some(position) => {
        let champion = policy.champion_id_for_position(position);
        if champion.is_none() {
          let key = WarningKey::NoChampionForPosition {
            position: position.to_string(),
            purpose,
          };
          if self.ledger.mark_warned(key) {
            tracing::warn!(
              "No champion configured for position {}, skipping {}",
              position,
              purpose_label(purpose)
            );
          }
        }
        champion
      }
      None => {
        if default.is_none() && self.ledger.mark_warned(WarningKey::NoDefaultChampion(purpose)) {
          tracing::warn!(
            "No position assigned and no default champion configured for {}",
            purpose_label(purpose)
          );
        }
        default
      }
    }
  }
}

fn purpose_label(purpose: Purpose) -> &'static str {
  match purpose {
    Purpose::Preselect => "preselect",
    Purpose::AutoPick => "auto pick",
  }
}
