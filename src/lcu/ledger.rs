// Per-phase dedup store for automated actions

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use super::types::GamePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKeyKind {
  Ban,
  PickCompleted,
  PickPreselect,
}

/// Identifies one operation on one champ select action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionKey {
  pub action_id: i64,
  pub kind: ActionKeyKind,
}

impl ActionKey {
  pub fn ban(action_id: i64) -> Self {
    Self {
      action_id,
      kind: ActionKeyKind::Ban,
    }
  }

  pub fn pick_completed(action_id: i64) -> Self {
    Self {
      action_id,
      kind: ActionKeyKind::PickCompleted,
    }
  }

  pub fn pick_preselect(action_id: i64) -> Self {
    Self {
      action_id,
      kind: ActionKeyKind::PickPreselect,
    }
  }
}

impl fmt::Display for ActionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let suffix = match self.kind {
      ActionKeyKind::Ban => "ban",
      ActionKeyKind::PickCompleted => "pick_completed",
      ActionKeyKind::PickPreselect => "pick_preselect",
    };
    write!(f, "{}_{}", self.action_id, suffix)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
  Preselect,
  AutoPick,
}

/// Configuration warnings that are logged once per epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WarningKey {
  NoChampionForPosition { position: String, purpose: Purpose },
  NoDefaultChampion(Purpose),
}

#[derive(Debug)]
pub struct ActionEpoch {
  pub version: u64,
  pub phase: GamePhase,
  processed: HashSet<ActionKey>,
  warned: HashSet<WarningKey>,
  ready_check_accepted: bool,
  last_preselect: Option<i64>,
}

impl ActionEpoch {
  fn new(version: u64, phase: GamePhase) -> Self {
    Self {
      version,
      phase,
      processed: HashSet::new(),
      warned: HashSet::new(),
      ready_check_accepted: false,
      last_preselect: None,
    }
  }
}

/// Holds the current epoch. A phase change swaps in a fresh epoch under one lock, so readers
/// never observe a half-cleared state.
#[derive(Debug)]
pub struct ActionLedger {
  epoch: Mutex<ActionEpoch>,
}

impl Default for ActionLedger {
  fn default() -> Self {
    Self::new()
  }
}

impl ActionLedger {
  pub fn new() -> Self {
    Self {
      epoch: Mutex::new(ActionEpoch::new(0, GamePhase::Unknown)),
    }
  }

  fn lock(&self) -> MutexGuard<'_, ActionEpoch> {
    self.epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Starts a new epoch for `phase` and returns its version.
  pub fn advance(&self, phase: GamePhase) -> u64 {
    let mut epoch = self.lock();
    let version = epoch.version + 1;
    *epoch = ActionEpoch::new(version, phase);
    version
  }

  /// Drops everything recorded so far without changing the phase.
  pub fn clear(&self) -> u64 {
    let mut epoch = self.lock();
    let version = epoch.version + 1;
    let phase = std::mem::take(&mut epoch.phase);
    *epoch = ActionEpoch::new(version, phase);
    version
  }

  pub fn version(&self) -> u64 {
    self.lock().version
  }

  pub fn phase(&self) -> GamePhase {
    self.lock().phase.clone()
  }

  /// Records `key`; returns false if it was already recorded in this epoch.
  pub fn mark_processed(&self, key: ActionKey) -> bool {
    self.lock().processed.insert(key)
  }

  pub fn is_processed(&self, key: &ActionKey) -> bool {
    self.lock().processed.contains(key)
  }

  pub fn mark_warned(&self, key: WarningKey) -> bool {
    self.lock().warned.insert(key)
  }

  pub fn is_warned(&self, key: &WarningKey) -> bool {
    self.lock().warned.contains(key)
  }

  /// Returns true exactly once per epoch.
  pub fn try_mark_ready_check_accepted(&self) -> bool {
    let mut epoch = self.lock();
    if epoch.ready_check_accepted {
      return false;
    }
    epoch.ready_check_accepted = true;
    true
  }

  pub fn ready_check_accepted(&self) -> bool {
    self.lock().ready_check_accepted
  }

  pub fn last_preselect(&self) -> Option<i64> {
    self.lock().last_preselect
  }

  /// Remembers a successful preselect, unless the epoch moved on while it was in flight.
  pub fn record_preselect(&self, version: u64, action_id: i64, champion_id: i64) -> bool {
    let mut epoch = self.lock();
    if epoch.version != version {
      return false;
    }
    epoch.last_preselect = Some(champion_id);
    epoch.processed.insert(ActionKey::pick_preselect(action_id));
    true
  }

  pub fn processed_keys(&self) -> Vec<ActionKey> {
    let mut keys: Vec<ActionKey> = self.lock().processed.iter().copied().collect();
    keys.sort_by_key(|k| (k.action_id, k.to_string()));
    keys
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  #[test]
  fn test_key_display() {
    assert_eq!(ActionKey::ban(2).to_string(), "2_ban");
    assert_eq!(ActionKey::pick_completed(7).to_string(), "7_pick_completed");
    assert_eq!(ActionKey::pick_preselect(7).to_string(), "7_pick_preselect");
  }

  #[test]
  fn test_mark_processed_is_test_and_set() {
    let ledger = ActionLedger::new();
    assert!(ledger.mark_processed(ActionKey::ban(2)));
    assert!(!ledger.mark_processed(ActionKey::ban(2)));
    // Same id, different operation
    assert!(ledger.mark_processed(ActionKey::pick_completed(2)));
    assert!(ledger.is_processed(&ActionKey::ban(2)));
    assert!(!ledger.is_processed(&ActionKey::pick_preselect(2)));
  }

  #[test]
  fn test_advance_clears_everything() {
    let ledger = ActionLedger::new();
    ledger.advance(GamePhase::ChampSelect);
    ledger.mark_processed(ActionKey::ban(1));
    ledger.mark_warned(WarningKey::NoDefaultChampion(Purpose::Preselect));
    assert!(ledger.try_mark_ready_check_accepted());
    assert!(ledger.record_preselect(ledger.version(), 3, 64));

    let v = ledger.advance(GamePhase::Lobby);
    assert_eq!(v, 2);
    assert_eq!(ledger.phase(), GamePhase::Lobby);
    assert!(!ledger.is_processed(&ActionKey::ban(1)));
    assert!(!ledger.is_warned(&WarningKey::NoDefaultChampion(Purpose::Preselect)));
    assert!(!ledger.ready_check_accepted());
    assert_eq!(ledger.last_preselect(), None);
  }

  #[test]
  fn test_clear_keeps_phase() {
    let ledger = ActionLedger::new();
    let entered = ledger.advance(GamePhase::ChampSelect);
    ledger.mark_processed(ActionKey::ban(1));
    let cleared = ledger.clear();
    assert_eq!(cleared, entered + 1);
    assert_eq!(ledger.version(), cleared);
    assert_eq!(ledger.phase(), GamePhase::ChampSelect);
    assert!(ledger.processed_keys().is_empty());
    assert!(!ledger.record_preselect(entered, 3, 64));
  }

  #[test]
  fn test_stale_preselect_is_discarded() {
    let ledger = ActionLedger::new();
    let old = ledger.advance(GamePhase::ChampSelect);
    ledger.advance(GamePhase::Other("InProgress".to_string()));
    assert!(!ledger.record_preselect(old, 3, 64));
    assert_eq!(ledger.last_preselect(), None);
    assert!(!ledger.is_processed(&ActionKey::pick_preselect(3)));
  }

  #[test]
  fn test_ready_check_accept_once() {
    let ledger = ActionLedger::new();
    assert!(ledger.try_mark_ready_check_accepted());
    assert!(!ledger.try_mark_ready_check_accepted());
  }

  #[test]
  fn test_concurrent_marks_yield_single_winner() {
    let ledger = Arc::new(ActionLedger::new());
    let handles: Vec<_> = (0..8)
      .map(|_| {
        let ledger = ledger.clone();
        std::thread::spawn(move || ledger.mark_processed(ActionKey::ban(5)))
      })
      .collect();
    let winners = handles
      .into_iter()
      .map(|h| h.join().unwrap())
      .filter(|won| *won)
      .count();
    assert_eq!(winners, 1);
  }
}
