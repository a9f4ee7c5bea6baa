// Champion select session snapshot decoding

use serde_json::{Map, Value};

/// Result of reading one field from a loosely-typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
  Absent,
  WrongType,
  Present(T),
}

impl<T> Field<T> {
  pub fn present(self) -> Option<T> {
    match self {
      Self::Present(v) => Some(v),
      _ => None,
    }
  }

  fn from_value(value: Option<&Value>, extract: impl Fn(&Value) -> Option<T>) -> Self {
    match value {
      None | Some(Value::Null) => Self::Absent,
      Some(v) => extract(v).map_or(Self::WrongType, Self::Present),
    }
  }
}

fn int_field(obj: &Map<String, Value>, key: &str) -> Field<i64> {
  Field::from_value(obj.get(key), |v| {
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
  })
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> Field<bool> {
  Field::from_value(obj.get(key), Value::as_bool)
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Field<String> {
  Field::from_value(obj.get(key), |v| v.as_str().map(str::to_string))
}

/// A field that was present with an unexpected type. Kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeIssue {
  pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
  Ban,
  Pick,
  Other(String),
}

impl ActionKind {
  fn parse(raw: &str) -> Self {
    match raw {
      "ban" => Self::Ban,
      "pick" => Self::Pick,
      other => Self::Other(other.to_string()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAction {
  pub id: i64,
  pub actor_cell_id: i64,
  pub kind: ActionKind,
  pub completed: bool,
  pub in_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
  pub cell_id: i64,
  pub assigned_position: Option<String>,
  pub pick_intent: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerPhase {
  Planning,
  BanPick,
  Finalization,
  Other(String),
  Missing,
}

impl TimerPhase {
  fn parse(raw: Option<String>) -> Self {
    match raw.as_deref() {
      Some("PLANNING") => Self::Planning,
      Some("BAN_PICK") => Self::BanPick,
      Some("FINALIZATION") => Self::Finalization,
      Some(other) => Self::Other(other.to_string()),
      None => Self::Missing,
    }
  }
}

/// Snapshot of `/lol-champ-select/v1/session`. Replaced wholesale on every event.
#[derive(Debug, Clone)]
pub struct ChampSelectSession {
  pub local_cell_id: Field<i64>,
  pub team: Vec<PlayerSlot>,
  pub action_groups: Vec<Vec<SessionAction>>,
  pub timer_phase: TimerPhase,
  pub issues: Vec<DecodeIssue>,
  pub raw: Value,
}

impl ChampSelectSession {
  /// Returns `None` only when the payload is not an object; everything inside is best-effort.
  pub fn decode(raw: &Value) -> Option<Self> {
    let obj = raw.as_object()?;
    let mut issues = Vec::new();

    let local_cell_id = int_field(obj, "localPlayerCellId");
    if local_cell_id == Field::WrongType {
      issues.push(DecodeIssue {
        path: "localPlayerCellId".to_string(),
      });
    }

    let team = obj
      .get("myTeam")
      .and_then(Value::as_array)
      .map(|players| {
        players
          .iter()
          .enumerate()
          .filter_map(|(i, p)| decode_slot(p, i, &mut issues))
          .collect()
      })
      .unwrap_or_default();

    let action_groups = obj
      .get("actions")
      .and_then(Value::as_array)
      .map(|groups| {
        groups
          .iter()
          .enumerate()
          .map(|(g, group)| {
            group
              .as_array()
              .map(|actions| {
                actions
                  .iter()
                  .enumerate()
                  .filter_map(|(i, a)| decode_action(a, g, i, &mut issues))
                  .collect()
              })
              .unwrap_or_default()
          })
          .collect()
      })
      .unwrap_or_default();

    let timer_phase = obj
      .get("timer")
      .and_then(Value::as_object)
      .and_then(|timer| str_field(timer, "phase").present());

    Some(Self {
      local_cell_id,
      team,
      action_groups,
      timer_phase: TimerPhase::parse(timer_phase),
      issues,
      raw: raw.clone(),
    })
  }

  /// The local player's cell. Spectators and stale events report a negative id.
  pub fn local_cell(&self) -> Option<i64> {
    match self.local_cell_id {
      Field::Present(id) if id >= 0 => Some(id),
      _ => None,
    }
  }

  pub fn player(&self, cell_id: i64) -> Option<&PlayerSlot> {
    self.team.iter().find(|p| p.cell_id == cell_id)
  }

  /// Uppercased role for the given cell; `None` in blind/fill queues.
  pub fn assigned_position(&self, cell_id: i64) -> Option<String> {
    self
      .player(cell_id)
      .and_then(|p| p.assigned_position.as_deref())
      .filter(|pos| !pos.trim().is_empty())
      .map(|pos| pos.trim().to_uppercase())
  }

  pub fn pick_intent(&self, cell_id: i64) -> Option<i64> {
    self.player(cell_id).and_then(|p| p.pick_intent)
  }

  pub fn actions(&self) -> impl Iterator<Item = &SessionAction> {
    self.action_groups.iter().flatten()
  }

  /// The action that is this player's turn right now.
  pub fn current_action(&self, cell_id: i64, kind: &ActionKind) -> Option<&SessionAction> {
    self.actions().find(|a| {
      a.actor_cell_id == cell_id && !a.completed && a.kind == *kind && a.in_progress
    })
  }

  /// The player's pending pick, whether or not it is their turn yet.
  pub fn preselect_action(&self, cell_id: i64) -> Option<&SessionAction> {
    self
      .actions()
      .find(|a| a.actor_cell_id == cell_id && !a.completed && a.kind == ActionKind::Pick)
  }
}

fn decode_slot(value: &Value, index: usize, issues: &mut Vec<DecodeIssue>) -> Option<PlayerSlot> {
  let obj = value.as_object()?;
  let cell_id = match int_field(obj, "cellId") {
    Field::Present(id) => id,
    Field::WrongType => {
      issues.push(DecodeIssue {
        path: format!("myTeam[{}].cellId", index),
      });
      return None;
    }
    Field::Absent => return None,
  };

  let assigned_position = match str_field(obj, "assignedPosition") {
    Field::Present(pos) => Some(pos),
    Field::WrongType => {
      issues.push(DecodeIssue {
        path: format!("myTeam[{}].assignedPosition", index),
      });
      None
    }
    Field::Absent => None,
  };

  Some(PlayerSlot {
    cell_id,
    assigned_position,
    pick_intent: int_field(obj, "championPickIntent").present(),
  })
}

fn decode_action(
  value: &Value,
  group: usize,
  index: usize,
  issues: &mut Vec<DecodeIssue>,
) -> Option<SessionAction> {
  let obj = value.as_object()?;
  let mut note = |field: &str| {
    issues.push(DecodeIssue {
      path: format!("actions[{}][{}].{}", group, index, field),
    })
  };

  let id = match int_field(obj, "id") {
    Field::Present(id) => id,
    Field::WrongType => {
      note("id");
      return None;
    }
    Field::Absent => return None,
  };
  let actor_cell_id = match int_field(obj, "actorCellId") {
    Field::Present(cell) => cell,
    Field::WrongType => {
      note("actorCellId");
      return None;
    }
    Field::Absent => return None,
  };

  let kind = match str_field(obj, "type") {
    Field::Present(raw) => ActionKind::parse(&raw),
    Field::WrongType => {
      note("type");
      ActionKind::Other(String::new())
    }
    Field::Absent => ActionKind::Other(String::new()),
  };

  let mut flag = |field: &str| match bool_field(obj, field) {
    Field::Present(v) => v,
    Field::WrongType => {
      note(field);
      false
    }
    Field::Absent => false,
  };
  let completed = flag("completed");
  let in_progress = flag("isInProgress");

  Some(SessionAction {
    id,
    actor_cell_id,
    kind,
    completed,
    in_progress,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn sample() -> Value {
    json!({
      "localPlayerCellId": 3,
      "myTeam": [
        {"cellId": 1, "assignedPosition": "top", "championPickIntent": 0},
        {"cellId": 3, "assignedPosition": "jungle", "championPickIntent": 64}
      ],
      "actions": [
        [{"id": 1, "actorCellId": 3, "type": "ban", "completed": true, "isInProgress": false}],
        [{"id": 7, "actorCellId": 3, "type": "pick", "completed": false, "isInProgress": true, "championId": 0}]
      ],
      "timer": {"phase": "BAN_PICK"}
    })
  }

  #[test]
  fn test_decode_full_session() {
    let session = ChampSelectSession::decode(&sample()).unwrap();
    assert_eq!(session.local_cell(), Some(3));
    assert_eq!(session.team.len(), 2);
    assert_eq!(session.timer_phase, TimerPhase::BanPick);
    assert_eq!(session.assigned_position(3).as_deref(), Some("JUNGLE"));
    assert_eq!(session.pick_intent(3), Some(64));
    assert_eq!(session.current_action(3, &ActionKind::Pick).map(|a| a.id), Some(7));
    assert!(session.current_action(3, &ActionKind::Ban).is_none());
    assert!(session.issues.is_empty());
  }

  #[test]
  fn test_decode_rejects_non_object() {
    assert!(ChampSelectSession::decode(&json!("ChampSelect")).is_none());
    assert!(ChampSelectSession::decode(&Value::Null).is_none());
  }

  #[test]
  fn test_absent_and_wrong_type_are_distinguished() {
    let absent = ChampSelectSession::decode(&json!({})).unwrap();
    assert_eq!(absent.local_cell_id, Field::Absent);
    assert!(absent.issues.is_empty());

    let wrong = ChampSelectSession::decode(&json!({"localPlayerCellId": "3"})).unwrap();
    assert_eq!(wrong.local_cell_id, Field::WrongType);
    assert_eq!(wrong.issues.len(), 1);
    assert_eq!(wrong.local_cell(), None);
  }

  #[test]
  fn test_negative_local_cell_is_unresolved() {
    let session = ChampSelectSession::decode(&json!({"localPlayerCellId": -1})).unwrap();
    assert_eq!(session.local_cell(), None);
  }

  #[test]
  fn test_actions_missing_id_are_skipped() {
    let raw = json!({
      "localPlayerCellId": 0,
      "actions": [[
        {"actorCellId": 0, "type": "pick", "isInProgress": true},
        {"id": "9", "actorCellId": 0, "type": "pick", "isInProgress": true},
        {"id": 4, "actorCellId": 0, "type": "pick", "isInProgress": "yes"}
      ]]
    });
    let session = ChampSelectSession::decode(&raw).unwrap();
    let actions: Vec<_> = session.actions().collect();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].id, 4);
    assert!(!actions[0].in_progress);
    assert_eq!(session.issues.len(), 2);
  }

  #[test]
  fn test_preselect_lookup_ignores_turn() {
    let raw = json!({
      "localPlayerCellId": 2,
      "actions": [[
        {"id": 11, "actorCellId": 2, "type": "pick", "completed": false, "isInProgress": false}
      ]]
    });
    let session = ChampSelectSession::decode(&raw).unwrap();
    assert_eq!(session.preselect_action(2).map(|a| a.id), Some(11));
    assert!(session.current_action(2, &ActionKind::Pick).is_none());
  }

  #[test]
  fn test_empty_position_means_no_role() {
    let raw = json!({
      "localPlayerCellId": 0,
      "myTeam": [{"cellId": 0, "assignedPosition": ""}]
    });
    let session = ChampSelectSession::decode(&raw).unwrap();
    assert_eq!(session.assigned_position(0), None);
    assert_eq!(session.timer_phase, TimerPhase::Missing);
  }
}
