// Test helpers and fakes for the automation tests

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::super::error::{LcuError, LcuResult};
use super::super::policy::{AutomationPolicy, PolicySource};
use super::super::tracker::{Dispatched, PhaseTracker};
use super::super::transport::LcuApi;

/// One request seen by the fake client
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Fake LCU that records every request. Unscripted requests answer `null`.
#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<(String, String), Result<Value, u16>>>,
}

impl RecordingApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), Ok(value));
    }

    pub fn fail(&self, method: Method, path: &str, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), Err(status));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    pub fn patches(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == Method::PATCH)
            .collect()
    }
}

#[async_trait]
impl LcuApi for RecordingApi {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> LcuResult<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.clone(),
            path: path.to_string(),
            body,
        });
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned();
        match scripted {
            Some(Ok(value)) => Ok(value),
            Some(Err(status)) => Err(LcuError::HttpStatus {
                status,
                body: String::new(),
            }),
            None => Ok(Value::Null),
        }
    }
}

/// Policy that tests can change between events
#[derive(Default)]
pub struct SharedPolicy(Mutex<AutomationPolicy>);

impl SharedPolicy {
    pub fn new(policy: AutomationPolicy) -> Arc<Self> {
        Arc::new(Self(Mutex::new(policy)))
    }

    pub fn set(&self, policy: AutomationPolicy) {
        *self.0.lock().unwrap() = policy;
    }
}

impl PolicySource for SharedPolicy {
    fn policy(&self) -> AutomationPolicy {
        self.0.lock().unwrap().clone()
    }
}

pub const TEST_SETTLE_DELAY: Duration = Duration::from_millis(20);

/// Tracker wired to a recording fake, with a short settle delay
pub fn create_tracker(policy: AutomationPolicy) -> (Arc<PhaseTracker>, Arc<RecordingApi>) {
    let api = RecordingApi::new();
    let tracker = PhaseTracker::new(api.clone(), Arc::new(policy)).with_settle_delay(TEST_SETTLE_DELAY);
    (Arc::new(tracker), api)
}

pub fn everything_enabled() -> AutomationPolicy {
    AutomationPolicy {
        auto_accept_enabled: true,
        preselect_enabled: true,
        auto_ban_enabled: true,
        auto_pick_enabled: true,
        default_ban_champion: Some(157),
        per_position: HashMap::from([("JUNGLE".to_string(), 64)]),
        ..Default::default()
    }
}

/// Session where cell 3 plays `position` and owns the given actions
pub fn create_session(position: &str, intent: i64, phase: &str, actions: Value) -> Value {
    json!({
        "localPlayerCellId": 3,
        "myTeam": [
            {"cellId": 1, "assignedPosition": "TOP", "championPickIntent": 0},
            {"cellId": 3, "assignedPosition": position, "championPickIntent": intent}
        ],
        "actions": actions,
        "timer": {"phase": phase}
    })
}

pub fn ban_action(id: i64, actor: i64, in_progress: bool) -> Value {
    json!({"id": id, "actorCellId": actor, "type": "ban", "completed": false, "isInProgress": in_progress})
}

pub fn pick_action(id: i64, actor: i64, in_progress: bool) -> Value {
    json!({"id": id, "actorCellId": actor, "type": "pick", "completed": false, "isInProgress": in_progress})
}

pub fn patch_body(champion_id: i64, completed: bool) -> Option<Value> {
    Some(json!({"championId": champion_id, "completed": completed}))
}

/// Waits for everything an event spawned
pub async fn settle(dispatched: Dispatched) -> Vec<bool> {
    let mut results = Vec::new();
    for handle in dispatched {
        results.push(handle.await.unwrap());
    }
    results
}

/// Polls until `api` has seen `count` requests or a second has passed
pub async fn wait_for_calls(api: &RecordingApi, count: usize) -> Vec<RecordedCall> {
    for _ in 0..100 {
        let calls = api.calls();
        if calls.len() >= count {
            return calls;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    api.calls()
}

/// Puts the tracker in ChampSelect without seeding a session
pub async fn enter_champ_select(tracker: &PhaseTracker, api: &RecordingApi) {
    api.respond(Method::GET, "/lol-champ-select/v1/session", Value::Null);
    settle(tracker.handle_gameflow_phase(&json!("ChampSelect")).await).await;
}
