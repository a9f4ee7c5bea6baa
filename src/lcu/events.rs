// WAMP envelope decoding and the read loop

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::error::{LcuError, LcuResult};
use super::tracker::{Dispatched, PhaseTracker};
use super::transport::EventSocket;
use super::types::{CHAMP_SELECT_SESSION_PATH, GAMEFLOW_PHASE_PATH, READY_CHECK_PATH};

pub const EVENT_NAME: &str = "OnJsonApiEvent";
const OPCODE_SUBSCRIBE: u64 = 5;
const OPCODE_EVENT: u64 = 8;

/// `[5, "OnJsonApiEvent"]`
pub fn subscribe_frame() -> String {
  serde_json::json!([OPCODE_SUBSCRIBE, EVENT_NAME]).to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonApiEvent {
  pub uri: String,
  pub data: Value,
}

/// Decodes `[8, "OnJsonApiEvent", {uri, data}]`. Other well-formed frames are `Ok(None)`;
/// text that is not a frame, or an event without a string `uri`, is `MalformedEvent`.
pub fn decode_frame(text: &str) -> LcuResult<Option<JsonApiEvent>> {
  let frame: Value =
    serde_json::from_str(text).map_err(|e| LcuError::MalformedEvent(e.to_string()))?;
  let Some(parts) = frame.as_array() else {
    return Err(LcuError::MalformedEvent("frame is not an array".to_string()));
  };
  if parts.first().and_then(Value::as_u64) != Some(OPCODE_EVENT)
    || parts.get(1).and_then(Value::as_str) != Some(EVENT_NAME)
  {
    return Ok(None);
  }
  let Some(payload) = parts.get(2).and_then(Value::as_object) else {
    return Err(LcuError::MalformedEvent("payload is not an object".to_string()));
  };
  let Some(uri) = payload.get("uri").and_then(Value::as_str) else {
    return Err(LcuError::MalformedEvent("payload has no uri".to_string()));
  };
  let data = payload.get("data").cloned().unwrap_or(Value::Null);
  Ok(Some(JsonApiEvent {
    uri: uri.to_string(),
    data,
  }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  ReadyCheck,
  GameflowPhase,
  ChampSelectSession,
}

/// First match wins, in this order.
pub fn route(uri: &str) -> Option<Route> {
  if uri.contains(READY_CHECK_PATH) {
    Some(Route::ReadyCheck)
  } else if uri.contains(GAMEFLOW_PHASE_PATH) {
    Some(Route::GameflowPhase)
  } else if uri.contains(CHAMP_SELECT_SESSION_PATH) {
    Some(Route::ChampSelectSession)
  } else {
    None
  }
}

/// Hands one event to the tracker and returns whatever it spawned.
pub async fn dispatch(tracker: &PhaseTracker, event: &JsonApiEvent) -> Dispatched {
  match route(&event.uri) {
    Some(Route::ReadyCheck) => tracker.handle_ready_check(&event.data).into_iter().collect(),
    Some(Route::GameflowPhase) => tracker.handle_gameflow_phase(&event.data).await,
    Some(Route::ChampSelectSession) => tracker.handle_champ_select_session(&event.data).await,
    None => Vec::new(),
  }
}

pub async fn subscribe(socket: &mut EventSocket) -> LcuResult<()> {
  socket
    .send(Message::Text(subscribe_frame()))
    .await
    .map_err(LcuError::HandshakeFailed)
}

/// Reads until the socket errors or closes, or `stop` fires.
pub async fn run_event_loop(
  mut socket: EventSocket,
  tracker: Arc<PhaseTracker>,
  stop: CancellationToken,
) {
  loop {
    let msg = tokio::select! {
      _ = stop.cancelled() => {
        tracing::info!("Event loop stopped");
        let _ = socket.close(None).await;
        break;
      }
      msg = socket.next() => msg,
    };

    match msg {
      Some(Ok(Message::Text(text))) => match decode_frame(&text) {
        Ok(Some(event)) => {
          // Spawned completions run on their own
          drop(dispatch(&tracker, &event).await);
        }
        Ok(None) => {}
        Err(e) => tracing::debug!("{}; dropping {}", e, truncate(&text, 120)),
      },
      Some(Ok(Message::Close(frame))) => {
        tracing::info!("LCU closed the event channel: {:?}", frame);
        break;
      }
      Some(Ok(_)) => {}
      Some(Err(e)) => {
        tracing::warn!("LCU event channel error: {}", e);
        break;
      }
      None => {
        tracing::info!("LCU event channel ended");
        break;
      }
    }
  }
}

fn truncate(text: &str, max: usize) -> &str {
  match text.char_indices().nth(max) {
    Some((idx, _)) => &text[..idx],
    None => text,
  }
}
