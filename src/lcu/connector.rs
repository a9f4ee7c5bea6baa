// Connection lifecycle for one running client

use reqwest::Method;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

use super::credentials::CredentialProvider;
use super::error::{LcuError, LcuResult};
use super::events::{run_event_loop, subscribe};
use super::policy::PolicySource;
use super::tracker::PhaseTracker;
use super::transport::{LcuApi, LcuTransport};
use super::types::{
  ConnectionState, Credentials, GamePhase, LcuStatus, CURRENT_SUMMONER_PATH, GAMEFLOW_PHASE_PATH,
  LOBBY_PATH, RANKED_SOLO_QUEUE_ID, RANKED_STATS_PATH,
};

/// Owns the transport, the event loop and all per-connection state. One connector per
/// connection attempt; reconnecting means building a new one.
pub struct LcuConnector {
  transport: Arc<LcuTransport>,
  provider: Box<dyn CredentialProvider>,
  tracker: Arc<PhaseTracker>,
  state: Arc<RwLock<ConnectionState>>,
  stop: CancellationToken,
  stopped: AtomicBool,
}

impl LcuConnector {
  pub fn new(
    provider: Box<dyn CredentialProvider>,
    policy: Arc<dyn PolicySource>,
  ) -> LcuResult<Self> {
    let transport = Arc::new(LcuTransport::new()?);
    let tracker = Arc::new(PhaseTracker::new(transport.clone(), policy));
    Ok(Self {
      transport,
      provider,
      tracker,
      state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
      stop: CancellationToken::new(),
      stopped: AtomicBool::new(false),
    })
  }

  pub fn tracker(&self) -> &Arc<PhaseTracker> {
    &self.tracker
  }

  pub fn state(&self) -> ConnectionState {
    read_state(&self.state)
  }

  pub fn is_connected(&self) -> bool {
    self.state() == ConnectionState::Connected
  }

  fn set_state(&self, state: ConnectionState) {
    write_state(&self.state, state);
  }

  /// Discovers credentials, checks the REST API answers, then opens and subscribes the event
  /// channel. The read loop runs on its own task until the channel ends or `disconnect`.
  pub async fn connect(&self) -> LcuResult<Credentials> {
    if self.stopped.load(Ordering::SeqCst) {
      return Err(LcuError::ConnectFailed(
        "connector has been shut down".to_string(),
      ));
    }
    if self.is_connected() {
      if let Some(creds) = self.transport.credentials() {
        return Ok(creds);
      }
    }

    self.set_state(ConnectionState::Connecting);
    match self.establish().await {
      Ok(creds) => Ok(creds),
      Err(e) => {
        self.transport.clear_credentials();
        self.set_state(ConnectionState::Disconnected);
        Err(e)
      }
    }
  }

  async fn establish(&self) -> LcuResult<Credentials> {
    let creds = self.provider.discover()?;
    tracing::info!("Found LCU on port {}", creds.port);
    self.transport.set_credentials(creds.clone());

    let phase = self
      .transport
      .request(Method::GET, GAMEFLOW_PHASE_PATH, None)
      .await
      .map_err(|e| LcuError::ConnectFailed(format!("LCU API not responding: {}", e)))?;
    self.check_not_stopped()?;

    let mut socket = self.transport.open_event_channel().await?;
    subscribe(&mut socket).await?;
    if let Err(e) = self.check_not_stopped() {
      let _ = socket.close(None).await;
      return Err(e);
    }
    tracing::info!("Subscribed to LCU events");

    self.set_state(ConnectionState::Connected);

    // Pick up where the client already is, including an ongoing champ select
    drop(self.tracker.handle_gameflow_phase(&phase).await);

    let tracker = self.tracker.clone();
    let state = self.state.clone();
    let stop = self.stop.clone();
    tokio::spawn(async move {
      run_event_loop(socket, tracker.clone(), stop).await;
      write_state(&state, ConnectionState::Disconnected);
      tracker.reset();
      tracing::info!("Disconnected from LCU");
    });

    tracing::info!("Connected to LCU");
    Ok(creds)
  }

  /// `disconnect` may land while `establish` is awaiting the client.
  fn check_not_stopped(&self) -> LcuResult<()> {
    if self.stop.is_cancelled() {
      return Err(LcuError::ConnectFailed(
        "connector was stopped while connecting".to_string(),
      ));
    }
    Ok(())
  }

  /// Stops the event loop. Safe to call any number of times.
  pub fn disconnect(&self) {
    if self.stopped.swap(true, Ordering::SeqCst) {
      return;
    }
    self.set_state(ConnectionState::Disconnected);
    self.stop.cancel();
    self.tracker.reset();
  }

  pub fn status(&self) -> LcuStatus {
    let connected = self.is_connected();
    LcuStatus {
      connected,
      client_status: self.tracker.phase().as_str().to_string(),
      champ_select: if connected {
        self.tracker.session_raw()
      } else {
        None
      },
    }
  }

  /// Raw request passthrough for callers outside the automation.
  pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> LcuResult<Value> {
    if !self.is_connected() {
      return Err(LcuError::NotConnected);
    }
    self.transport.request(method, path, body).await
  }

  pub async fn gameflow_phase(&self) -> LcuResult<GamePhase> {
    let phase = self.request(Method::GET, GAMEFLOW_PHASE_PATH, None).await?;
    Ok(phase.as_str().map(GamePhase::parse).unwrap_or_default())
  }

  /// Creates a ranked solo/duo lobby.
  pub async fn start_ranked_queue(&self) -> LcuResult<Value> {
    let body = json!({ "queueId": RANKED_SOLO_QUEUE_ID });
    self.request(Method::POST, LOBBY_PATH, Some(body)).await
  }

  pub async fn leave_lobby(&self) -> LcuResult<()> {
    self.request(Method::DELETE, LOBBY_PATH, None).await?;
    Ok(())
  }

  pub async fn current_summoner(&self) -> LcuResult<Value> {
    self.request(Method::GET, CURRENT_SUMMONER_PATH, None).await
  }

  pub async fn ranked_stats(&self) -> LcuResult<Value> {
    self.request(Method::GET, RANKED_STATS_PATH, None).await
  }
}

impl Drop for LcuConnector {
  fn drop(&mut self) {
    self.stop.cancel();
  }
}

fn read_state(state: &RwLock<ConnectionState>) -> ConnectionState {
  *state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_state(state: &RwLock<ConnectionState>, value: ConnectionState) {
  *state.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
}
