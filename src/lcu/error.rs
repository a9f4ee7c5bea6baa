use thiserror::Error;

// Error handling for LCU operations

#[derive(Debug, Error)]
pub enum LcuError {
  #[error("LCU credentials not found: {0}")]
  CredentialsNotFound(String),
  #[error("failed to connect to LCU: {0}")]
  ConnectFailed(String),
  #[error("LCU WebSocket handshake failed: {0}")]
  HandshakeFailed(#[source] tokio_tungstenite::tungstenite::Error),
  #[error("LCU returned HTTP {status}: {body}")]
  HttpStatus { status: u16, body: String },
  #[error("not connected to LCU")]
  NotConnected,
  #[error("LCU request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("malformed LCU event: {0}")]
  MalformedEvent(String),
}

pub type LcuResult<T> = Result<T, LcuError>;
