// Authenticated HTTPS calls and the push-event socket

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use super::error::{LcuError, LcuResult};
use super::types::Credentials;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub type EventSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The request surface the automation needs. Implemented by the real transport and by
/// recording fakes in tests.
#[async_trait]
pub trait LcuApi: Send + Sync {
  async fn request(&self, method: Method, path: &str, body: Option<Value>) -> LcuResult<Value>;
}

pub struct LcuTransport {
  client: reqwest::Client,
  credentials: RwLock<Option<Credentials>>,
}

impl LcuTransport {
  pub fn new() -> LcuResult<Self> {
    // The client serves a self-signed certificate on loopback
    let client = reqwest::Client::builder()
      .danger_accept_invalid_certs(true)
      .no_proxy()
      .timeout(REQUEST_TIMEOUT)
      .connect_timeout(Duration::from_secs(2))
      .pool_max_idle_per_host(2)
      .build()?;

    Ok(Self {
      client,
      credentials: RwLock::new(None),
    })
  }

  fn store_credentials(&self, creds: Option<Credentials>) {
    *self
      .credentials
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner()) = creds;
  }

  pub fn set_credentials(&self, creds: Credentials) {
    self.store_credentials(Some(creds));
  }

  pub fn clear_credentials(&self) {
    self.store_credentials(None);
  }

  pub fn credentials(&self) -> Option<Credentials> {
    self
      .credentials
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }

  fn require_credentials(&self) -> LcuResult<Credentials> {
    self.credentials().ok_or(LcuError::NotConnected)
  }

  /// Opens the WAMP socket with the same basic auth as the REST calls.
  pub async fn open_event_channel(&self) -> LcuResult<EventSocket> {
    let creds = self.require_credentials()?;

    let mut request = creds
      .ws_url()
      .into_client_request()
      .map_err(LcuError::HandshakeFailed)?;
    let auth = HeaderValue::from_str(&creds.auth_header())
      .map_err(|e| LcuError::ConnectFailed(format!("invalid auth header: {}", e)))?;
    request.headers_mut().insert("Authorization", auth);
    request
      .headers_mut()
      .insert("Sec-WebSocket-Protocol", HeaderValue::from_static("wamp"));

    let tls = native_tls::TlsConnector::builder()
      .danger_accept_invalid_certs(true)
      .danger_accept_invalid_hostnames(true)
      .build()
      .map_err(|e| LcuError::ConnectFailed(format!("failed to build TLS connector: {}", e)))?;

    let connect = tokio_tungstenite::connect_async_tls_with_config(
      request,
      None,
      false,
      Some(Connector::NativeTls(tls)),
    );

    let (socket, _response) = tokio::time::timeout(HANDSHAKE_TIMEOUT, connect)
      .await
      .map_err(|_| LcuError::ConnectFailed("WebSocket handshake timed out".to_string()))?
      .map_err(LcuError::HandshakeFailed)?;

    Ok(socket)
  }
}

#[async_trait]
impl LcuApi for LcuTransport {
  async fn request(&self, method: Method, path: &str, body: Option<Value>) -> LcuResult<Value> {
    let creds = self.require_credentials()?;
    let url = format!("{}{}", creds.base_url(), path);

    let mut req = self
      .client
      .request(method, &url)
      .header("Authorization", creds.auth_header());
    if let Some(body) = body {
      req = req.json(&body);
    }

    let resp = req.send().await?;
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
      return Err(LcuError::HttpStatus {
        status: status.as_u16(),
        body: text,
      });
    }

    Ok(decode_body(&text))
  }
}

/// Bodies are usually JSON objects, but some resources answer with a bare JSON string
/// (the gameflow phase) or nothing at all.
pub fn decode_body(text: &str) -> Value {
  if text.trim().is_empty() {
    return Value::Null;
  }
  serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
