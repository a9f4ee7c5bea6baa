// LCU module - connects to the League client and automates champ select

pub mod connector;
pub mod credentials;
pub mod error;
pub mod events;
pub mod executor;
pub mod ledger;
pub mod policy;
pub mod session;
pub mod tracker;
pub mod transport;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use connector::LcuConnector;
pub use credentials::{CredentialProvider, LockfileProvider, StaticCredentials};
pub use error::{LcuError, LcuResult};
pub use ledger::{ActionKey, ActionKeyKind, ActionLedger, WarningKey};
pub use policy::{AutomationPolicy, Decision, PolicyEngine, PolicySource};
pub use session::ChampSelectSession;
pub use tracker::PhaseTracker;
pub use transport::{LcuApi, LcuTransport};
pub use types::{ConnectionState, Credentials, GamePhase, LcuStatus};
