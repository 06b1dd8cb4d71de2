//! Application layer for wallet-bridge-client.
//!
//! The application layer knows *what* happens to a request: it gets an id, it
//! waits for the matching answer (or a timeout), and the answer is classified
//! and decoded.  *How* the request reaches the backend is the job of a
//! [`transport::Transport`] implementation from the infrastructure layer.
//!
//! # What does NOT belong here?
//!
//! - HTTP clients, WebSocket handshakes or pipe framing
//! - Reading settings files or environment variables
//! - Showing errors to a user

pub mod api;
pub mod client;
pub mod config_store;
pub mod correlator;
pub mod subscriptions;
pub mod transport;

pub use api::{ErrorReporter, LogReporter, WalletApi};
pub use client::{BridgeClient, ClientError};
pub use config_store::ConfigStore;
pub use correlator::Correlator;
pub use subscriptions::{ListenerRegistry, Subscription};
pub use transport::{Inbound, InboundSink, Transport, TransportError};
