//! wallet-bridge-client library crate.
//!
//! This crate lets a wallet UI (or any Rust process standing in for one) talk
//! to the privileged wallet backend.  Every request gets a [`RequestId`]; the
//! answer may come back in any order and is routed to whoever is waiting for
//! it.  Unsolicited push events are fanned out to subscribers.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! WalletApi / ConfigStore   typed backend operations
//!         ↕
//! BridgeClient              connect/close lifecycle, timeouts
//!   ├── Correlator          RequestId → waiting caller
//!   └── ListenerRegistry    push-event subscribers
//!         ↕  Transport trait
//! infrastructure/transport
//!   ├── http                HTTP requests + /api/events WebSocket
//!   ├── native              host object channel (call / gotResponse / pushNotify)
//!   ├── webview             newline-delimited JSON frames over a pipe
//!   └── mock                in-memory backend for tests and demos
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async).
//! - `application` depends on `domain`, `wallet-bridge-core` and tokio
//!   primitives only.  It talks to the backend exclusively through the
//!   [`Transport`](application::transport::Transport) trait.
//! - `infrastructure` implements that trait with reqwest, tokio-tungstenite
//!   and tokio I/O, and loads the TOML settings file.
//!
//! [`RequestId`]: wallet_bridge_core::RequestId

/// Domain layer: client configuration (no I/O).
pub mod domain;

/// Application layer: correlation, subscriptions, client lifecycle, facade.
pub mod application;

/// Infrastructure layer: transports and settings file.
pub mod infrastructure;

pub use application::api::{ErrorReporter, LogReporter, WalletApi};
pub use application::client::{BridgeClient, ClientError};
pub use application::config_store::ConfigStore;
pub use application::subscriptions::Subscription;
pub use application::transport::{Inbound, InboundSink, Transport, TransportError};
pub use domain::ClientConfig;
