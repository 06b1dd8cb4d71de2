//! # wallet-bridge-core
//!
//! Shared library for the wallet backend bridge containing the wire message
//! types, the JSON framing codec for the native and WebView bridges, push
//! event decoding, response classification and the app-config merge rules.
//!
//! This crate has zero dependencies on async runtimes, sockets or UI
//! frameworks.  Everything here is a plain value or a pure function, so the
//! client crate can test its transports against exactly the same types the
//! wire carries.
//!
//! # Architecture overview (for beginners)
//!
//! A wallet UI never touches keys, devices or the blockchain itself.  It talks
//! to a privileged backend process that exposes one endpoint per capability
//! (`accounts`, `account/{code}/balance`, `config`, ...).  The UI reaches that
//! backend over one of three channels: local HTTP + WebSocket, a native object
//! channel injected by a desktop host, or a pipe provided by a mobile WebView.
//!
//! - **`protocol`** – What travels over the channel.  A [`Query`] names the
//!   endpoint; a [`RequestId`] ties the eventual answer back to the caller.
//!
//! - **`domain`** – What the answers mean.  [`PushEvent`] decodes unsolicited
//!   notifications, [`classify`] separates backend-reported errors from
//!   successful payloads, and [`AppConfig`] knows how partial config updates
//!   are merged.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `wallet_bridge_core::Query` instead of `wallet_bridge_core::protocol::messages::Query`.
pub use domain::app_config::{AppConfig, ConfigPatch};
pub use domain::event::{EventAction, LegacyEvent, PushEvent, SubjectEvent};
pub use domain::response::{classify, BackendError, SuccessResponse};
pub use protocol::codec::ProtocolError;
pub use protocol::messages::{Method, Query, RequestId};
pub use protocol::sequence::RequestIdCounter;
