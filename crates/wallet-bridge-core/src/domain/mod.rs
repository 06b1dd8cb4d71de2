//! Domain types for the wallet backend bridge.
//!
//! Pure values and functions only: no sockets, no tasks, no clocks.  The client
//! crate's transports and facade depend on these, never the other way round,
//! so every rule here can be tested without a backend.

/// Merge rules for the `{ backend, frontend }` application config.
pub mod app_config;

/// Typed payloads of the backend endpoints.
pub mod dto;

/// Decoding of unsolicited push notifications.
pub mod event;

/// Separation of backend-reported errors from successful payloads.
pub mod response;
