//! Domain layer for wallet-bridge-client.
//!
//! Plain configuration values with no dependencies on I/O or the async
//! runtime.  The infrastructure layer and `main.rs` are responsible for
//! populating them from files, CLI arguments or environment variables.

pub mod config;

pub use config::ClientConfig;
