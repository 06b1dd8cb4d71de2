//! Infrastructure layer: transports to the backend and on-disk settings.

pub mod storage;
pub mod transport;
