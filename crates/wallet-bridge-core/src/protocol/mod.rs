//! Protocol module containing the wire message types and the JSON framing codec.

pub mod codec;
pub mod messages;
pub mod sequence;

pub use codec::{decode_frame, decode_native_query, encode_frame, encode_native_query, ProtocolError};
pub use messages::*;
pub use sequence::RequestIdCounter;
