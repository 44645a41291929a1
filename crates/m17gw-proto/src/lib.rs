//! Wire types for the M17 reflector and repeater protocols.
//!
//! This crate is pure data: callsign codec, LSF bit-accessors, the 54-byte
//! network frame, and reflector-protocol control packets. No sockets, no
//! timers, no state machines — see `m17gw-core` for those.

pub mod callsign;
pub mod errors;
pub mod frame;
pub mod lsf;
pub mod packet;

pub use errors::{ProtocolError, Result};
pub use frame::NetworkFrame;
pub use lsf::Lsf;
pub use packet::ReflectorPacket;
