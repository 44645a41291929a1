//! Fuzz target for `ReflectorPacket::decode`.
//!
//! Exercises the `CONN`/`ACKN`/`NACK`/`PING`/`PONG`/`DISC` control-packet
//! parser with arbitrary bytes, including opcodes that collide with a
//! known tag but carry the wrong payload length.
//!
//! The decoder should NEVER panic. All invalid inputs should return `Err`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use m17gw_proto::packet::ReflectorPacket;

fuzz_target!(|data: &[u8]| {
    let _ = ReflectorPacket::decode(data);
});
