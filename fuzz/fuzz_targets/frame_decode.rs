//! Fuzz target for `NetworkFrame::decode`.
//!
//! Exercises the 54-byte network-frame parser with arbitrary byte
//! sequences to find parser crashes, buffer over-reads, or malformed
//! headers that bypass validation.
//!
//! The decoder should NEVER panic. All invalid inputs should return `Err`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use m17gw_proto::frame::NetworkFrame;

fuzz_target!(|data: &[u8]| {
    let _ = NetworkFrame::decode(data);
});
