//! Fuzz target for `ReflectorLink::on_datagram`.
//!
//! Drives the `CONN`/`ACKN`/`NACK`/`PING`/`PONG`/`DISC` handshake state
//! machine with arbitrary inbound bytes from the peer address it was
//! linked to, including while unlinked, to catch any panic reachable
//! through malformed or out-of-sequence reflector traffic.
//!
//! The state machine should NEVER panic on any input.

#![no_main]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use libfuzzer_sys::fuzz_target;
use m17gw_core::reflector_link::ReflectorLink;

fuzz_target!(|data: &[u8]| {
    let peer = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1)), 17000);
    let mut link = ReflectorLink::new(*b"N0CALL");
    let _ = link.link(peer, b'A');
    let _ = link.on_datagram(peer, data);
});
