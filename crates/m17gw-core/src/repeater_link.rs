//! Repeater link: a simpler, handshake-free UDP conversation with the
//! local modem. See `spec.md` §4.D.

use std::collections::VecDeque;
use std::net::SocketAddr;

use m17gw_proto::packet::ReflectorPacket;

use crate::timer::Timer;

/// How often we ping the modem to keep it informed we're alive.
pub const PING_PERIOD_MS: u64 = 5_000;
/// Capacity of the inbound stream-frame ring buffer.
pub const RING_BUFFER_CAPACITY: usize = 1000;

/// Outcome of advancing or feeding the repeater link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepeaterAction {
    /// Send a raw packet to the modem.
    Send(Vec<u8>),
}

/// The repeater (local modem) link. No handshake, no liveness timeout — the
/// modem is assumed always present.
pub struct RepeaterLink {
    peer: SocketAddr,
    ping_timer: Timer,
    inbound: VecDeque<Vec<u8>>,
}

impl RepeaterLink {
    /// Construct and immediately "open" a repeater link to `peer`, starting
    /// the ping timer.
    #[must_use]
    pub fn open(peer: SocketAddr) -> (Self, Vec<RepeaterAction>) {
        let mut link = Self {
            peer,
            ping_timer: Timer::new(PING_PERIOD_MS),
            inbound: VecDeque::new(),
        };
        link.ping_timer.start();
        let actions = vec![link.send_ping()];
        (link, actions)
    }

    /// Address of the modem peer.
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send exactly 54 bytes to the modem.
    #[must_use]
    pub fn write(&self, frame: &[u8]) -> RepeaterAction {
        RepeaterAction::Send(frame.to_vec())
    }

    /// Pop one buffered inbound stream frame, if any.
    pub fn read(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }

    /// Advance timers by `ms` milliseconds; resend `PING` on expiry.
    pub fn clock(&mut self, ms: u64) -> Vec<RepeaterAction> {
        if self.ping_timer.clock(ms) {
            self.ping_timer.start();
            vec![self.send_ping()]
        } else {
            Vec::new()
        }
    }

    /// Handle an inbound datagram already confirmed to originate from
    /// [`Self::peer`].
    pub fn on_datagram(&mut self, source: SocketAddr, bytes: &[u8]) {
        if source != self.peer {
            return;
        }

        if bytes.len() >= 4 && &bytes[0..4] == b"M17 " {
            if self.inbound.len() < RING_BUFFER_CAPACITY {
                self.inbound.push_back(bytes.to_vec());
            }
            return;
        }

        match ReflectorPacket::decode(bytes) {
            Ok(ReflectorPacket::Ping) => {}
            _ => tracing::debug!(?bytes, "dropping unrecognized repeater-link packet"),
        }
    }

    fn send_ping(&self) -> RepeaterAction {
        RepeaterAction::Send(ReflectorPacket::Ping.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:17010".parse().unwrap()
    }

    #[test]
    fn open_sends_initial_ping() {
        let (_link, actions) = RepeaterLink::open(addr());
        assert_eq!(actions, vec![RepeaterAction::Send(b"PING".to_vec())]);
    }

    #[test]
    fn clock_resends_ping_on_period() {
        let (mut link, _) = RepeaterLink::open(addr());
        let actions = link.clock(PING_PERIOD_MS);
        assert_eq!(actions, vec![RepeaterAction::Send(b"PING".to_vec())]);
    }

    #[test]
    fn stream_frames_are_buffered() {
        let (mut link, _) = RepeaterLink::open(addr());
        let frame = vec![b'M', b'1', b'7', b' ', 0, 1];
        link.on_datagram(addr(), &frame);
        assert_eq!(link.read(), Some(frame));
        assert!(link.read().is_none());
    }

    #[test]
    fn ping_from_modem_is_consumed_silently() {
        let (mut link, _) = RepeaterLink::open(addr());
        link.on_datagram(addr(), b"PING");
        assert!(link.read().is_none());
    }

    #[test]
    fn wrong_source_is_dropped() {
        let (mut link, _) = RepeaterLink::open(addr());
        let other: SocketAddr = "10.0.0.2:1".parse().unwrap();
        link.on_datagram(other, &[b'M', b'1', b'7', b' ', 0, 0]);
        assert!(link.read().is_none());
    }
}
