//! Reflector link: the protocol engine maintaining a UDP conversation with
//! one reflector. See `spec.md` §4.C.
//!
//! Pure state machine: [`ReflectorLink::clock`] and
//! [`ReflectorLink::on_datagram`] take events and return
//! [`ReflectorAction`]s; the caller (the session controller, ultimately
//! backed by real sockets in `m17gw-server`) performs the actual I/O.

use std::collections::VecDeque;
use std::net::SocketAddr;

use m17gw_proto::packet::ReflectorPacket;

use crate::timer::Timer;

/// Retry interval for `CONN`/`DISC` retransmission while linking/unlinking.
pub const RETRY_TIMEOUT_MS: u64 = 3_000;
/// Liveness timeout; no traffic from the peer for this long forces `FAILED`.
pub const LIVENESS_TIMEOUT_MS: u64 = 60_000;
/// Capacity of the inbound stream-frame ring buffer.
pub const RING_BUFFER_CAPACITY: usize = 1000;

/// Reflector-link connection status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    /// No active or pending conversation.
    NotLinked,
    /// `CONN` sent, awaiting `ACKN`/`NACK`.
    Linking,
    /// Handshake complete; frames flow both ways.
    Linked,
    /// `DISC` sent, awaiting acknowledgement or timeout.
    Unlinking,
    /// Peer answered `NACK`.
    Rejected,
    /// Liveness timeout elapsed while linked or linking.
    Failed,
}

/// Outcome of advancing or feeding the link state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReflectorAction {
    /// Send a raw reflector-protocol packet to `to` — captured at the
    /// moment the action is produced, so a `DISC` emitted by [`unlink`]
    /// is addressed to the peer being torn down even if a later `link()`
    /// in the same batch reassigns the stored peer before the caller
    /// executes the action (see `spec.md` tests #13 and #16).
    ///
    /// [`unlink`]: ReflectorLink::unlink
    Send {
        /// Destination address.
        to: SocketAddr,
        /// Packet bytes.
        bytes: Vec<u8>,
    },
}

/// The reflector-link protocol engine.
pub struct ReflectorLink {
    status: LinkStatus,
    peer: Option<SocketAddr>,
    encoded_callsign: [u8; 6],
    module: u8,
    retry_timer: Timer,
    liveness_timer: Timer,
    inbound: VecDeque<Vec<u8>>,
}

impl ReflectorLink {
    /// Construct a link engine in `NotLinked` state, identified on the wire
    /// by `encoded_callsign` (already base-40 encoded, padded and
    /// role-suffixed per `spec.md` §4.C).
    #[must_use]
    pub fn new(encoded_callsign: [u8; 6]) -> Self {
        Self {
            status: LinkStatus::NotLinked,
            peer: None,
            encoded_callsign,
            module: b'A',
            retry_timer: Timer::new(RETRY_TIMEOUT_MS),
            liveness_timer: Timer::new(LIVENESS_TIMEOUT_MS),
            inbound: VecDeque::new(),
        }
    }

    /// Current link status.
    #[must_use]
    pub fn status(&self) -> LinkStatus {
        self.status
    }

    /// Address of the currently selected peer, if any.
    #[must_use]
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Begin linking to `peer` on `module`. Resets any prior peer/state.
    /// The session controller is responsible for calling [`Self::unlink`]
    /// first if a different link is already active.
    pub fn link(&mut self, peer: SocketAddr, module: u8) -> Vec<ReflectorAction> {
        self.peer = Some(peer);
        self.module = module;
        self.status = LinkStatus::Linking;
        self.retry_timer.start();
        self.liveness_timer.start();
        vec![self.send_conn(peer)]
    }

    /// Begin unlinking. No-op unless currently `Linked` or `Linking`.
    pub fn unlink(&mut self) -> Vec<ReflectorAction> {
        if !matches!(self.status, LinkStatus::Linked | LinkStatus::Linking) {
            return Vec::new();
        }
        let Some(peer) = self.peer else {
            return Vec::new();
        };
        self.status = LinkStatus::Unlinking;
        self.retry_timer.start();
        self.liveness_timer.start();
        vec![self.send_disc(peer)]
    }

    /// Send a complete 54-byte `M17 ` frame to the peer. Only permitted
    /// while `Linked`; returns `None` otherwise.
    #[must_use]
    pub fn write(&self, frame: &[u8]) -> Option<ReflectorAction> {
        if self.status != LinkStatus::Linked {
            return None;
        }
        let peer = self.peer?;
        Some(ReflectorAction::Send {
            to: peer,
            bytes: frame.to_vec(),
        })
    }

    /// Pop one buffered inbound stream frame, if any.
    pub fn read(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }

    /// Advance timers by `ms` milliseconds.
    pub fn clock(&mut self, ms: u64) -> Vec<ReflectorAction> {
        let mut actions = Vec::new();

        if self.liveness_timer.clock(ms) {
            match self.status {
                LinkStatus::Linking | LinkStatus::Linked => {
                    self.status = LinkStatus::Failed;
                }
                LinkStatus::Unlinking => {
                    self.status = LinkStatus::NotLinked;
                }
                _ => {}
            }
            self.retry_timer.stop();
            self.liveness_timer.stop();
            return actions;
        }

        if self.retry_timer.clock(ms) {
            if let Some(peer) = self.peer {
                match self.status {
                    LinkStatus::Linking => {
                        actions.push(self.send_conn(peer));
                        self.retry_timer.start();
                    }
                    LinkStatus::Unlinking => {
                        actions.push(self.send_disc(peer));
                        self.retry_timer.start();
                    }
                    _ => {}
                }
            }
        }

        actions
    }

    /// Handle an inbound datagram already confirmed to originate from
    /// `source`; the caller drops datagrams whose source doesn't match
    /// [`Self::peer`] before calling this.
    pub fn on_datagram(&mut self, source: SocketAddr, bytes: &[u8]) -> Vec<ReflectorAction> {
        if self.peer != Some(source) {
            return Vec::new();
        }

        if bytes.len() >= 4 && &bytes[0..4] == b"M17 " {
            if self.status == LinkStatus::Linked {
                self.liveness_timer.start();
                if self.inbound.len() < RING_BUFFER_CAPACITY {
                    self.inbound.push_back(bytes.to_vec());
                }
            }
            return Vec::new();
        }

        let Ok(packet) = ReflectorPacket::decode(bytes) else {
            tracing::debug!(?bytes, "dropping unrecognized reflector packet");
            return Vec::new();
        };

        match packet {
            ReflectorPacket::Ackn => {
                self.retry_timer.stop();
                self.liveness_timer.start();
                self.status = LinkStatus::Linked;
                Vec::new()
            }
            ReflectorPacket::Nack => {
                self.retry_timer.stop();
                self.liveness_timer.stop();
                self.status = LinkStatus::Rejected;
                Vec::new()
            }
            ReflectorPacket::Disc { .. } => {
                self.retry_timer.stop();
                self.liveness_timer.stop();
                self.status = LinkStatus::NotLinked;
                Vec::new()
            }
            ReflectorPacket::Ping => {
                if self.status == LinkStatus::Linked {
                    self.liveness_timer.start();
                    vec![self.send_pong(source)]
                } else {
                    Vec::new()
                }
            }
            ReflectorPacket::Conn { .. } | ReflectorPacket::Pong { .. } => Vec::new(),
        }
    }

    fn send_conn(&self, to: SocketAddr) -> ReflectorAction {
        ReflectorAction::Send {
            to,
            bytes: ReflectorPacket::Conn {
                callsign: self.encoded_callsign,
                module: self.module,
            }
            .encode(),
        }
    }

    fn send_pong(&self, to: SocketAddr) -> ReflectorAction {
        ReflectorAction::Send {
            to,
            bytes: ReflectorPacket::Pong {
                callsign: self.encoded_callsign,
            }
            .encode(),
        }
    }

    fn send_disc(&self, to: SocketAddr) -> ReflectorAction {
        ReflectorAction::Send {
            to,
            bytes: ReflectorPacket::Disc {
                callsign: self.encoded_callsign,
            }
            .encode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:17000".parse().unwrap()
    }

    #[test]
    fn link_sends_conn_and_enters_linking() {
        let mut link = ReflectorLink::new([1; 6]);
        let actions = link.link(addr(), b'A');
        assert_eq!(link.status(), LinkStatus::Linking);
        assert_eq!(actions.len(), 1);
        let ReflectorAction::Send { to, bytes } = &actions[0];
        assert_eq!(*to, addr());
        assert_eq!(&bytes[0..4], b"CONN");
    }

    #[test]
    fn retry_retransmits_conn_while_linking() {
        let mut link = ReflectorLink::new([1; 6]);
        link.link(addr(), b'A');
        let actions = link.clock(RETRY_TIMEOUT_MS);
        assert_eq!(actions.len(), 1);
        assert_eq!(link.status(), LinkStatus::Linking);
    }

    #[test]
    fn liveness_timeout_fails_while_linking() {
        let mut link = ReflectorLink::new([1; 6]);
        link.link(addr(), b'A');
        link.clock(LIVENESS_TIMEOUT_MS);
        assert_eq!(link.status(), LinkStatus::Failed);
    }

    #[test]
    fn ackn_transitions_to_linked() {
        let mut link = ReflectorLink::new([1; 6]);
        link.link(addr(), b'A');
        link.on_datagram(addr(), &ReflectorPacket::Ackn.encode());
        assert_eq!(link.status(), LinkStatus::Linked);
    }

    #[test]
    fn ping_while_linked_produces_pong() {
        let mut link = ReflectorLink::new([1; 6]);
        link.link(addr(), b'A');
        link.on_datagram(addr(), &ReflectorPacket::Ackn.encode());
        let actions = link.on_datagram(addr(), b"PING");
        assert_eq!(actions.len(), 1);
        let ReflectorAction::Send { to, bytes } = &actions[0];
        assert_eq!(*to, addr());
        assert_eq!(&bytes[0..4], b"PONG");
    }

    #[test]
    fn liveness_timeout_while_linked_fails() {
        let mut link = ReflectorLink::new([1; 6]);
        link.link(addr(), b'A');
        link.on_datagram(addr(), &ReflectorPacket::Ackn.encode());
        link.clock(LIVENESS_TIMEOUT_MS);
        assert_eq!(link.status(), LinkStatus::Failed);
    }

    #[test]
    fn nack_rejects_with_no_further_retries() {
        let mut link = ReflectorLink::new([1; 6]);
        link.link(addr(), b'A');
        link.on_datagram(addr(), &ReflectorPacket::Nack.encode());
        assert_eq!(link.status(), LinkStatus::Rejected);
        assert!(link.clock(RETRY_TIMEOUT_MS).is_empty());
    }

    #[test]
    fn datagram_from_wrong_source_is_dropped() {
        let mut link = ReflectorLink::new([1; 6]);
        link.link(addr(), b'A');
        let other: SocketAddr = "10.0.0.1:1".parse().unwrap();
        link.on_datagram(other, &ReflectorPacket::Ackn.encode());
        assert_eq!(link.status(), LinkStatus::Linking);
    }

    #[test]
    fn stream_frames_only_buffered_while_linked() {
        let mut link = ReflectorLink::new([1; 6]);
        link.link(addr(), b'A');
        let frame = vec![b'M', b'1', b'7', b' ', 0, 0];
        link.on_datagram(addr(), &frame);
        assert!(link.read().is_none());

        link.on_datagram(addr(), &ReflectorPacket::Ackn.encode());
        link.on_datagram(addr(), &frame);
        assert_eq!(link.read(), Some(frame));
    }

    #[test]
    fn write_only_permitted_while_linked() {
        let mut link = ReflectorLink::new([1; 6]);
        assert!(link.write(&[0u8; 54]).is_none());
        link.link(addr(), b'A');
        assert!(link.write(&[0u8; 54]).is_none());
        link.on_datagram(addr(), &ReflectorPacket::Ackn.encode());
        assert!(link.write(&[0u8; 54]).is_some());
    }
}
