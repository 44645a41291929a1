//! Reflector-protocol control packets: `CONN`, `ACKN`, `NACK`, `PING`,
//! `PONG`, `DISC`. See `spec.md` §4.C's wire table.

use crate::errors::{ProtocolError, Result};

/// `CONN` opcode tag.
pub const CONN: [u8; 4] = *b"CONN";
/// `ACKN` opcode tag.
pub const ACKN: [u8; 4] = *b"ACKN";
/// `NACK` opcode tag.
pub const NACK: [u8; 4] = *b"NACK";
/// `PING` opcode tag.
pub const PING: [u8; 4] = *b"PING";
/// `PONG` opcode tag.
pub const PONG: [u8; 4] = *b"PONG";
/// `DISC` opcode tag.
pub const DISC: [u8; 4] = *b"DISC";

/// Wire length of a `CONN` packet.
pub const CONN_LENGTH: usize = 11;
/// Wire length of an `ACKN` packet.
pub const ACKN_LENGTH: usize = 4;
/// Wire length of a `NACK` packet.
pub const NACK_LENGTH: usize = 4;
/// Wire length of a `PONG` packet.
pub const PONG_LENGTH: usize = 10;
/// Wire length of a `DISC` packet.
pub const DISC_LENGTH: usize = 10;

/// A decoded reflector-protocol control packet.
///
/// `PING` is intentionally not represented here with its payload: per
/// `spec.md` §4.C it is peer-side only and we merely recognize its tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReflectorPacket {
    /// Link request: encoded source callsign plus a module letter.
    Conn {
        /// 6-byte base-40 encoded callsign (with role suffix already
        /// applied).
        callsign: [u8; 6],
        /// Requested reflector module, `A`-`Z`.
        module: u8,
    },
    /// Link accepted.
    Ackn,
    /// Link refused.
    Nack,
    /// Liveness probe from the peer.
    Ping,
    /// Liveness reply, echoing our encoded callsign.
    Pong {
        /// 6-byte base-40 encoded callsign.
        callsign: [u8; 6],
    },
    /// Teardown notice, carrying the encoded callsign of the initiator.
    Disc {
        /// 6-byte base-40 encoded callsign.
        callsign: [u8; 6],
    },
}

impl ReflectorPacket {
    /// Parse a reflector-protocol control packet from its raw bytes.
    ///
    /// Does not attempt to parse `M17 ` stream frames; callers should check
    /// the leading 4 bytes and route those to [`crate::frame::NetworkFrame`]
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::BufferTooShort`] if fewer than 4 bytes are
    /// supplied, [`ProtocolError::UnknownPacketType`] if the opcode is not
    /// recognized, and [`ProtocolError::WrongPacketLength`] if a recognized
    /// opcode's payload length does not match the wire table.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(ProtocolError::BufferTooShort {
                expected: 4,
                actual: bytes.len(),
            });
        }

        let mut opcode = [0u8; 4];
        opcode.copy_from_slice(&bytes[0..4]);

        match opcode {
            CONN => {
                if bytes.len() != CONN_LENGTH {
                    return Err(ProtocolError::WrongPacketLength {
                        opcode,
                        expected: CONN_LENGTH,
                        actual: bytes.len(),
                    });
                }
                let mut callsign = [0u8; 6];
                callsign.copy_from_slice(&bytes[4..10]);
                Ok(Self::Conn {
                    callsign,
                    module: bytes[10],
                })
            }
            ACKN => {
                if bytes.len() != ACKN_LENGTH {
                    return Err(ProtocolError::WrongPacketLength {
                        opcode,
                        expected: ACKN_LENGTH,
                        actual: bytes.len(),
                    });
                }
                Ok(Self::Ackn)
            }
            NACK => {
                if bytes.len() != NACK_LENGTH {
                    return Err(ProtocolError::WrongPacketLength {
                        opcode,
                        expected: NACK_LENGTH,
                        actual: bytes.len(),
                    });
                }
                Ok(Self::Nack)
            }
            PING => Ok(Self::Ping),
            PONG => {
                if bytes.len() != PONG_LENGTH {
                    return Err(ProtocolError::WrongPacketLength {
                        opcode,
                        expected: PONG_LENGTH,
                        actual: bytes.len(),
                    });
                }
                let mut callsign = [0u8; 6];
                callsign.copy_from_slice(&bytes[4..10]);
                Ok(Self::Pong { callsign })
            }
            DISC => {
                if bytes.len() != DISC_LENGTH {
                    return Err(ProtocolError::WrongPacketLength {
                        opcode,
                        expected: DISC_LENGTH,
                        actual: bytes.len(),
                    });
                }
                let mut callsign = [0u8; 6];
                callsign.copy_from_slice(&bytes[4..10]);
                Ok(Self::Disc { callsign })
            }
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    /// Serialize this packet to its wire bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Conn { callsign, module } => {
                let mut out = Vec::with_capacity(CONN_LENGTH);
                out.extend_from_slice(&CONN);
                out.extend_from_slice(callsign);
                out.push(*module);
                out
            }
            Self::Ackn => ACKN.to_vec(),
            Self::Nack => NACK.to_vec(),
            Self::Ping => PING.to_vec(),
            Self::Pong { callsign } => {
                let mut out = Vec::with_capacity(PONG_LENGTH);
                out.extend_from_slice(&PONG);
                out.extend_from_slice(callsign);
                out
            }
            Self::Disc { callsign } => {
                let mut out = Vec::with_capacity(DISC_LENGTH);
                out.extend_from_slice(&DISC);
                out.extend_from_slice(callsign);
                out
            }
        }
    }
}
