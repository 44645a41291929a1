//! Link Setup Frame (LSF) layout and bit-level accessors.
//!
//! The LSF is the 28-byte header carried inside every network frame:
//! destination callsign (6 B), source callsign (6 B), a 2-byte type field,
//! and a 14-byte META section. See `spec.md` §3 and §4 "Frame translation
//! helpers".

use zerocopy::{Immutable, IntoBytes, KnownLayout, FromBytes};

/// Length of the LSF in bytes.
pub const LSF_LENGTH: usize = 28;

/// Length of the META section in bytes.
pub const META_LENGTH: usize = 14;

/// Data-type value for a packet (as opposed to a stream) frame.
pub const DATA_TYPE_PACKET: u8 = 1;
/// Data-type value for voice-only stream content.
pub const DATA_TYPE_VOICE: u8 = 2;
/// Data-type value for mixed voice+data stream content.
pub const DATA_TYPE_VOICE_DATA: u8 = 3;

/// Encryption-type value meaning "no encryption".
pub const ENCRYPTION_TYPE_NONE: u8 = 0;

/// Encryption-subtype value meaning the META field carries a GPS position.
pub const ENCRYPTION_SUBTYPE_GPS: u8 = 1;
/// Encryption-subtype value meaning the META field carries callsign text.
pub const ENCRYPTION_SUBTYPE_CALLSIGNS: u8 = 2;

/// The 28-byte Link Setup Frame, laid out exactly as it appears on the wire.
///
/// Byte layout: `dest[0..6]`, `source[6..12]`, `type_bits[12..14]`,
/// `meta[14..28]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
pub struct Lsf {
    dest: [u8; 6],
    source: [u8; 6],
    type_bits: [u8; 2],
    meta: [u8; META_LENGTH],
}

impl Lsf {
    /// Build an LSF from its raw 28-byte wire representation.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; LSF_LENGTH]) -> Self {
        Self::read_from_bytes(bytes).unwrap_or_else(|_| unreachable!("fixed-size array"))
    }

    /// Serialize this LSF back to its raw 28-byte wire representation.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; LSF_LENGTH] {
        let mut out = [0u8; LSF_LENGTH];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// The raw 6-byte encoded destination callsign.
    #[must_use]
    pub fn dest(&self) -> [u8; 6] {
        self.dest
    }

    /// Overwrite the raw 6-byte encoded destination callsign.
    pub fn set_dest(&mut self, dest: [u8; 6]) {
        self.dest = dest;
    }

    /// The raw 6-byte encoded source callsign.
    #[must_use]
    pub fn source(&self) -> [u8; 6] {
        self.source
    }

    /// Overwrite the raw 6-byte encoded source callsign.
    pub fn set_source(&mut self, source: [u8; 6]) {
        self.source = source;
    }

    /// The 14-byte META section.
    #[must_use]
    pub fn meta(&self) -> [u8; META_LENGTH] {
        self.meta
    }

    /// Overwrite the 14-byte META section.
    pub fn set_meta(&mut self, meta: [u8; META_LENGTH]) {
        self.meta = meta;
    }

    /// `true` if this is a packet frame, `false` if it's a stream frame.
    #[must_use]
    pub fn is_packet(&self) -> bool {
        self.type_bits[1] & 0x01 != 0
    }

    /// Set the packet/stream flag.
    pub fn set_packet(&mut self, packet: bool) {
        if packet {
            self.type_bits[1] |= 0x01;
        } else {
            self.type_bits[1] &= !0x01;
        }
    }

    /// The 2-bit data-type field.
    #[must_use]
    pub fn data_type(&self) -> u8 {
        (self.type_bits[1] >> 1) & 0x03
    }

    /// Set the 2-bit data-type field.
    pub fn set_data_type(&mut self, value: u8) {
        self.type_bits[1] = (self.type_bits[1] & !0x06) | ((value & 0x03) << 1);
    }

    /// The 2-bit encryption-type field.
    #[must_use]
    pub fn encryption_type(&self) -> u8 {
        (self.type_bits[1] >> 3) & 0x03
    }

    /// Set the 2-bit encryption-type field.
    pub fn set_encryption_type(&mut self, value: u8) {
        self.type_bits[1] = (self.type_bits[1] & !0x18) | ((value & 0x03) << 3);
    }

    /// The 2-bit encryption-subtype field.
    #[must_use]
    pub fn encryption_subtype(&self) -> u8 {
        (self.type_bits[1] >> 5) & 0x03
    }

    /// Set the 2-bit encryption-subtype field.
    pub fn set_encryption_subtype(&mut self, value: u8) {
        self.type_bits[1] = (self.type_bits[1] & !0x60) | ((value & 0x03) << 5);
    }

    /// The 4-bit channel-access-number: the top bit lives in byte 1's top
    /// bit, the low three bits in byte 0's low three bits.
    #[must_use]
    pub fn can(&self) -> u8 {
        let high = self.type_bits[0] & 0x07;
        let low = (self.type_bits[1] >> 7) & 0x01;
        (high << 1) | low
    }

    /// Set the 4-bit channel-access-number.
    pub fn set_can(&mut self, value: u8) {
        let high = (value >> 1) & 0x07;
        let low = value & 0x01;
        self.type_bits[0] = (self.type_bits[0] & !0x07) | high;
        self.type_bits[1] = (self.type_bits[1] & !0x80) | (low << 7);
    }
}
