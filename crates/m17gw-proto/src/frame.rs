//! The 54-byte network frame exchanged with reflectors and (via the
//! repeater link) with the local modem.

use crate::errors::{ProtocolError, Result};
use crate::lsf::{Lsf, LSF_LENGTH};

/// The 4-byte magic prefix of every network frame.
pub const MAGIC: [u8; 4] = *b"M17 ";

/// Total on-wire length of a network frame.
pub const FRAME_LENGTH: usize = 54;

/// Length of the payload section.
pub const PAYLOAD_LENGTH: usize = 16;

/// Bit set in the frame-number field to mark the final frame of a
/// transmission.
pub const FN_EOT_MASK: u16 = 0x8000;

/// Offset of the LSF within a raw frame (after the magic and stream ID).
const LSF_OFFSET: usize = 6;
/// Offset of the frame-number field.
const FN_OFFSET: usize = LSF_OFFSET + LSF_LENGTH;
/// Offset of the payload.
const PAYLOAD_OFFSET: usize = FN_OFFSET + 2;
/// Offset of the trailing CRC.
const CRC_OFFSET: usize = PAYLOAD_OFFSET + PAYLOAD_LENGTH;

/// A parsed 54-byte `M17 ` network frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkFrame {
    /// 16-bit stream identifier, constant for the life of a transmission.
    pub stream_id: u16,
    /// The embedded Link Setup Frame.
    pub lsf: Lsf,
    /// Frame-number field; top bit is the end-of-transmission marker.
    pub fn_field: u16,
    /// 16 bytes of opaque payload (voice or packet data).
    pub payload: [u8; PAYLOAD_LENGTH],
    /// Trailing 2-byte CRC, carried through verbatim (not recomputed).
    pub crc: u16,
}

impl NetworkFrame {
    /// `true` if the frame-number field's top bit marks end-of-transmission.
    #[must_use]
    pub fn is_eot(&self) -> bool {
        self.fn_field & FN_EOT_MASK != 0
    }

    /// Parse a frame from its exact 54-byte wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::BufferTooShort`] if `bytes` is not exactly
    /// [`FRAME_LENGTH`] long.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FRAME_LENGTH {
            return Err(ProtocolError::BufferTooShort {
                expected: FRAME_LENGTH,
                actual: bytes.len(),
            });
        }

        let stream_id = u16::from_be_bytes([bytes[4], bytes[5]]);

        let mut lsf_bytes = [0u8; LSF_LENGTH];
        lsf_bytes.copy_from_slice(&bytes[LSF_OFFSET..LSF_OFFSET + LSF_LENGTH]);
        let lsf = Lsf::from_bytes(&lsf_bytes);

        let fn_field = u16::from_be_bytes([bytes[FN_OFFSET], bytes[FN_OFFSET + 1]]);

        let mut payload = [0u8; PAYLOAD_LENGTH];
        payload.copy_from_slice(&bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + PAYLOAD_LENGTH]);

        let crc = u16::from_be_bytes([bytes[CRC_OFFSET], bytes[CRC_OFFSET + 1]]);

        Ok(Self {
            stream_id,
            lsf,
            fn_field,
            payload,
            crc,
        })
    }

    /// Serialize the frame back to its exact 54-byte wire representation.
    #[must_use]
    pub fn encode(&self) -> [u8; FRAME_LENGTH] {
        let mut out = [0u8; FRAME_LENGTH];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..6].copy_from_slice(&self.stream_id.to_be_bytes());
        out[LSF_OFFSET..LSF_OFFSET + LSF_LENGTH].copy_from_slice(&self.lsf.to_bytes());
        out[FN_OFFSET..FN_OFFSET + 2].copy_from_slice(&self.fn_field.to_be_bytes());
        out[PAYLOAD_OFFSET..PAYLOAD_OFFSET + PAYLOAD_LENGTH].copy_from_slice(&self.payload);
        out[CRC_OFFSET..CRC_OFFSET + 2].copy_from_slice(&self.crc.to_be_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample_frame() -> NetworkFrame {
        let mut lsf_bytes = [0u8; LSF_LENGTH];
        lsf_bytes[0..6].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        lsf_bytes[6..12].copy_from_slice(&[7, 8, 9, 10, 11, 12]);
        NetworkFrame {
            stream_id: 0x1234,
            lsf: Lsf::from_bytes(&lsf_bytes),
            fn_field: 0x0005,
            payload: [0xAB; PAYLOAD_LENGTH],
            crc: 0xBEEF,
        }
    }

    #[test]
    fn encode_starts_with_magic() {
        let bytes = sample_frame().encode();
        assert_eq!(&bytes[0..4], b"M17 ");
        assert_eq!(bytes.len(), FRAME_LENGTH);
    }

    #[test]
    fn round_trips() {
        let frame = sample_frame();
        let bytes = frame.encode();
        let decoded = NetworkFrame::decode(&bytes).expect("decode");
        assert_eq!(decoded, frame);
    }

    #[test]
    fn eot_bit_is_read_from_fn_field() {
        let mut frame = sample_frame();
        assert!(!frame.is_eot());
        frame.fn_field |= FN_EOT_MASK;
        assert!(frame.is_eot());
    }

    #[test]
    fn rejects_wrong_length() {
        let err = NetworkFrame::decode(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::BufferTooShort {
                expected: FRAME_LENGTH,
                actual: 10,
            }
        );
    }

    proptest! {
        #[test]
        fn round_trip_arbitrary_bytes(
            stream_id: u16,
            dest: [u8; 6],
            source: [u8; 6],
            fn_field: u16,
            payload: [u8; PAYLOAD_LENGTH],
            crc: u16,
        ) {
            let mut lsf_bytes = [0u8; LSF_LENGTH];
            lsf_bytes[0..6].copy_from_slice(&dest);
            lsf_bytes[6..12].copy_from_slice(&source);
            let frame = NetworkFrame {
                stream_id,
                lsf: Lsf::from_bytes(&lsf_bytes),
                fn_field,
                payload,
                crc,
            };
            let bytes = frame.encode();
            let decoded = NetworkFrame::decode(&bytes).unwrap();
            prop_assert_eq!(decoded, frame);
        }
    }
}
