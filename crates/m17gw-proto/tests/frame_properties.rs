//! Property-based round-trip tests for the wire types, run as integration
//! tests against the public API surface only.

use m17gw_proto::callsign;
use m17gw_proto::frame::{NetworkFrame, FRAME_LENGTH, PAYLOAD_LENGTH};
use m17gw_proto::lsf::{Lsf, LSF_LENGTH};
use proptest::prelude::*;

fn legal_char() -> impl Strategy<Value = char> {
    (0usize..40).prop_map(|i| callsign::ALPHABET[i] as char)
}

proptest! {
    #[test]
    fn callsign_round_trip_without_hash(
        s in prop::collection::vec(legal_char(), 1..=9)
    ) {
        let s: String = s.into_iter().collect();
        let expected = s.trim_end_matches(' ').to_string();
        let decoded = callsign::decode(&callsign::encode(&s));
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn frame_round_trip(
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
        prop_assert_eq!(bytes.len(), FRAME_LENGTH);
        let decoded = NetworkFrame::decode(&bytes).unwrap();
        prop_assert_eq!(decoded, frame);
    }
}
