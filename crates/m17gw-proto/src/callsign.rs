//! Base-40 callsign codec.
//!
//! M17 callsigns are up to 9 characters from a 40-symbol alphabet, packed
//! into a 48-bit big-endian integer. See `spec.md` §4.A.

/// The 40-symbol callsign alphabet, indexed by base-40 digit value.
pub const ALPHABET: &[u8; 40] = b" ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-/.";

/// Maximum number of characters consumed from a callsign string.
const MAX_CALLSIGN_CHARS: usize = 9;

/// Contribution of a leading `#` to the encoded integer.
const HASH_PREFIX_VALUE: u64 = 262_144_000_000_000;

/// Encodings at or above this value (but below all-ones) are out of range.
const INVALID_THRESHOLD: u64 = 268_697_600_000_000;

/// The all-ones 48-bit encoding, reserved for the broadcast callsign.
const ALL_ENCODING: u64 = 0x0000_FFFF_FFFF_FFFF;

/// Decoded value for the broadcast callsign `ALL`, right-padded to 9 chars.
pub const ALL_CALLSIGN: &str = "ALL      ";

/// Encode a callsign string into its 6-byte big-endian base-40 representation.
///
/// Infallible: unrecognized characters are treated as spaces (digit 0), and
/// only the first 9 characters are consumed. A literal `"ALL      "` encodes
/// to the reserved all-ones value. A leading `#` contributes a fixed offset
/// and consumes one input position, matching the upstream gateway's
/// encoder.
#[must_use]
pub fn encode(callsign: &str) -> [u8; 6] {
    if callsign == ALL_CALLSIGN {
        return [0xFF; 6];
    }

    let chars: Vec<char> = callsign.chars().take(MAX_CALLSIGN_CHARS).collect();

    let mut enc: u64 = 0;
    for (i, &c) in chars.iter().enumerate().rev() {
        if i == 0 && c == '#' {
            enc += HASH_PREFIX_VALUE;
        } else {
            let pos = ALPHABET.iter().position(|&a| a == c as u8).unwrap_or(0) as u64;
            enc = enc * 40 + pos;
        }
    }

    let bytes = enc.to_be_bytes();
    let mut out = [0u8; 6];
    out.copy_from_slice(&bytes[2..8]);
    out
}

/// Decode a 6-byte big-endian base-40 encoding back into a callsign string.
///
/// Infallible. Returns `"ALL      "` for the all-ones encoding, `"Invalid"`
/// for encodings in the reserved-but-unused range, a `#`-prefixed string for
/// encodings carrying the hash-prefix offset, and the plain decoded string
/// otherwise. Trailing spaces are never appended by this function; callers
/// pad to 9 characters themselves when comparing.
#[must_use]
pub fn decode(encoded: &[u8; 6]) -> String {
    let mut buf = [0u8; 8];
    buf[2..8].copy_from_slice(encoded);
    let mut enc = u64::from_be_bytes(buf);

    if enc == ALL_ENCODING {
        return ALL_CALLSIGN.to_string();
    }

    if enc >= INVALID_THRESHOLD {
        return "Invalid".to_string();
    }

    let mut callsign = String::new();
    if enc >= HASH_PREFIX_VALUE {
        callsign.push('#');
        enc -= HASH_PREFIX_VALUE;
    }

    while enc > 0 {
        let digit = (enc % 40) as usize;
        callsign.push(ALPHABET[digit] as char);
        enc /= 40;
    }

    callsign
}

/// Right-pad (or truncate) a callsign to the standard 9-character field
/// width used for LSF destination/source comparisons.
#[must_use]
pub fn pad9(callsign: &str) -> String {
    let mut s: String = callsign.chars().take(9).collect();
    while s.chars().count() < 9 {
        s.push(' ');
    }
    s
}
