//! Error types for wire-format parsing.

use thiserror::Error;

/// Errors produced while parsing or building wire-format structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A buffer was shorter than the structure it was meant to hold.
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Minimum required length.
        expected: usize,
        /// Actual length supplied.
        actual: usize,
    },

    /// A reflector-protocol packet's leading 4 bytes did not match any known
    /// opcode.
    #[error("unknown reflector packet type: {0:?}")]
    UnknownPacketType([u8; 4]),

    /// A reflector-protocol packet had a recognized opcode but the wrong
    /// length for it.
    #[error("packet {opcode:?} had wrong length: expected {expected}, got {actual}")]
    WrongPacketLength {
        /// The 4-byte opcode tag.
        opcode: [u8; 4],
        /// Expected length for this opcode.
        expected: usize,
        /// Actual length supplied.
        actual: usize,
    },
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, ProtocolError>;
