//! Top-level daemon error type.

use thiserror::Error;

/// Errors that can abort the daemon at startup. Nothing past startup uses
/// this type — runtime errors are logged and recovered per `spec.md` §7.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The configuration file could not be loaded or parsed.
    #[error("loading configuration: {0}")]
    Config(#[from] m17gw_core::errors::ConfigError),

    /// The initial reflector directory load failed.
    #[error("loading reflector directory: {0}")]
    Directory(#[from] m17gw_core::errors::DirectoryError),

    /// A required UDP socket could not be bound.
    #[error("binding {purpose} socket to {addr}: {source}")]
    Bind {
        /// Which socket failed to bind (e.g. "repeater", "reflector").
        purpose: &'static str,
        /// The address that was attempted.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configured modem (repeater) address did not resolve.
    #[error("resolving repeater address {addr}: {source}")]
    ResolveRepeater {
        /// The configured address string.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A socket operation failed in a way that isn't just "no data ready".
    #[error("socket I/O: {0}")]
    Io(#[from] std::io::Error),
}
