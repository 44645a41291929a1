//! Production shell around `m17gw-core`: UDP transports, the cooperative
//! event loop, signal handling, and the binary's CLI surface. See
//! `SPEC_FULL.md`'s "Ambient stack" section.

pub mod error;
pub mod gateway;
pub mod resolver;
pub mod signals;
pub mod transport;

pub use error::ServerError;
pub use gateway::{GatewayServer, LoopExit};
