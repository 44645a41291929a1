//! Non-blocking UDP socket helpers.
//!
//! `spec.md` §5 requires every socket read to return immediately with a
//! no-data indication rather than block — the event loop polls everything
//! once per iteration. `std::net::UdpSocket::set_nonblocking` plus mapping
//! `WouldBlock` to `None` gives us exactly that without pulling in an async
//! runtime the single-threaded core has no use for.

use std::net::{SocketAddr, UdpSocket};

use crate::error::ServerError;

/// Bind a UDP socket on `bind_addr` and put it in non-blocking mode.
pub fn bind_nonblocking(purpose: &'static str, bind_addr: SocketAddr) -> Result<UdpSocket, ServerError> {
    let socket = UdpSocket::bind(bind_addr).map_err(|source| ServerError::Bind {
        purpose,
        addr: bind_addr.to_string(),
        source,
    })?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Receive one datagram without blocking. Returns `Ok(None)` if nothing was
/// ready (`WouldBlock`/`WouldBlockErr` on the platform), propagates any
/// other I/O error.
pub fn recv_nonblocking(socket: &UdpSocket, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, ServerError> {
    match socket.recv_from(buf) {
        Ok((len, from)) => Ok(Some((len, from))),
        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
        Err(err) => Err(ServerError::Io(err)),
    }
}

/// Send a datagram, logging (rather than propagating) transient failures —
/// a dropped reflector/modem datagram is recoverable by the protocol's own
/// retry timers, matching `spec.md` §7's "nothing in the core aborts the
/// process after startup".
pub fn send_best_effort(socket: &UdpSocket, to: SocketAddr, bytes: &[u8]) {
    if let Err(err) = socket.send_to(bytes, to) {
        tracing::warn!(%to, error = %err, "datagram send failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recv_without_data_returns_none() {
        let socket = bind_nonblocking("test", "127.0.0.1:0".parse().unwrap()).unwrap();
        let mut buf = [0u8; 64];
        assert!(recv_nonblocking(&socket, &mut buf).unwrap().is_none());
    }

    #[test]
    fn round_trips_a_datagram() {
        let a = bind_nonblocking("test-a", "127.0.0.1:0".parse().unwrap()).unwrap();
        let b = bind_nonblocking("test-b", "127.0.0.1:0".parse().unwrap()).unwrap();
        let b_addr = b.local_addr().unwrap();

        send_best_effort(&a, b_addr, b"hello");

        let mut buf = [0u8; 64];
        let mut received = None;
        for _ in 0..200 {
            if let Some((len, _from)) = recv_nonblocking(&b, &mut buf).unwrap() {
                received = Some(buf[..len].to_vec());
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(received.as_deref(), Some(&b"hello"[..]));
    }
}
