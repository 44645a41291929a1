//! Platform name resolution, backing [`m17gw_core::directory::Resolver`]
//! with `std::net::ToSocketAddrs`.

use std::net::{SocketAddr, ToSocketAddrs};

use m17gw_core::directory::Resolver;

/// Resolves hostnames via the platform resolver (`getaddrinfo` under the
/// hood, through `std::net::ToSocketAddrs`).
#[derive(Debug, Default, Clone, Copy)]
pub struct StdResolver;

impl Resolver for StdResolver {
    fn resolve_v4(&self, host: &str, port: u16) -> Option<SocketAddr> {
        (host, port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.find(SocketAddr::is_ipv4))
    }

    fn resolve_v6(&self, host: &str, port: u16) -> Option<SocketAddr> {
        (host, port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.find(SocketAddr::is_ipv6))
    }

    fn resolve_any(&self, host: &str, port: u16) -> Option<SocketAddr> {
        (host, port).to_socket_addrs().ok().and_then(|mut addrs| addrs.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_loopback_v4() {
        let addr = StdResolver.resolve_v4("127.0.0.1", 17000).unwrap();
        assert!(addr.is_ipv4());
        assert_eq!(addr.port(), 17000);
    }

    #[test]
    fn resolves_loopback_v6() {
        let addr = StdResolver.resolve_v6("::1", 17000).unwrap();
        assert!(addr.is_ipv6());
    }

    #[test]
    fn unresolvable_host_returns_none() {
        assert!(StdResolver.resolve_v4("this.host.does.not.exist.invalid", 1).is_none());
    }
}
