//! Wires [`GatewayDriver`] to real UDP sockets and drives the cooperative
//! event loop described in `spec.md` §5: poll signals, then the reflector
//! socket, then the modem socket, then the remote-command socket (if
//! enabled), execute whatever actions fall out, advance every timer, sleep,
//! repeat.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use m17gw_core::collaborators::{NullAprsSink, NullModemProducer};
use m17gw_core::repeater_link::RepeaterLink;
use m17gw_core::session::{GatewayAction, GatewayDriver};
use m17gw_core::GatewayConfig;
use m17gw_proto::callsign;

use crate::error::ServerError;
use crate::resolver::StdResolver;
use crate::signals::{SignalIntent, SignalWatcher};
use crate::transport::{bind_nonblocking, recv_nonblocking, send_best_effort};

/// One iteration's sleep, matching the ~20ms frame cadence of an M17 stream
/// (a frame every 40ms; polling twice as often keeps jitter low without
/// spinning the CPU).
const TICK: Duration = Duration::from_millis(20);
/// Largest datagram we ever expect: network frame, comfortably over.
const RECV_BUF_LEN: usize = 1500;

/// Why the event loop returned control to `main`.
pub enum LoopExit {
    /// `SIGINT`/`SIGTERM` was received; the process should exit.
    Terminated {
        /// The signal that requested termination.
        signum: i32,
    },
    /// `SIGHUP` was received; `main` should rebuild the gateway from a
    /// freshly re-read configuration file and call [`run`] again.
    Restart,
}

/// Bind every socket the driver needs and perform the initial directory
/// load / startup-reflector link.
pub struct GatewayServer {
    driver: GatewayDriver<NullModemProducer, NullAprsSink>,
    reflector_socket: UdpSocket,
    repeater_socket: UdpSocket,
    remote_socket: Option<UdpSocket>,
    resolver: StdResolver,
}

impl GatewayServer {
    /// Build the gateway: resolve the modem address, bind all configured
    /// sockets, then construct the driver (which performs the initial
    /// directory load and, if configured, the startup-reflector link).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the modem address doesn't resolve, a
    /// socket fails to bind, or the initial directory load fails.
    pub fn build(config: GatewayConfig) -> Result<(Self, Vec<GatewayAction>), ServerError> {
        let resolver = StdResolver;

        let repeater_addr = (config.general.rpt_address.as_str(), config.general.rpt_port)
            .to_socket_addrs_or(&config.general.rpt_address)?;

        let unspecified = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let repeater_socket = bind_nonblocking("repeater", SocketAddr::new(unspecified, config.general.local_port))?;
        let reflector_socket = bind_nonblocking("reflector", SocketAddr::new(unspecified, config.network.port))?;
        let remote_socket = if config.remote_commands.enable {
            Some(bind_nonblocking(
                "remote-commands",
                SocketAddr::new(unspecified, config.remote_commands.port),
            )?)
        } else {
            None
        };

        let (repeater_link, repeater_initial) = RepeaterLink::open(repeater_addr);
        let padded = callsign::pad9(config.general.callsign.trim());
        let encoded_callsign = callsign::encode(&padded);

        let (driver, startup_actions) = GatewayDriver::new(
            config,
            encoded_callsign,
            repeater_link,
            &resolver,
            NullModemProducer,
            NullAprsSink,
        )?;

        let server = Self {
            driver,
            reflector_socket,
            repeater_socket,
            remote_socket,
            resolver,
        };

        let mut initial_actions = repeater_initial
            .into_iter()
            .map(GatewayAction::from)
            .collect::<Vec<_>>();
        initial_actions.extend(startup_actions);

        Ok((server, initial_actions))
    }

    /// Run the cooperative event loop until a signal requests termination
    /// or a hot-restart.
    pub fn run(&mut self, signals: &mut SignalWatcher, initial_actions: Vec<GatewayAction>) -> LoopExit {
        self.execute(initial_actions);

        let mut buf = [0u8; RECV_BUF_LEN];
        let mut last_tick = Instant::now();

        loop {
            match signals.poll() {
                SignalIntent::Terminate { signum } => return LoopExit::Terminated { signum },
                SignalIntent::Restart => return LoopExit::Restart,
                SignalIntent::None => {}
            }

            if let Some((len, from)) = self.recv_reflector(&mut buf) {
                let actions = self.driver.on_reflector_datagram(from, &buf[..len]);
                self.execute(actions);
            }

            if let Some((len, from)) = self.recv_repeater(&mut buf) {
                self.driver.on_modem_datagram(from, &buf[..len]);
            }

            if let Some((len, from)) = self.recv_remote(&mut buf) {
                let actions = self.driver.on_remote_command(from, &buf[..len]);
                self.execute(actions);
            }

            let actions = self.driver.service_frames();
            self.execute(actions);

            let elapsed = last_tick.elapsed();
            if elapsed < TICK {
                std::thread::sleep(TICK - elapsed);
            }
            let ms = last_tick.elapsed().as_millis() as u64;
            last_tick = Instant::now();
            let actions = self.driver.advance(ms, &self.resolver);
            self.execute(actions);
        }
    }

    fn recv_reflector(&self, buf: &mut [u8]) -> Option<(usize, SocketAddr)> {
        recv_nonblocking(&self.reflector_socket, buf).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "reflector socket recv error");
            None
        })
    }

    fn recv_repeater(&self, buf: &mut [u8]) -> Option<(usize, SocketAddr)> {
        recv_nonblocking(&self.repeater_socket, buf).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "repeater socket recv error");
            None
        })
    }

    fn recv_remote(&self, buf: &mut [u8]) -> Option<(usize, SocketAddr)> {
        let socket = self.remote_socket.as_ref()?;
        recv_nonblocking(socket, buf).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "remote-command socket recv error");
            None
        })
    }

    fn execute(&self, actions: Vec<GatewayAction>) {
        for action in actions {
            match action {
                GatewayAction::SendToReflector { to, bytes } => {
                    send_best_effort(&self.reflector_socket, to, &bytes);
                }
                GatewayAction::SendToModem(bytes) => {
                    send_best_effort(&self.repeater_socket, self.driver.repeater_peer(), &bytes);
                }
                GatewayAction::SendRemoteReply { to, bytes } => {
                    if let Some(socket) = &self.remote_socket {
                        send_best_effort(socket, to, &bytes);
                    }
                }
            }
        }
    }
}

trait ResolveOrErr {
    fn to_socket_addrs_or(&self, original: &str) -> Result<SocketAddr, ServerError>;
}

impl ResolveOrErr for (&str, u16) {
    fn to_socket_addrs_or(&self, original: &str) -> Result<SocketAddr, ServerError> {
        use std::net::ToSocketAddrs;
        self.to_socket_addrs()
            .map_err(|source| ServerError::ResolveRepeater {
                addr: original.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| ServerError::ResolveRepeater {
                addr: original.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses returned"),
            })
    }
}
