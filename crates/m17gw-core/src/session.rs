//! Session controller: the top-level state machine described in
//! `spec.md` §4.F. This is the hard part — it arbitrates the reflector
//! link, the repeater link, the echo engine, the directory, and the
//! voice-prompt/APRS collaborators, and performs the frame rewriting
//! described in §4.F's "Reflector-to-modem rewriting" and
//! "Echo-to-modem rewriting" sections.
//!
//! Following `spec.md` §5, this is a pure, I/O-free state machine: callers
//! feed it datagrams as they arrive and call [`GatewayDriver::advance`]
//! once per loop iteration; every action that requires real I/O comes back
//! as a [`GatewayAction`] for the caller (`m17gw-server`) to execute.

use std::net::SocketAddr;

use m17gw_proto::frame::{NetworkFrame, FN_EOT_MASK};
use m17gw_proto::lsf::{ENCRYPTION_SUBTYPE_CALLSIGNS, ENCRYPTION_TYPE_NONE, META_LENGTH};
use m17gw_proto::callsign;

use crate::collaborators::{AprsSink, ModemProducer};
use crate::config::{self, GatewayConfig};
use crate::directory::{ReflectorDirectory, ReflectorRecord, Resolver};
use crate::echo::{EchoEngine, EchoReadResult};
use crate::errors::DirectoryError;
use crate::reflector_link::{LinkStatus, ReflectorAction, ReflectorLink};
use crate::repeater_link::{RepeaterAction, RepeaterLink};
use crate::timer::Timer;

/// Default echo buffer size, in seconds, matching upstream's constructor
/// argument in `M17Gateway.cpp`.
pub const ECHO_TIMEOUT_SECONDS: u32 = 240;

/// META-injection cadence: the frame counter beyond which the rewrite
/// fires, and the value beyond which it wraps back to zero. See
/// `SPEC_FULL.md`'s "Supplemented features" section.
const META_INJECT_FROM: u32 = 40;
const META_INJECT_UNTIL: u32 = 45;

/// Top-level session state. See `spec.md` §3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// No reflector selected, or the most recent selection fully unlinked.
    NotLinked,
    /// `CONN` sent to a reflector, awaiting the handshake to complete.
    Linking,
    /// Reflector handshake complete; frames flow both ways.
    Linked,
    /// `DISC` sent, tearing down the current reflector link.
    Unlinking,
    /// Replaying the echo buffer to the modem; `old_status` will be
    /// restored once playback ends.
    Echo,
}

/// An I/O action the caller must perform: send bytes somewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayAction {
    /// Send bytes to a reflector peer, captured at the moment the action
    /// was produced (see [`ReflectorAction::Send`]).
    SendToReflector {
        /// Destination address.
        to: SocketAddr,
        /// Packet bytes.
        bytes: Vec<u8>,
    },
    /// Send bytes to the modem.
    SendToModem(Vec<u8>),
    /// Send an ASCII reply back to a remote-command client.
    SendRemoteReply {
        /// Destination address (the command's source).
        to: SocketAddr,
        /// Reply payload.
        bytes: Vec<u8>,
    },
}

impl From<ReflectorAction> for GatewayAction {
    fn from(action: ReflectorAction) -> Self {
        let ReflectorAction::Send { to, bytes } = action;
        Self::SendToReflector { to, bytes }
    }
}

impl From<RepeaterAction> for GatewayAction {
    fn from(action: RepeaterAction) -> Self {
        let RepeaterAction::Send(bytes) = action;
        Self::SendToModem(bytes)
    }
}

fn pick_addr(record: &ReflectorRecord) -> Option<SocketAddr> {
    record.ipv4.or(record.ipv6)
}

/// The session controller. Generic over the voice-prompt producer and
/// APRS/GPS sink so tests and the production binary can each supply their
/// own collaborator implementations (see `m17gw-core::collaborators`).
pub struct GatewayDriver<P: ModemProducer, A: AprsSink> {
    config: GatewayConfig,
    status: SessionStatus,
    old_status: SessionStatus,
    reflector: Option<ReflectorRecord>,
    module: u8,
    reflector_link: ReflectorLink,
    repeater_link: RepeaterLink,
    echo: EchoEngine,
    directory: ReflectorDirectory,
    hang_timer: Timer,
    meta_counter: u32,
    startup_reflector: String,
    trigger_voice: bool,
    voice: P,
    aprs: A,
}

impl<P: ModemProducer, A: AprsSink> GatewayDriver<P, A> {
    /// Construct the driver: loads the reflector directory (fatal if it
    /// fails, matching `spec.md` §7) and performs the startup-reflector
    /// linking sequence from `spec.md` §4.F if configured.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the initial directory load fails.
    pub fn new(
        config: GatewayConfig,
        local_encoded_callsign: [u8; 6],
        repeater_link: RepeaterLink,
        resolver: &impl Resolver,
        voice: P,
        aprs: A,
    ) -> Result<(Self, Vec<GatewayAction>), DirectoryError> {
        let mut directory = ReflectorDirectory::new(
            config.network.hosts_file1.clone(),
            config.network.hosts_file2.clone(),
            config.network.reload_time,
        );
        directory.load(resolver)?;

        let hang_timer = Timer::new(u64::from(config.network.hang_time) * 1000);
        let startup_reflector = config.normalized_startup();

        let mut driver = Self {
            status: SessionStatus::NotLinked,
            old_status: SessionStatus::NotLinked,
            reflector: None,
            module: b'A',
            reflector_link: ReflectorLink::new(local_encoded_callsign),
            repeater_link,
            echo: EchoEngine::new(ECHO_TIMEOUT_SECONDS),
            directory,
            hang_timer,
            meta_counter: 0,
            startup_reflector: startup_reflector.clone(),
            trigger_voice: false,
            voice,
            aprs,
            config,
        };

        let mut actions = Vec::new();
        if startup_reflector.len() == 9
            && startup_reflector.as_bytes()[8].is_ascii_uppercase()
        {
            let key: String = startup_reflector.chars().take(7).collect();
            if let Some(record) = driver.directory.find(&key).cloned() {
                let module = startup_reflector.as_bytes()[8];
                actions.extend(driver.begin_link(record, module));
            }
        }
        driver.voice.start();

        Ok((driver, actions))
    }

    /// Current session status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The currently selected reflector record, if any.
    #[must_use]
    pub fn current_reflector(&self) -> Option<&ReflectorRecord> {
        self.reflector.as_ref()
    }

    /// The reflector-link peer address, if a link is active. Informational
    /// only — a [`GatewayAction::SendToReflector`] already carries its own
    /// destination and must not be resolved against this accessor.
    #[must_use]
    pub fn reflector_peer(&self) -> Option<SocketAddr> {
        self.reflector_link.peer()
    }

    /// The repeater-link (modem) peer address a
    /// [`GatewayAction::SendToModem`] should be sent to.
    #[must_use]
    pub fn repeater_peer(&self) -> SocketAddr {
        self.repeater_link.peer()
    }

    fn begin_link(&mut self, record: ReflectorRecord, module: u8) -> Vec<GatewayAction> {
        let mut actions = Vec::new();
        let Some(addr) = pick_addr(&record) else {
            tracing::warn!(name = %record.name, "reflector record has no usable address");
            return actions;
        };
        self.module = module;
        self.status = SessionStatus::Linking;
        self.old_status = SessionStatus::Linking;
        actions.extend(
            self.reflector_link
                .link(addr, module)
                .into_iter()
                .map(GatewayAction::from),
        );
        self.voice.linked_to(record.name.trim_end());
        self.reflector = Some(record);
        actions
    }

    /// Feed an inbound reflector-socket datagram already confirmed to
    /// originate from the stored peer address.
    pub fn on_reflector_datagram(&mut self, source: SocketAddr, bytes: &[u8]) -> Vec<GatewayAction> {
        self.reflector_link
            .on_datagram(source, bytes)
            .into_iter()
            .map(GatewayAction::from)
            .collect()
    }

    /// Feed an inbound repeater-socket (modem) datagram.
    pub fn on_modem_datagram(&mut self, source: SocketAddr, bytes: &[u8]) {
        self.repeater_link.on_datagram(source, bytes);
    }

    /// Handle a remote-command datagram. See `spec.md` §4.F "Remote-command
    /// socket".
    pub fn on_remote_command(&mut self, source: SocketAddr, bytes: &[u8]) -> Vec<GatewayAction> {
        let mut actions = Vec::new();
        let Ok(text) = std::str::from_utf8(bytes) else {
            tracing::debug!("dropping non-UTF8 remote command");
            return actions;
        };
        let text = text.trim();

        if let Some(rest) = text.strip_prefix("Reflector ") {
            actions.extend(self.handle_remote_reflector_command(rest));
        } else if text == "status" {
            let reply = if self.reflector_link.status() == LinkStatus::Linked {
                "m17:conn"
            } else {
                "m17:disc"
            };
            actions.push(GatewayAction::SendRemoteReply {
                to: source,
                bytes: reply.as_bytes().to_vec(),
            });
        } else if text == "host" {
            let reply = match &self.reflector {
                Some(r) => format!("m17:\"{}\"", r.name.trim_end().replace(' ', "_")),
                None => "m17:\"NONE\"".to_string(),
            };
            actions.push(GatewayAction::SendRemoteReply {
                to: source,
                bytes: reply.into_bytes(),
            });
        } else {
            tracing::debug!(text, "dropping unknown remote command");
        }

        actions
    }

    fn handle_remote_reflector_command(&mut self, raw_name: &str) -> Vec<GatewayAction> {
        let mut actions = Vec::new();
        let normalized = config::normalize_reflector_name(raw_name);
        let key: String = normalized.chars().take(7).collect();
        let module = normalized.as_bytes().get(8).copied().unwrap_or(b' ');

        let differs = self.reflector.as_ref().is_none_or(|r| r.name != key);
        if !differs {
            return actions;
        }

        if matches!(self.status, SessionStatus::Linked | SessionStatus::Linking) {
            actions.extend(self.reflector_link.unlink().into_iter().map(GatewayAction::from));
            self.hang_timer.stop();
        }

        match self.directory.find(&key).cloned() {
            Some(record) if module.is_ascii_uppercase() => {
                actions.extend(self.begin_link(record, module));
                self.voice.start();
                self.hang_timer.start();
            }
            _ => {
                self.reflector = None;
                if matches!(self.status, SessionStatus::Linked | SessionStatus::Linking) {
                    self.status = SessionStatus::Unlinking;
                    self.old_status = SessionStatus::Unlinking;
                }
                self.voice.unlinked();
                self.voice.start();
                self.hang_timer.stop();
            }
        }

        actions
    }

    /// Perform one iteration's worth of frame servicing: reconcile session
    /// status against link status, drain one reflector-to-modem frame, one
    /// echo-to-modem frame, one modem-to-reflector/control frame, and
    /// service the voice-prompt producer. See `spec.md` §4.F and §5
    /// ("Ordering").
    pub fn service_frames(&mut self) -> Vec<GatewayAction> {
        let mut actions = Vec::new();
        actions.extend(self.reconcile());
        actions.extend(self.service_reflector_to_modem());
        actions.extend(self.service_echo_to_modem());
        actions.extend(self.service_modem());
        actions.extend(self.service_voice());
        actions
    }

    fn reconcile(&mut self) -> Vec<GatewayAction> {
        let mut actions = Vec::new();
        let link_status = self.reflector_link.status();

        match self.status {
            SessionStatus::Linking => match link_status {
                LinkStatus::Linking => {}
                LinkStatus::Linked => {
                    self.status = SessionStatus::Linked;
                    tracing::info!(
                        reflector = self.reflector.as_ref().map(|r| r.name.clone()),
                        "reflector link established"
                    );
                }
                LinkStatus::Rejected => {
                    self.status = SessionStatus::NotLinked;
                    self.old_status = SessionStatus::NotLinked;
                    self.voice.unlinked();
                }
                LinkStatus::Failed | LinkStatus::NotLinked | LinkStatus::Unlinking => {
                    actions.extend(self.retry_link());
                }
            },
            SessionStatus::Linked => match link_status {
                LinkStatus::Linked => {}
                LinkStatus::Failed => {
                    actions.extend(self.retry_link());
                    self.status = SessionStatus::Linking;
                }
                _ => {
                    self.status = SessionStatus::NotLinked;
                    self.old_status = SessionStatus::NotLinked;
                    self.voice.unlinked();
                }
            },
            SessionStatus::Unlinking => {
                if link_status != LinkStatus::Unlinking {
                    self.status = SessionStatus::NotLinked;
                }
            }
            SessionStatus::NotLinked | SessionStatus::Echo => {}
        }

        actions
    }

    fn retry_link(&mut self) -> Vec<GatewayAction> {
        let Some(record) = self.reflector.clone() else {
            return Vec::new();
        };
        let Some(addr) = pick_addr(&record) else {
            return Vec::new();
        };
        self.reflector_link
            .link(addr, self.module)
            .into_iter()
            .map(GatewayAction::from)
            .collect()
    }

    /// Build the META field injected every `spec.md` §4.F cadence, with the
    /// reflector half populated — used by the reflector-to-modem path.
    fn inject_meta(source: [u8; 6], reflector: [u8; 6]) -> [u8; META_LENGTH] {
        let mut meta = [0u8; META_LENGTH];
        meta[0..6].copy_from_slice(&source);
        meta[6..12].copy_from_slice(&reflector);
        meta
    }

    /// Advance the META-injection counter, returning `true` if this frame
    /// should carry the rewritten META per the cadence in `SPEC_FULL.md`.
    fn should_inject_meta(&mut self) -> bool {
        let inject = self.meta_counter > META_INJECT_FROM;
        if inject && self.meta_counter > META_INJECT_UNTIL {
            self.meta_counter = 0;
        }
        self.meta_counter += 1;
        inject
    }

    fn service_reflector_to_modem(&mut self) -> Vec<GatewayAction> {
        if self.status != SessionStatus::Linked {
            return Vec::new();
        }
        let Some(bytes) = self.reflector_link.read() else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        match NetworkFrame::decode(&bytes) {
            Ok(mut frame) => {
                let source = frame.lsf.source();
                if self.should_inject_meta() {
                    frame.lsf.set_encryption_type(ENCRYPTION_TYPE_NONE);
                    frame.lsf.set_encryption_subtype(ENCRYPTION_SUBTYPE_CALLSIGNS);
                    let reflector_encoded = self
                        .reflector
                        .as_ref()
                        .map_or([0u8; 6], |r| callsign::encode(&r.name));
                    frame.lsf.set_meta(Self::inject_meta(source, reflector_encoded));
                }
                frame.lsf.set_dest(callsign::encode(callsign::ALL_CALLSIGN));

                let is_eot = frame.fn_field & FN_EOT_MASK != 0;
                if !self.voice.is_busy() {
                    actions.push(GatewayAction::SendToModem(frame.encode().to_vec()));
                }
                self.hang_timer.start();
                if is_eot {
                    self.meta_counter = 0;
                }
            }
            Err(err) => tracing::debug!(error = %err, "dropping malformed reflector-to-modem frame"),
        }

        actions
    }

    fn service_echo_to_modem(&mut self) -> Vec<GatewayAction> {
        if self.status != SessionStatus::Echo {
            return Vec::new();
        }

        let mut buf = [0u8; m17gw_proto::frame::FRAME_LENGTH];
        match self.echo.read(&mut buf) {
            EchoReadResult::Data => match NetworkFrame::decode(&buf) {
                Ok(mut frame) => {
                    let source = frame.lsf.source();
                    if self.should_inject_meta() {
                        frame.lsf.set_encryption_type(ENCRYPTION_TYPE_NONE);
                        frame.lsf.set_encryption_subtype(ENCRYPTION_SUBTYPE_CALLSIGNS);
                        frame.lsf.set_meta(Self::inject_meta(source, [0u8; 6]));
                    }

                    let mut actions = Vec::new();
                    if !self.voice.is_busy() {
                        actions.push(GatewayAction::SendToModem(frame.encode().to_vec()));
                    }
                    self.hang_timer.start();
                    actions
                }
                Err(err) => {
                    tracing::debug!(error = %err, "dropping malformed echo-to-modem frame");
                    Vec::new()
                }
            },
            EchoReadResult::End => {
                self.status = self.old_status;
                self.meta_counter = 0;
                Vec::new()
            }
            EchoReadResult::None => Vec::new(),
        }
    }

    fn service_modem(&mut self) -> Vec<GatewayAction> {
        let Some(bytes) = self.repeater_link.read() else {
            return Vec::new();
        };

        let Ok(frame) = NetworkFrame::decode(&bytes) else {
            tracing::debug!("dropping malformed modem frame");
            return Vec::new();
        };

        self.aprs.process(&frame.lsf);

        let dest = callsign::decode(&frame.lsf.dest());
        let is_eot = frame.fn_field & FN_EOT_MASK != 0;

        match dest.as_str() {
            "ECHO" => {
                if self.status != SessionStatus::Echo {
                    self.old_status = self.status;
                    self.echo.clear();
                }
                self.echo.write(&bytes);
                self.status = SessionStatus::Echo;
                self.hang_timer.start();
                if is_eot {
                    self.echo.end();
                }
                Vec::new()
            }
            "INFO" => {
                self.hang_timer.start();
                self.trigger_voice = true;
                Vec::new()
            }
            "UNLINK" => {
                let mut actions = Vec::new();
                if matches!(self.status, SessionStatus::Linked | SessionStatus::Linking) {
                    self.status = SessionStatus::Unlinking;
                    self.old_status = SessionStatus::Unlinking;
                    actions.extend(self.reflector_link.unlink().into_iter().map(GatewayAction::from));
                    self.voice.unlinked();
                }
                self.trigger_voice = true;
                self.hang_timer.stop();
                actions
            }
            _ if dest.len() == 9 && dest.as_bytes()[8].is_ascii_uppercase() => {
                self.handle_module_selection(&dest, &frame)
            }
            _ => self.forward_to_reflector(&frame),
        }
    }

    /// A 9-character destination whose 9th character is a module letter: a
    /// reflector-module selection. A same-reflector repeat falls through to
    /// the default "rewrite and forward if LINKED" action (`spec.md` §9's
    /// "duplicate destination-match check... is load-bearing").
    fn handle_module_selection(&mut self, dest: &str, frame: &NetworkFrame) -> Vec<GatewayAction> {
        let mut actions = Vec::new();
        let key: String = dest.chars().take(7).collect();
        let module = dest.as_bytes()[8];

        let differs = self.reflector.as_ref().is_none_or(|r| r.name != key);
        if !differs {
            return self.forward_to_reflector(frame);
        }

        if matches!(self.status, SessionStatus::Linked | SessionStatus::Linking) {
            actions.extend(self.reflector_link.unlink().into_iter().map(GatewayAction::from));
        }
        self.trigger_voice = true;

        match self.directory.find(&key).cloned() {
            Some(record) => {
                actions.extend(self.begin_link(record, module));
                self.hang_timer.start();
            }
            None => {
                if matches!(self.status, SessionStatus::Linked | SessionStatus::Linking) {
                    self.status = SessionStatus::Unlinking;
                    self.old_status = SessionStatus::Unlinking;
                }
                self.voice.unlinked();
                self.hang_timer.stop();
            }
        }

        actions
    }

    fn forward_to_reflector(&mut self, frame: &NetworkFrame) -> Vec<GatewayAction> {
        if self.status != SessionStatus::Linked {
            return Vec::new();
        }
        let Some(reflector) = self.reflector.clone() else {
            return Vec::new();
        };

        let mut rewritten = frame.clone();
        rewritten.lsf.set_dest(callsign::encode(&reflector.name));
        let bytes = rewritten.encode();

        let mut actions = Vec::new();
        if let Some(action) = self.reflector_link.write(&bytes) {
            actions.push(GatewayAction::from(action));
        }
        self.hang_timer.start();
        actions
    }

    fn service_voice(&mut self) -> Vec<GatewayAction> {
        let mut actions = Vec::new();
        if self.trigger_voice {
            self.voice.start();
            self.trigger_voice = false;
        }
        if let Some(frame) = self.voice.read() {
            actions.push(GatewayAction::SendToModem(frame));
        }
        actions
    }

    /// Advance every sub-component's timers by `ms` milliseconds, then
    /// apply the inactivity-reversion policy from `spec.md` §4.F.
    pub fn advance(&mut self, ms: u64, resolver: &impl Resolver) -> Vec<GatewayAction> {
        let mut actions = Vec::new();

        self.voice.clock(ms);
        self.directory.clock(ms, resolver);
        actions.extend(self.repeater_link.clock(ms).into_iter().map(GatewayAction::from));
        actions.extend(self.reflector_link.clock(ms).into_iter().map(GatewayAction::from));
        self.echo.clock(ms);

        if self.hang_timer.clock(ms) {
            actions.extend(self.revert());
        }

        actions
    }

    fn revert(&mut self) -> Vec<GatewayAction> {
        if !self.config.network.revert {
            return Vec::new();
        }

        let mut actions = Vec::new();
        let current_key = self.reflector.as_ref().map(|r| r.name.clone());
        let startup_key: Option<String> = if self.startup_reflector.len() == 9 {
            Some(self.startup_reflector.chars().take(7).collect())
        } else {
            None
        };

        if let Some(startup_key) = &startup_key {
            if current_key.as_deref() != Some(startup_key.as_str()) {
                if matches!(self.status, SessionStatus::Linked | SessionStatus::Linking) {
                    actions.extend(self.reflector_link.unlink().into_iter().map(GatewayAction::from));
                }
                if let Some(record) = self.directory.find(startup_key).cloned() {
                    let module = self.startup_reflector.as_bytes()[8];
                    actions.extend(self.begin_link(record, module));
                    self.voice.start();
                    self.hang_timer.start();
                }
            }
        } else if matches!(self.status, SessionStatus::Linked | SessionStatus::Linking) {
            self.status = SessionStatus::Unlinking;
            self.old_status = SessionStatus::Unlinking;
            actions.extend(self.reflector_link.unlink().into_iter().map(GatewayAction::from));
            self.voice.unlinked();
            self.voice.start();
            self.reflector = None;
            self.hang_timer.stop();
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{NullAprsSink, NullModemProducer};
    use m17gw_proto::packet::ReflectorPacket;

    struct FakeResolver;
    impl Resolver for FakeResolver {
        fn resolve_v4(&self, _host: &str, port: u16) -> Option<SocketAddr> {
            Some(format!("127.0.0.1:{port}").parse().unwrap())
        }
        fn resolve_v6(&self, _host: &str, _port: u16) -> Option<SocketAddr> {
            None
        }
        fn resolve_any(&self, host: &str, port: u16) -> Option<SocketAddr> {
            self.resolve_v4(host, port)
        }
    }

    fn write_temp(contents: &str, suffix: &str) -> String {
        let path = std::env::temp_dir().join(format!(
            "m17gw-session-test-{}-{}-{}.tmp",
            std::process::id(),
            suffix,
            contents.len()
        ));
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn base_config(startup: &str, hosts_json: &str) -> GatewayConfig {
        let toml_text = format!(
            r#"
            [general]
            callsign = "N0CALL"
            rpt_address = "127.0.0.1"
            rpt_port = 17011
            local_port = 17012

            [network]
            port = 17000
            hosts_file1 = "{hosts_json}"
            hosts_file2 = ""
            startup = "{startup}"
            revert = true
            hang_time = 60
            "#
        );
        GatewayConfig::from_toml("test.toml", &toml_text).unwrap()
    }

    #[test]
    fn startup_link_sends_conn() {
        let json_path = write_temp(
            r#"{"reflectors": [{"designator": "USA", "port": 17000, "ipv4": "relay.example", "ipv6": null}]}"#,
            "startup",
        );
        let cfg = base_config("M17-USA_A", &json_path);
        let repeater = RepeaterLink::open("127.0.0.1:17011".parse().unwrap()).0;
        let (driver, actions) = GatewayDriver::new(
            cfg,
            [0u8; 6],
            repeater,
            &FakeResolver,
            NullModemProducer,
            NullAprsSink,
        )
        .unwrap();

        assert_eq!(driver.status(), SessionStatus::Linking);
        assert!(actions
            .iter()
            .any(|a| matches!(a, GatewayAction::SendToReflector { bytes, .. } if &bytes[0..4] == b"CONN")));
    }

    fn two_reflector_json(json_path_contents: &str) -> String {
        write_temp(json_path_contents, "multi")
    }

    fn modem_frame(dest: &str) -> Vec<u8> {
        modem_frame_with_fn(dest, 0)
    }

    fn modem_frame_with_fn(dest: &str, fn_field: u16) -> Vec<u8> {
        let mut lsf_bytes = [0u8; m17gw_proto::lsf::LSF_LENGTH];
        lsf_bytes[0..6].copy_from_slice(&callsign::encode(&callsign::pad9(dest)));
        lsf_bytes[6..12].copy_from_slice(&callsign::encode("N0CALL   "));
        let frame = NetworkFrame {
            stream_id: 1,
            lsf: m17gw_proto::Lsf::from_bytes(&lsf_bytes),
            fn_field,
            payload: [0u8; m17gw_proto::frame::PAYLOAD_LENGTH],
            crc: 0,
        };
        frame.encode().to_vec()
    }

    /// Drive a `GatewayDriver` from `NotLinked` straight to `Linked` against
    /// `reflector_name` by injecting `ACKN` after the startup/first `link()`.
    fn linked_driver(
        reflector_name: &str,
        json: &str,
    ) -> GatewayDriver<NullModemProducer, NullAprsSink> {
        let startup = format!("{reflector_name}_A");
        let cfg = base_config(&startup, json);
        let repeater = RepeaterLink::open("127.0.0.1:17011".parse().unwrap()).0;
        let (mut driver, _) = GatewayDriver::new(
            cfg,
            [0u8; 6],
            repeater,
            &FakeResolver,
            NullModemProducer,
            NullAprsSink,
        )
        .unwrap();
        let peer = driver.reflector_peer().unwrap();
        driver.on_reflector_datagram(peer, &ReflectorPacket::Ackn.encode());
        driver.service_frames();
        assert_eq!(driver.status(), SessionStatus::Linked);
        driver
    }

    #[test]
    fn same_reflector_repeat_forwards_frame() {
        let json = two_reflector_json(
            r#"{"reflectors": [{"designator": "USA", "port": 17000, "ipv4": "relay.example", "ipv6": null}]}"#,
        );
        let mut driver = linked_driver("M17-USA", &json);

        let peer = "127.0.0.1:17011".parse().unwrap();
        driver.on_modem_datagram(peer, &modem_frame("M17-USA A"));
        let actions = driver.service_frames();

        assert_eq!(driver.status(), SessionStatus::Linked);
        assert!(actions.iter().any(|a| matches!(a, GatewayAction::SendToReflector { bytes, .. }
            if bytes.len() == m17gw_proto::frame::FRAME_LENGTH && &bytes[0..4] == b"M17 ")));
    }

    #[test]
    fn modem_driven_switch_unlinks_old_and_links_new() {
        let json = two_reflector_json(
            r#"{"reflectors": [
                {"designator": "USA", "port": 17000, "ipv4": "relay.example", "ipv6": null},
                {"designator": "GBR", "port": 17000, "ipv4": "relay2.example", "ipv6": null}
            ]}"#,
        );
        let mut driver = linked_driver("M17-USA", &json);
        let old_peer = driver.reflector_peer().unwrap();

        let peer = "127.0.0.1:17011".parse().unwrap();
        driver.on_modem_datagram(peer, &modem_frame("M17-GBR B"));
        let actions = driver.service_frames();

        // The DISC must be addressed to the old reflector even though
        // `link()` to the new one happens in the same batch and immediately
        // overwrites the stored peer.
        assert!(actions
            .iter()
            .any(|a| matches!(a, GatewayAction::SendToReflector { to, bytes } if *to == old_peer && &bytes[0..4] == b"DISC")));
        assert!(actions
            .iter()
            .any(|a| matches!(a, GatewayAction::SendToReflector { to, bytes } if *to != old_peer && &bytes[0..4] == b"CONN")));
        assert_eq!(driver.current_reflector().unwrap().name, "M17-GBR");
    }

    #[test]
    fn unlink_command_sends_disc_and_reverts_to_not_linked() {
        let json = two_reflector_json(
            r#"{"reflectors": [{"designator": "USA", "port": 17000, "ipv4": "relay.example", "ipv6": null}]}"#,
        );
        let mut driver = linked_driver("M17-USA", &json);

        let peer = "127.0.0.1:17011".parse().unwrap();
        driver.on_modem_datagram(peer, &modem_frame("UNLINK   "));
        let actions = driver.service_frames();
        assert!(actions
            .iter()
            .any(|a| matches!(a, GatewayAction::SendToReflector { bytes, .. } if &bytes[0..4] == b"DISC")));
        assert_eq!(driver.status(), SessionStatus::Unlinking);

        driver.on_reflector_datagram(driver.reflector_peer().unwrap(), &ReflectorPacket::Disc { callsign: [0; 6] }.encode());
        driver.service_frames();
        assert_eq!(driver.status(), SessionStatus::NotLinked);
    }

    #[test]
    fn echo_destination_switches_status_and_records_frame() {
        let json = two_reflector_json(
            r#"{"reflectors": [{"designator": "USA", "port": 17000, "ipv4": "relay.example", "ipv6": null}]}"#,
        );
        let mut driver = linked_driver("M17-USA", &json);

        let peer = "127.0.0.1:17011".parse().unwrap();
        let bytes = modem_frame_with_fn("ECHO     ", m17gw_proto::frame::FN_EOT_MASK);
        driver.on_modem_datagram(peer, &bytes);
        driver.service_frames();

        assert_eq!(driver.status(), SessionStatus::Echo);
    }

    #[test]
    fn module_selection_from_not_linked_begins_linking() {
        let json = two_reflector_json(
            r#"{"reflectors": [{"designator": "USA", "port": 17000, "ipv4": "relay.example", "ipv6": null}]}"#,
        );
        let cfg = base_config("", &json);
        let repeater = RepeaterLink::open("127.0.0.1:17011".parse().unwrap()).0;
        let (mut driver, _) = GatewayDriver::new(
            cfg,
            [0u8; 6],
            repeater,
            &FakeResolver,
            NullModemProducer,
            NullAprsSink,
        )
        .unwrap();

        let peer = "127.0.0.1:17011".parse().unwrap();
        driver.on_modem_datagram(peer, &modem_frame("M17-USA A"));
        let actions = driver.service_frames();
        assert!(actions
            .iter()
            .any(|a| matches!(a, GatewayAction::SendToReflector { bytes, .. } if &bytes[0..4] == b"CONN")));
        assert_eq!(driver.status(), SessionStatus::Linking);
    }
}
