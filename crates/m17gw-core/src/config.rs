//! Gateway configuration.
//!
//! `spec.md` treats the INI reader as an external collaborator the core
//! merely consumes values from (§1, §6). This repository still needs a
//! concrete type to hand the running daemon; `GatewayConfig` covers every
//! field enumerated in `spec.md` §6, loaded from TOML rather than INI (see
//! `DESIGN.md`'s Open Question log for why).

use serde::Deserialize;

use crate::errors::ConfigError;

/// Top-level gateway configuration, covering every knob named in `spec.md`
/// §6.
#[derive(Clone, Debug, Deserialize)]
pub struct GatewayConfig {
    /// `[General]` section.
    pub general: GeneralConfig,
    /// `[Log]` section.
    #[serde(default)]
    pub log: LogConfig,
    /// `[Network]` section.
    pub network: NetworkConfig,
    /// `[Remote Commands]` section.
    #[serde(default)]
    pub remote_commands: RemoteCommandsConfig,
}

/// `[General]` section: identity and modem endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct GeneralConfig {
    /// Operator callsign, uppercased by convention.
    pub callsign: String,
    /// Role suffix appended to the callsign for reflector-link identity.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Modem (repeater) address.
    pub rpt_address: String,
    /// Modem (repeater) UDP port.
    pub rpt_port: u16,
    /// Local UDP port the repeater link binds to.
    pub local_port: u16,
    /// Run as a background daemon. Out of scope for this core; carried
    /// only so the config shape matches upstream.
    #[serde(default)]
    pub daemon: bool,
    /// Verbose debug logging.
    #[serde(default)]
    pub debug: bool,
}

fn default_suffix() -> String {
    "M".to_string()
}

/// `[Log]` section.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LogConfig {
    /// Directory for log files.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Log filename root (date/sequence suffix is appended by the logger).
    #[serde(default)]
    pub file_root: Option<String>,
    /// Minimum level written to the log file.
    #[serde(default)]
    pub file_level: Option<String>,
    /// Minimum level written to the console.
    #[serde(default)]
    pub display_level: Option<String>,
    /// Days between log file rotation; `0` disables rotation.
    #[serde(default)]
    pub file_rotate: u32,
}

/// `[Network]` section: reflector link and directory behavior.
#[derive(Clone, Debug, Deserialize)]
pub struct NetworkConfig {
    /// Local UDP port the reflector link binds to.
    pub port: u16,
    /// Path to the JSON reflector hosts file.
    pub hosts_file1: String,
    /// Path to the legacy text reflector hosts file.
    pub hosts_file2: String,
    /// Minutes between directory reloads; `0` disables periodic reload.
    #[serde(default)]
    pub reload_time: u32,
    /// Inactivity timer, in seconds, before automatic reversion.
    #[serde(default = "default_hang_time")]
    pub hang_time: u32,
    /// Startup reflector selection, e.g. `"M17-USA A"`. Underscores are
    /// translated to spaces and the whole field is padded to 9 characters
    /// before lookup.
    #[serde(default)]
    pub startup: String,
    /// Whether inactivity reverts to the startup reflector (or unlinks if
    /// none was configured).
    #[serde(default)]
    pub revert: bool,
    /// Verbose debug logging for the reflector link.
    #[serde(default)]
    pub debug: bool,
}

fn default_hang_time() -> u32 {
    60
}

/// `[Remote Commands]` section.
#[derive(Clone, Debug, Deserialize)]
pub struct RemoteCommandsConfig {
    /// Enable the remote-command UDP listener.
    #[serde(default)]
    pub enable: bool,
    /// Local UDP port for remote commands.
    #[serde(default = "default_remote_port")]
    pub port: u16,
}

impl Default for RemoteCommandsConfig {
    fn default() -> Self {
        Self {
            enable: false,
            port: default_remote_port(),
        }
    }
}

fn default_remote_port() -> u16 {
    6075
}

impl GatewayConfig {
    /// Parse a `GatewayConfig` from TOML source text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `text` is not valid TOML or is
    /// missing required fields.
    pub fn from_toml(path: &str, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load a `GatewayConfig` from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid TOML.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    /// The startup reflector selection normalized for directory lookup:
    /// underscores translated to spaces, padded to 9 characters. Empty if
    /// unconfigured.
    #[must_use]
    pub fn normalized_startup(&self) -> String {
        normalize_reflector_name(&self.network.startup)
    }
}

/// Normalize a reflector-selection string the way both the startup config
/// field and the `Reflector <name>` remote command do: underscores become
/// spaces, and the result is right-padded to 9 characters.
#[must_use]
pub fn normalize_reflector_name(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let mut s: String = raw.chars().map(|c| if c == '_' { ' ' } else { c }).collect();
    while s.chars().count() < 9 {
        s.push(' ');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [general]
        callsign = "N0CALL"
        rpt_address = "127.0.0.1"
        rpt_port = 17011
        local_port = 17012

        [network]
        port = 17000
        hosts_file1 = "hosts.json"
        hosts_file2 = "hosts.txt"
        startup = "M17-USA_A"
        revert = true
    "#;

    #[test]
    fn parses_sample_config() {
        let cfg = GatewayConfig::from_toml("test.toml", SAMPLE).unwrap();
        assert_eq!(cfg.general.callsign, "N0CALL");
        assert_eq!(cfg.general.suffix, "M");
        assert_eq!(cfg.network.hang_time, 60);
        assert!(!cfg.remote_commands.enable);
        assert_eq!(cfg.remote_commands.port, 6075);
    }

    #[test]
    fn normalizes_startup_reflector() {
        let cfg = GatewayConfig::from_toml("test.toml", SAMPLE).unwrap();
        assert_eq!(cfg.normalized_startup(), "M17-USA A");
    }

    #[test]
    fn empty_startup_stays_empty() {
        assert_eq!(normalize_reflector_name(""), "");
    }
}
