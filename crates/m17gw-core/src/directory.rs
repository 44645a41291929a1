//! Reflector directory: loads a JSON host list and a legacy text host list,
//! resolves each host to IPv4/IPv6 addresses, and supports lookup by
//! 7-character name. See `spec.md` §4.B.

use std::net::SocketAddr;

use serde::Deserialize;

use crate::errors::DirectoryError;

/// A single reflector's listening addresses, keyed by a 7-character name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReflectorRecord {
    /// The 7-character reflector name, e.g. `"M17-USA"`.
    pub name: String,
    /// IPv4 address, if the entry resolved one.
    pub ipv4: Option<SocketAddr>,
    /// IPv6 address, if the entry resolved one.
    pub ipv6: Option<SocketAddr>,
}

/// Shape of the JSON hosts file: `{"reflectors": [...]}`.
#[derive(Debug, Deserialize)]
struct JsonHostsFile {
    reflectors: Vec<JsonReflectorEntry>,
}

#[derive(Debug, Deserialize)]
struct JsonReflectorEntry {
    designator: String,
    port: u16,
    ipv4: Option<String>,
    ipv6: Option<String>,
}

/// Resolves a hostname/address string plus port to a socket address. Pulled
/// out as a trait so the directory itself stays free of real DNS I/O and
/// can be driven deterministically in tests.
pub trait Resolver {
    /// Resolve `host:port` to a IPv4 socket address, if possible.
    fn resolve_v4(&self, host: &str, port: u16) -> Option<SocketAddr>;
    /// Resolve `host:port` to an IPv6 socket address, if possible.
    fn resolve_v6(&self, host: &str, port: u16) -> Option<SocketAddr>;
    /// Resolve `host:port` to whichever address family the host naturally
    /// answers as, used by the legacy text parser which does not separate
    /// the two.
    fn resolve_any(&self, host: &str, port: u16) -> Option<SocketAddr>;
}

/// Truncate or right-pad a name to the reflector directory's fixed 7-char
/// width.
fn pad7(name: &str) -> String {
    let mut s: String = name.chars().take(7).collect();
    while s.chars().count() < 7 {
        s.push(' ');
    }
    s
}

/// The loaded set of reflector records plus a periodic reload clock.
pub struct ReflectorDirectory {
    json_path: String,
    legacy_path: String,
    reload_interval_ms: u64,
    reload_elapsed_ms: u64,
    records: Vec<ReflectorRecord>,
}

impl ReflectorDirectory {
    /// Construct an empty, unloaded directory.
    ///
    /// `reload_minutes` of `0` disables periodic reload entirely.
    #[must_use]
    pub fn new(json_path: impl Into<String>, legacy_path: impl Into<String>, reload_minutes: u32) -> Self {
        Self {
            json_path: json_path.into(),
            legacy_path: legacy_path.into(),
            reload_interval_ms: u64::from(reload_minutes) * 60 * 1000,
            reload_elapsed_ms: 0,
            records: Vec::new(),
        }
    }

    /// The currently loaded records, in insertion order (JSON entries
    /// before legacy entries).
    #[must_use]
    pub fn records(&self) -> &[ReflectorRecord] {
        &self.records
    }

    /// Look up a reflector by name, truncating the query to 7 characters.
    /// Exact comparison after truncation/padding; no case folding.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ReflectorRecord> {
        let key = pad7(name);
        self.records.iter().find(|r| r.name == key)
    }

    /// Clear and reload both sources. Succeeds iff the JSON file parsed AND
    /// at least one reflector was installed from either source.
    pub fn load(&mut self, resolver: &impl Resolver) -> Result<(), DirectoryError> {
        self.records.clear();

        let json_text =
            std::fs::read_to_string(&self.json_path).map_err(|source| DirectoryError::JsonFileRead {
                path: self.json_path.clone(),
                source,
            })?;
        let parsed: JsonHostsFile =
            serde_json::from_str(&json_text).map_err(|source| DirectoryError::JsonParse {
                path: self.json_path.clone(),
                source,
            })?;

        for entry in parsed.reflectors {
            let ipv4 = entry
                .ipv4
                .as_deref()
                .and_then(|h| resolver.resolve_v4(h, entry.port));
            let ipv6 = entry
                .ipv6
                .as_deref()
                .and_then(|h| resolver.resolve_v6(h, entry.port));
            if ipv4.is_some() || ipv6.is_some() {
                self.records.push(ReflectorRecord {
                    name: format!("M17-{}", entry.designator),
                    ipv4,
                    ipv6,
                });
            }
        }

        self.load_legacy(resolver);

        if self.records.is_empty() {
            return Err(DirectoryError::Empty {
                json_path: self.json_path.clone(),
                legacy_path: self.legacy_path.clone(),
            });
        }

        Ok(())
    }

    /// Best-effort parse of the legacy whitespace-separated text file.
    /// Unresolvable hosts are skipped with a warning; a missing file is
    /// also simply skipped (it never fails the overall load).
    fn load_legacy(&mut self, resolver: &impl Resolver) {
        let Ok(text) = std::fs::read_to_string(&self.legacy_path) else {
            return;
        };

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(name), Some(host), Some(port)) = (parts.next(), parts.next(), parts.next()) else {
                continue;
            };
            let Ok(port) = port.parse::<u16>() else {
                tracing::warn!(line, "legacy hosts entry has invalid port, skipping");
                continue;
            };

            let name = pad7(name);
            let mut record = ReflectorRecord {
                name,
                ipv4: None,
                ipv6: None,
            };

            if let Some(v4) = resolver.resolve_v4(host, port) {
                record.ipv4 = Some(v4);
            } else if let Some(v6) = resolver.resolve_v6(host, port) {
                record.ipv6 = Some(v6);
            } else if let Some(addr) = resolver.resolve_any(host, port) {
                match addr {
                    SocketAddr::V4(_) => record.ipv4 = Some(addr),
                    SocketAddr::V6(_) => record.ipv6 = Some(addr),
                }
            } else {
                tracing::warn!(host, "could not resolve legacy hosts entry, skipping");
                continue;
            }

            self.records.push(record);
        }
    }

    /// Advance the reload timer by `ms` milliseconds; reload when it
    /// expires. Reload failures leave the directory empty until the next
    /// successful reload (see `DESIGN.md` Open Question log).
    pub fn clock(&mut self, ms: u64, resolver: &impl Resolver) {
        if self.reload_interval_ms == 0 {
            return;
        }
        self.reload_elapsed_ms += ms;
        if self.reload_elapsed_ms >= self.reload_interval_ms {
            self.reload_elapsed_ms = 0;
            if let Err(err) = self.load(resolver) {
                tracing::warn!(error = %err, "periodic reflector directory reload failed");
            }
        }
    }
}
