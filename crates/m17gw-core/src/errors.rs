//! Error types for the stateful gateway logic.

use thiserror::Error;

/// Errors produced while loading or reloading the reflector directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The JSON hosts file could not be read from disk.
    #[error("reading JSON hosts file {path}: {source}")]
    JsonFileRead {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The JSON hosts file was present but did not parse.
    #[error("parsing JSON hosts file {path}: {source}")]
    JsonParse {
        /// Path that failed to parse.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Neither source contributed a single usable reflector record.
    #[error("no reflectors loaded from {json_path} or {legacy_path}")]
    Empty {
        /// JSON hosts file path.
        json_path: String,
        /// Legacy hosts file path.
        legacy_path: String,
    },
}

/// Errors produced while loading gateway configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read from disk.
    #[error("reading config file {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file was present but did not parse as TOML.
    #[error("parsing config file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}
