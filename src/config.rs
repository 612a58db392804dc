//! Client configuration loaded from TOML.
//!
//! Every table is optional and falls back to the values the game client
//! ships with, so an empty file (or no file at all) talks to the production
//! service:
//!
//! ```toml
//! [lookup]
//! base_url = "https://rak3ffdi.cloud.tds1.tapapis.cn"
//!
//! [transport]
//! timeout_secs = 30
//!
//! [version_gate]
//! gameProgress = 3
//! ```
//!
//! `version_gate` entries are added on top of the record gate. `gameRecord`
//! is always checked against the record decoder's version and may not appear
//! in the table. `timeout_secs` must be at least 1.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

use crate::archive::container::{SectionKey, UnknownSection};
use crate::section::{FixedGate, VersionGate};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}")]
    Read {
        /// Path of the file.
        path: Utf8PathBuf,
        /// The I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or has unexpected fields.
    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),

    /// A `version_gate` key names no save section.
    #[error("version_gate: {0}")]
    UnknownSection(#[from] UnknownSection),

    /// A `version_gate` key names the record section, whose gate is fixed.
    #[error("version_gate: {0}")]
    FixedGate(#[from] FixedGate),

    /// `transport.timeout_secs` is zero.
    #[error("transport.timeout_secs must be at least 1")]
    ZeroTimeout,
}

/// Top-level client configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Save lookup service settings.
    pub lookup: LookupConfig,
    /// HTTP transport settings shared by lookup and download.
    pub transport: TransportConfig,
    /// Extra version-gated sections, keyed by archive entry name.
    pub version_gate: BTreeMap<String, u8>,
}

impl ClientConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields,
    /// [`ConfigError::UnknownSection`] or [`ConfigError::FixedGate`] for a
    /// bad `version_gate` key, and [`ConfigError::ZeroTimeout`] for a zero
    /// timeout.
    ///
    /// # Examples
    ///
    /// ```
    /// use phigros_save::config::ClientConfig;
    ///
    /// let config = ClientConfig::from_toml_str("[transport]\ntimeout_secs = 5\n")?;
    /// assert_eq!(config.transport.timeout_secs, 5);
    /// # Ok::<(), phigros_save::config::ConfigError>(())
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants deserialisation cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] for a zero timeout and the
    /// errors of [`Self::apply_version_gate`] for a bad `version_gate` key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.apply_version_gate(VersionGate::new())?;
        Ok(())
    }

    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, and the
    /// errors of [`Self::from_toml_str`] otherwise.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |path| std::fs::read_to_string(path))
    }

    /// Load configuration from `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// As [`Self::load`], except that a missing file is not an error.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |path| match std::fs::read_to_string(path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            other => other,
        })
    }

    /// Load configuration through the supplied reader.
    ///
    /// Lets tests simulate the file system without touching it.
    ///
    /// # Errors
    ///
    /// As [`Self::load`].
    pub fn load_with<F>(path: &Utf8Path, reader: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&Utf8Path) -> io::Result<String>,
    {
        let source = reader(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// The configured `version_gate` entries as section keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSection`] for a key that names no
    /// save section.
    pub fn gated_sections(&self) -> Result<Vec<(SectionKey, u8)>, ConfigError> {
        self.version_gate
            .iter()
            .map(|(name, version)| Ok((name.parse::<SectionKey>()?, *version)))
            .collect()
    }

    /// Add the configured `version_gate` entries to `gate`.
    ///
    /// # Errors
    ///
    /// As [`Self::gated_sections`], plus [`ConfigError::FixedGate`] for a
    /// `gameRecord` entry.
    pub fn apply_version_gate(&self, gate: VersionGate) -> Result<VersionGate, ConfigError> {
        self.gated_sections()?
            .into_iter()
            .try_fold(gate, |gate, (section, version)| {
                Ok(gate.with_section(section, version)?)
            })
    }
}

/// Save lookup service settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    /// Service root, without the `/1.1/...` path.
    pub base_url: String,
    /// Application id sent as `X-LC-Id`.
    pub app_id: String,
    /// Application key sent as `X-LC-Key`.
    pub app_key: String,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://rak3ffdi.cloud.tds1.tapapis.cn".to_owned(),
            app_id: "rAK3FfdieFob2Nn8Am".to_owned(),
            app_key: "Qr9AEqtuoSVS3zeD6iVbM4ZC0AtkJcQ89tywVyi0".to_owned(),
            user_agent: "LeanCloud-CSharp-SDK/1.0.3".to_owned(),
        }
    }
}

/// HTTP transport settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Whole-request timeout in seconds. Zero is rejected.
    #[serde(default = "TransportConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TransportConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }

    /// The request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}
