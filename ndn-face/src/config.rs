//! Configuration for a face.
//!
//! Options can be built in code, or loaded from a TOML/JSON/YAML file with
//! `NDN_FACE_*` environment variables overriding individual fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{path::{Path, PathBuf}, time::Duration};

use crate::{DEFAULT_CONTROL_PREFIX, DEFAULT_INBOUND_CAPACITY, DEFAULT_INTEREST_LIFETIME_MS};

/// Face configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceOptions {
    /// Identifier used in log lines; generated when absent
    pub id: Option<String>,

    /// Forwarder to connect to (`tcp://host:port` or `unix:///path`)
    pub forwarder_uri: String,

    /// Connection establishment timeout (in milliseconds)
    pub connect_timeout_ms: u64,

    /// Lifetime of Interests the face builds itself (in milliseconds)
    pub interest_lifetime_ms: u64,

    /// Management prefix of the forwarder
    pub control_prefix: String,

    /// Lifetime of control command Interests (in milliseconds)
    pub control_lifetime_ms: u64,

    /// Capacity of the inbound Interest channel created by `Face::connect`
    pub inbound_capacity: usize,

    /// Share the process-wide Content Store instead of a private one
    pub shared_content_store: bool,

    /// Armored private key used to sign control commands
    pub command_key_file: Option<PathBuf>,
}

impl Default for FaceOptions {
    fn default() -> Self {
        Self {
            id: None,
            forwarder_uri: "unix:///run/nfd.sock".to_string(),
            connect_timeout_ms: 5000,
            interest_lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
            control_prefix: DEFAULT_CONTROL_PREFIX.to_string(),
            control_lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
            shared_content_store: true,
            command_key_file: None,
        }
    }
}

impl FaceOptions {
    /// Loads options from `path` (format taken from the extension) and the
    /// environment. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let path: Option<&Path> = path.as_ref().map(|p| p.as_ref());

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix("NDN_FACE").try_parsing(true));

        let options = builder
            .build()
            .and_then(|settings| settings.try_deserialize::<FaceOptions>())
            .with_context(|| match path {
                Some(path) => format!("Failed to load face options from {}", path.display()),
                None => "Failed to load face options from the environment".to_string(),
            })?;
        Ok(options)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Reads the command signing key, if one is configured.
    pub fn read_command_key(&self) -> Result<Option<ndn_common::Key>> {
        let Some(path) = &self.command_key_file else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open key file: {}", path.display()))?;
        let key = ndn_common::key::decode_private_key(&text)
            .with_context(|| format!("Failed to parse key file: {}", path.display()))?;
        Ok(Some(key))
    }
}
