//! Device configuration loaded from persistent storage.
//!
//! The configuration is a small JSON object stored at `/config.json`:
//!
//! ```json
//! {
//!   "myDRIVER": "d1",
//!   "myHOST": "http://tracking.example.com",
//!   "mySSID": "depot-wifi",
//!   "myPASSWORD": "secret"
//! }
//! ```
//!
//! It is read once at startup. Each field has a fixed capacity taken
//! from the device firmware's buffer sizes; see [`FieldPolicy`] for what
//! happens to values that do not fit.

use std::fmt;
use std::io::{self, Read};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::fs::{ConfigFile, Filesystem};

/// Default location of the configuration file.
pub const CONFIG_PATH: &str = "/config.json";

/// Largest configuration file accepted, in bytes.
pub const MAX_CONFIG_SIZE: u64 = 1024;

/// A configuration key and the capacity of its destination buffer.
///
/// Capacity counts the terminator slot, so at most `capacity - 1` bytes of
/// text are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub capacity: usize,
}

impl FieldSpec {
    /// Longest value, in bytes, that fits the field.
    pub const fn max_len(&self) -> usize {
        self.capacity.saturating_sub(1)
    }
}

pub const DRIVER_FIELD: FieldSpec = FieldSpec {
    key: "myDRIVER",
    capacity: 20,
};

pub const HOST_FIELD: FieldSpec = FieldSpec {
    key: "myHOST",
    capacity: 64,
};

pub const SSID_FIELD: FieldSpec = FieldSpec {
    key: "mySSID",
    capacity: 64,
};

pub const PASSWORD_FIELD: FieldSpec = FieldSpec {
    key: "myPASSWORD",
    capacity: 64,
};

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The storage holding the config file could not be mounted.
    #[error("Failed to mount file system: {0}")]
    Mount(#[source] io::Error),

    /// The config file does not exist.
    #[error("Failed to open config file {0}: not found")]
    NotFound(String),

    /// The config file exists but could not be opened.
    #[error("Failed to open config file: {0}")]
    Open(#[source] io::Error),

    /// The config file is larger than [`MAX_CONFIG_SIZE`].
    #[error("Config file size is too large ({size} bytes, max {max})")]
    TooLarge { size: u64, max: u64 },

    /// Reading the config file failed.
    #[error("Failed to read config file: {0}")]
    Read(#[source] io::Error),

    /// The file is not a JSON object.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required key is absent or not a string.
    #[error("Config key {0} is missing or not a string")]
    MissingField(&'static str),

    /// A value exceeds its field capacity under [`FieldPolicy::Reject`].
    #[error("Config key {field} is {len} bytes, max {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// What to do with a value longer than its field allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    /// Keep the first `capacity - 1` bytes, cut back to a character boundary.
    #[default]
    Truncate,
    /// Fail the load with [`ConfigError::FieldTooLong`].
    Reject,
}

/// Device configuration.
///
/// All fields are empty until a load succeeds.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Driver identifier.
    pub driver: String,
    /// API base URL, scheme included (e.g. `http://tracking.example.com`).
    pub host: String,
    /// Wi-Fi network name.
    pub ssid: String,
    /// Wi-Fi passphrase (empty for open networks).
    pub password: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reads [`Config`] from a filesystem.
#[derive(Debug)]
pub struct ConfigStore<F> {
    fs: F,
    path: String,
    policy: FieldPolicy,
}

impl<F: Filesystem> ConfigStore<F> {
    /// Create a store reading [`CONFIG_PATH`] with the truncating policy.
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            path: CONFIG_PATH.to_string(),
            policy: FieldPolicy::default(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Mount the underlying storage.
    pub fn mount(&mut self) -> Result<(), ConfigError> {
        self.fs.mount().map_err(ConfigError::Mount)
    }

    /// Load the configuration. Single attempt, no retry.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let contents = self.read_file()?;
        let object: Map<String, Value> = serde_json::from_slice(&contents)?;

        Ok(Config {
            driver: self.field(&object, DRIVER_FIELD)?,
            host: self.field(&object, HOST_FIELD)?,
            ssid: self.field(&object, SSID_FIELD)?,
            password: self.field(&object, PASSWORD_FIELD)?,
        })
    }

    /// Load the configuration into `config`.
    ///
    /// On error `config` is left exactly as it was.
    pub fn load_into(&self, config: &mut Config) -> Result<(), ConfigError> {
        *config = self.load()?;
        Ok(())
    }

    /// Read the whole file. The handle is dropped before this returns, on
    /// every path.
    fn read_file(&self) -> Result<Vec<u8>, ConfigError> {
        let mut file = self.fs.open(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound(self.path.clone())
            } else {
                ConfigError::Open(e)
            }
        })?;

        let size = file.size().map_err(ConfigError::Read)?;
        if size > MAX_CONFIG_SIZE {
            return Err(ConfigError::TooLarge {
                size,
                max: MAX_CONFIG_SIZE,
            });
        }

        debug!("Reading {} ({} bytes)", self.path, size);
        let mut contents = Vec::with_capacity(size as usize);
        file.by_ref()
            .take(size)
            .read_to_end(&mut contents)
            .map_err(ConfigError::Read)?;

        Ok(contents)
    }

    fn field(&self, object: &Map<String, Value>, spec: FieldSpec) -> Result<String, ConfigError> {
        let value = object
            .get(spec.key)
            .and_then(Value::as_str)
            .ok_or(ConfigError::MissingField(spec.key))?;

        if value.len() <= spec.max_len() {
            return Ok(value.to_string());
        }

        match self.policy {
            FieldPolicy::Truncate => {
                warn!(
                    "Config key {} truncated from {} to {} bytes",
                    spec.key,
                    value.len(),
                    spec.max_len()
                );
                Ok(truncate(value, spec.max_len()).to_string())
            }
            FieldPolicy::Reject => Err(ConfigError::FieldTooLong {
                field: spec.key,
                len: value.len(),
                max: spec.max_len(),
            }),
        }
    }
}

/// Longest prefix of `value` that is at most `max_len` bytes and ends on a
/// character boundary.
fn truncate(value: &str, max_len: usize) -> &str {
    if value.len() <= max_len {
        return value;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
