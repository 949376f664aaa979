//! Provisioning settings read from TOML.
//!
//! ```toml
//! [poll]
//! timeout-secs = 600
//! interval-ms = 5000
//! ```
//!
//! Every key is optional and falls back to the poller defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use vcd_poll::{CancellationToken, DEFAULT_INTERVAL, DEFAULT_TIMEOUT, PollConfig, Poller};

use crate::{OperationError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    poll: RawPollConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawPollConfig {
    timeout_secs: Option<u64>,
    interval_ms: Option<u64>,
}

impl RawPollConfig {
    fn resolve(self) -> Result<PollConfig> {
        let timeout = self
            .timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        let interval = self
            .interval_ms
            .map_or(DEFAULT_INTERVAL, Duration::from_millis);
        Ok(PollConfig::new(timeout, interval)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionConfig {
    poll: PollConfig,
}

impl ProvisionConfig {
    #[must_use]
    pub fn new(poll: PollConfig) -> Self {
        Self { poll }
    }

    #[must_use]
    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }

    /// A poller using these settings and the given cancellation token.
    #[must_use]
    pub fn poller(&self, cancellation: CancellationToken) -> Poller {
        Poller::new(self.poll, cancellation)
    }
}

/// Parse settings from TOML text.
///
/// # Errors
///
/// Returns `ConfigSyntax` for malformed TOML or unknown keys and
/// `InvalidConfig` for a zero timeout or interval.
pub fn parse_config(content: &str) -> Result<ProvisionConfig> {
    let raw: RawConfig = toml::from_str(content)?;
    Ok(ProvisionConfig {
        poll: raw.poll.resolve()?,
    })
}

/// Read settings from a TOML file.
///
/// # Errors
///
/// Returns `ConfigRead` if the file cannot be read, `ConfigParse` if it is
/// not valid, and `InvalidConfig` for a zero timeout or interval.
pub fn load_config(path: &Path) -> Result<ProvisionConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| OperationError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|source| OperationError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ProvisionConfig {
        poll: raw.poll.resolve()?,
    })
}
