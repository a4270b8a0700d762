//! Configuration file and resolved settings.
//!
//! ```toml
//! region = "us-east-1"
//! profile = "admin"
//! format = "json"
//! confirm_threshold = "high"
//! request_timeout_secs = 60
//! connect_timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use wsctl_proto::ConfirmImpact;

use crate::cli::{Format, GlobalArgs};
use crate::error::CliError;

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WsctlConfig {
    /// Default region.
    pub region: Option<String>,
    /// Shared-config profile used for credentials.
    pub profile: Option<String>,
    /// Endpoint override, e.g. a VPC endpoint or a local test server.
    pub endpoint_url: Option<String>,
    /// Default output format.
    pub format: Option<Format>,
    /// Operations at or above this impact prompt before running; `none`
    /// turns prompting off.
    pub confirm_threshold: ConfirmImpact,
    /// Whole-request timeout.
    pub request_timeout_secs: u64,
    /// Connection timeout.
    pub connect_timeout_secs: u64,
}

impl Default for WsctlConfig {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            endpoint_url: None,
            format: None,
            confirm_threshold: ConfirmImpact::Medium,
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

impl WsctlConfig {
    /// Default location: `<config dir>/wsctl/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wsctl").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => {
                    debug!("no configuration file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CliError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.request_timeout_secs == 0 {
            return Err(CliError::Config("request_timeout_secs must be positive".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(CliError::Config("connect_timeout_secs must be positive".into()));
        }
        if let Some(region) = &self.region {
            validate_region(region)?;
        }
        if let Some(endpoint) = &self.endpoint_url {
            validate_endpoint(endpoint)?;
        }
        Ok(())
    }
}

/// Effective settings after merging flags, environment and file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Region, if any layer named one. `None` defers to the AWS default chain.
    pub region: Option<String>,
    /// Credentials profile.
    pub profile: Option<String>,
    /// Endpoint override.
    pub endpoint_url: Option<String>,
    /// Output format.
    pub format: Format,
    /// Confirmation threshold.
    pub confirm_threshold: ConfirmImpact,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Settings {
    /// Merge command-line (and clap `env`) values over the file.
    pub fn resolve(file: WsctlConfig, args: &GlobalArgs) -> Result<Self, CliError> {
        let region = args.region.clone().or(file.region);
        if let Some(region) = &region {
            validate_region(region)?;
        }
        let endpoint_url = args.endpoint_url.clone().or(file.endpoint_url);
        if let Some(endpoint) = &endpoint_url {
            validate_endpoint(endpoint)?;
        }

        Ok(Self {
            region,
            profile: args.profile.clone().or(file.profile),
            endpoint_url,
            format: args.format.or(file.format).unwrap_or_default(),
            confirm_threshold: file.confirm_threshold,
            request_timeout: Duration::from_secs(file.request_timeout_secs),
            connect_timeout: Duration::from_secs(file.connect_timeout_secs),
        })
    }
}

fn validate_region(region: &str) -> Result<(), CliError> {
    let valid = !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CliError::Config(format!("invalid region '{region}'")))
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), CliError> {
    let url = Url::parse(endpoint)
        .map_err(|e| CliError::Config(format!("invalid endpoint_url '{endpoint}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CliError::Config(format!(
            "endpoint_url must use http or https, got {}",
            url.scheme()
        )));
    }
    Ok(())
}
