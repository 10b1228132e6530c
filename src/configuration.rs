// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use config::Config;
use log::warn;
use serde_with::{DurationSeconds, serde_as};
use std::time::Duration;
use url::Url;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

pub const DEF_HUB_URL: &str = "http://localhost:8080";

/// Metadata namespaces requested with every item.
pub const DEF_METADATA: &str = "ga,synonyms";

/// Environment variable prefix for configuration overrides, e.g. `OHGA_HUB_URL`.
const ENV_PREFIX: &str = "OHGA";

const DEF_CONNECTION_TIMEOUT: Duration = Duration::from_secs(6);
const DEF_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Clone, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub hub: HubSettings,
}

/// openHAB REST API connection settings.
#[serde_as]
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct HubSettings {
    /// Base url of the openHAB server.
    pub url: Url,
    /// API token, sent as bearer token. Takes precedence over basic authentication.
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Max time allowed to connect to the hub, including DNS name resolution.
    #[serde_as(as = "DurationSeconds")]
    pub connection_timeout: Duration,
    /// Total time before a response must be received.
    /// Should be equal or greater than `connection_timeout`.
    #[serde_as(as = "DurationSeconds")]
    pub request_timeout: Duration,
    /// Comma separated metadata namespaces.
    pub metadata: String,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            url: Url::parse(DEF_HUB_URL).expect("invalid default hub url"),
            token: None,
            username: None,
            password: None,
            connection_timeout: DEF_CONNECTION_TIMEOUT,
            request_timeout: DEF_REQUEST_TIMEOUT,
            metadata: DEF_METADATA.into(),
        }
    }
}

/// Load the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the yaml or json configuration file specified in `filename`
/// 2. Environment variables with prefix `OHGA_` (works only for cfg keys not containing a `_`!)
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    // default configuration
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        config = config.add_source(config::File::with_name(filename));
    }

    // E.g. `OHGA_HUB_URL=https://openhab.local:8443` would set the `hub.url` key
    let config = config
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("_"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    check_cfg_values(settings)
}

fn check_cfg_values(mut settings: Settings) -> Result<Settings, config::ConfigError> {
    let hub = &mut settings.hub;
    if hub.connection_timeout < Duration::from_secs(1) {
        warn!("Invalid hub connection timeout, using default.");
        hub.connection_timeout = DEF_CONNECTION_TIMEOUT;
    }
    if hub.request_timeout < Duration::from_secs(1) {
        warn!("Invalid hub request timeout, using default.");
        hub.request_timeout = DEF_REQUEST_TIMEOUT;
    }
    if hub.metadata.trim().is_empty() {
        hub.metadata = DEF_METADATA.into();
    }

    let scheme = match hub.url.scheme() {
        "http" | "https" => None,
        "ws" => Some("http"),
        "wss" => Some("https"),
        scheme => {
            return Err(config::ConfigError::Message(format!(
                "invalid scheme in hub.url: {scheme}. Valid: [http, https]"
            )));
        }
    };
    if let Some(scheme) = scheme {
        hub.url.set_scheme(scheme).map_err(|_| {
            config::ConfigError::Message(format!("invalid hub.url: {}", hub.url))
        })?;
    }

    Ok(settings)
}
