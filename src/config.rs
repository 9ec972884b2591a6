//! Configuration types.
//!
//! Everything is read from the environment. Each constructor has a
//! `from_lookup` twin taking a key lookup so tests never touch process env.

use std::time::Duration;

use crate::error::ConfigError;
use crate::flows::support_group;
use crate::wizard::FlowEndpoints;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_IDLE_SECS: u64 = 1800; // 30 minutes
const DEFAULT_SWEEP_SECS: u64 = 60;

/// Hosting configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
    /// How often the sweep task looks for idle sessions.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            session_idle_timeout: Duration::from_secs(DEFAULT_IDLE_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_SECS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or(&lookup, "INTAKE_PORT", DEFAULT_PORT)?;
        let idle = parse_or(&lookup, "INTAKE_SESSION_IDLE_SECS", DEFAULT_IDLE_SECS)?;
        let sweep = parse_or(&lookup, "INTAKE_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_SECS)?;

        if sweep == 0 {
            return Err(ConfigError::InvalidValue {
                key: "INTAKE_SWEEP_INTERVAL_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            port,
            session_idle_timeout: Duration::from_secs(idle),
            sweep_interval: Duration::from_secs(sweep),
        })
    }
}

/// Intake endpoints per shipped flow. `None` disables the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    pub workshop: Option<FlowEndpoints>,
    pub support_group: Option<FlowEndpoints>,
    pub professionals: Option<FlowEndpoints>,
}

impl FlowSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let workshop = endpoints(&lookup, "WORKSHOP")?;
        if workshop.is_none() {
            tracing::warn!("INTAKE_WORKSHOP_ENDPOINT not set, workshop flow disabled");
        }

        let support_group =
            endpoints(&lookup, "SUPPORT_GROUP")?.or_else(|| Some(support_group::default_endpoints()));

        let professionals = endpoints(&lookup, "PROFESSIONALS")?;
        if professionals.is_none() {
            tracing::warn!("INTAKE_PROFESSIONALS_ENDPOINT not set, professionals flow disabled");
        }

        Ok(Self {
            workshop,
            support_group,
            professionals,
        })
    }
}

fn endpoints(
    lookup: &impl Fn(&str) -> Option<String>,
    flow: &str,
) -> Result<Option<FlowEndpoints>, ConfigError> {
    let endpoint_key = format!("INTAKE_{flow}_ENDPOINT");
    let redirect_key = format!("INTAKE_{flow}_REDIRECT_URL");

    let Some(submit_url) = non_empty(lookup(&endpoint_key)) else {
        return Ok(None);
    };
    let redirect_url = non_empty(lookup(&redirect_key)).ok_or_else(|| {
        ConfigError::MissingRequired {
            key: redirect_key.clone(),
            hint: format!("{endpoint_key} is set, so a post-submit redirect is needed too."),
        }
    })?;

    Ok(Some(FlowEndpoints::new(submit_url, redirect_url)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup(key)) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
    }
}
