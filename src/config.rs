//! Engine configuration, read once at startup and passed into constructors.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

const SIRI_SM_BASE_URL: &str = "SIRI_SM_BASE_URL";
const SIRI_API_KEY: &str = "SIRI_API_KEY";
const EGRESS_PROXY_URL: &str = "EGRESS_PROXY_URL";
const VEHICLE_FEED_BASE_URL: &str = "VEHICLE_FEED_BASE_URL";
const DIDNT_STOP_VELOCITY_KMH: &str = "DIDNT_STOP_VELOCITY_KMH";
const TOLERANCE_MINUTES: &str = "TOLERANCE_MINUTES";
const FEED_TIMEOUT_SECS: &str = "FEED_TIMEOUT_SECS";
const VEHICLE_SEARCH_RADIUS_KM: &str = "VEHICLE_SEARCH_RADIUS_KM";

/// Feed calls must stay short-lived; the upstream contract is one bounded
/// wait per verification, and anything longer keeps claims hanging.
const MAX_FEED_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything environment-injected: endpoints, the shared secret, the egress
/// proxy, and the verdict-affecting tunables.
///
/// The didn't-stop velocity threshold and the tolerance window are policy
/// constants inherited from operations; change them with stakeholders, not
/// in code.
#[derive(Clone)]
pub struct EngineConfig {
    pub siri_base_url: String,
    pub siri_api_key: String,
    pub egress_proxy_url: Option<String>,
    pub vehicle_feed_base_url: String,
    pub didnt_stop_velocity_kmh: f64,
    pub default_tolerance_minutes: i64,
    pub feed_timeout: Duration,
    pub vehicle_search_radius_km: f64,
}

impl EngineConfig {
    /// Loads configuration from process environment variables.
    ///
    /// Missing credentials or endpoints fail fast here rather than
    /// degrading silently inside a client.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an injectable variable
    /// source, so parsing is testable without touching process state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let timeout_secs = parse_or(&lookup, FEED_TIMEOUT_SECS, MAX_FEED_TIMEOUT_SECS)?;
        if timeout_secs == 0 || timeout_secs > MAX_FEED_TIMEOUT_SECS {
            return Err(ConfigError::Invalid {
                var: FEED_TIMEOUT_SECS,
                reason: format!("must be between 1 and {MAX_FEED_TIMEOUT_SECS} seconds"),
            });
        }

        // The remaining tunables feed straight into verdict math, where a
        // negative threshold or radius silently inverts a comparison.
        let velocity_kmh: f64 = parse_or(&lookup, DIDNT_STOP_VELOCITY_KMH, 15.0)?;
        if !velocity_kmh.is_finite() || velocity_kmh < 0.0 {
            return Err(ConfigError::Invalid {
                var: DIDNT_STOP_VELOCITY_KMH,
                reason: "must be a non-negative number".to_string(),
            });
        }
        let tolerance_minutes = parse_or(&lookup, TOLERANCE_MINUTES, 30)?;
        if tolerance_minutes < 0 {
            return Err(ConfigError::Invalid {
                var: TOLERANCE_MINUTES,
                reason: "must not be negative".to_string(),
            });
        }
        let radius_km: f64 = parse_or(&lookup, VEHICLE_SEARCH_RADIUS_KM, 0.5)?;
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ConfigError::Invalid {
                var: VEHICLE_SEARCH_RADIUS_KM,
                reason: "must be a positive number".to_string(),
            });
        }

        Ok(Self {
            siri_base_url: required(SIRI_SM_BASE_URL)?,
            siri_api_key: required(SIRI_API_KEY)?,
            egress_proxy_url: lookup(EGRESS_PROXY_URL).filter(|v| !v.is_empty()),
            vehicle_feed_base_url: required(VEHICLE_FEED_BASE_URL)?,
            didnt_stop_velocity_kmh: velocity_kmh,
            default_tolerance_minutes: tolerance_minutes,
            feed_timeout: Duration::from_secs(timeout_secs),
            vehicle_search_radius_km: radius_km,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

// The API key must never reach logs, so Debug is written out by hand.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("siri_base_url", &self.siri_base_url)
            .field("siri_api_key", &"<redacted>")
            .field("egress_proxy_url", &self.egress_proxy_url.as_deref().map(|_| "<set>"))
            .field("vehicle_feed_base_url", &self.vehicle_feed_base_url)
            .field("didnt_stop_velocity_kmh", &self.didnt_stop_velocity_kmh)
            .field("default_tolerance_minutes", &self.default_tolerance_minutes)
            .field("feed_timeout", &self.feed_timeout)
            .field("vehicle_search_radius_km", &self.vehicle_search_radius_km)
            .finish()
    }
}
