use std::time::Duration;
use url::Url;

use crate::notification::scheduler::DEFAULT_POLL_INTERVAL;
use crate::notification::service::DEFAULT_BANNER_TTL;
use crate::reminder::service::{DEFAULT_REMINDER_CHECK_INTERVAL, DEFAULT_REMINDER_LEAD};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL in {name}: {value}")]
    InvalidUrl { name: String, value: String },

    #[error("Invalid number in {name}: {value}")]
    InvalidNumber { name: String, value: String },
}

/// Client settings, read from `CURALINK_*` environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub token: Option<String>,
    pub poll_interval: Duration,
    pub banner_ttl: Duration,
    pub reminder_lead: Duration,
    pub reminder_check_interval: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let raw_url = get("CURALINK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(raw_url.trim()).map_err(|_| ConfigError::InvalidUrl {
            name: "CURALINK_API_URL".to_string(),
            value: raw_url.clone(),
        })?;

        Ok(Self {
            api_url,
            token: get("CURALINK_TOKEN"),
            poll_interval: duration_var(&get, "CURALINK_POLL_INTERVAL_MS", Duration::from_millis)?
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            banner_ttl: duration_var(&get, "CURALINK_BANNER_TTL_SECS", Duration::from_secs)?
                .unwrap_or(DEFAULT_BANNER_TTL),
            reminder_lead: duration_var(&get, "CURALINK_REMINDER_LEAD_SECS", Duration::from_secs)?
                .unwrap_or(DEFAULT_REMINDER_LEAD),
            reminder_check_interval: duration_var(
                &get,
                "CURALINK_REMINDER_CHECK_SECS",
                Duration::from_secs,
            )?
            .unwrap_or(DEFAULT_REMINDER_CHECK_INTERVAL),
        })
    }
}

fn duration_var<G>(
    get: &G,
    name: &str,
    unit: fn(u64) -> Duration,
) -> Result<Option<Duration>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(unit(n))),
            _ => Err(ConfigError::InvalidNumber {
                name: name.to_string(),
                value,
            }),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.token, None);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.banner_ttl, Duration::from_secs(10));
        assert_eq!(config.reminder_lead, Duration::from_secs(600));
        assert_eq!(config.reminder_check_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CURALINK_API_URL", "https://api.example.org"),
            ("CURALINK_TOKEN", "abc"),
            ("CURALINK_POLL_INTERVAL_MS", "1500"),
            ("CURALINK_BANNER_TTL_SECS", "4"),
            ("CURALINK_REMINDER_LEAD_SECS", " 300 "),
        ]))
        .unwrap();
        assert_eq!(config.api_url.host_str(), Some("api.example.org"));
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert_eq!(config.banner_ttl, Duration::from_secs(4));
        assert_eq!(config.reminder_lead, Duration::from_secs(300));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[("CURALINK_TOKEN", " "), ("CURALINK_API_URL", "")])).unwrap();
        assert_eq!(config.token, None);
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("CURALINK_API_URL", "not a url")])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("CURALINK_POLL_INTERVAL_MS", "fast")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("CURALINK_BANNER_TTL_SECS", "0")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
