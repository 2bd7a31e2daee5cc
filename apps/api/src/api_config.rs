use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use appdeck_application::DEFAULT_MAX_CHAIN_DEPTH;
use appdeck_core::AppError;
use tracing_subscriber::EnvFilter;

/// How `submit` actions targeting an api reach the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSubmitMode {
    Simulated {
        success_percent: u8,
        latency_ms: u64,
    },
    Http {
        timeout_ms: u64,
        max_attempts: u8,
        retry_backoff_ms: u64,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub save_debounce: Duration,
    pub save_flush_interval: Duration,
    pub app_cache_ttl_seconds: u32,
    pub max_action_chain_depth: usize,
    pub api_submit_mode: ApiSubmitMode,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_host: "127.0.0.1".to_owned(),
            api_port: 3001,
            frontend_url: "http://localhost:3000".to_owned(),
            save_debounce: Duration::from_millis(750),
            save_flush_interval: Duration::from_millis(250),
            app_cache_ttl_seconds: 30,
            max_action_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            api_submit_mode: ApiSubmitMode::Simulated {
                success_percent: 80,
                latency_ms: 0,
            },
        }
    }
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let api_host = lookup("API_HOST").unwrap_or(defaults.api_host);
        let api_port = parse_or("API_PORT", lookup("API_PORT"), defaults.api_port)?;
        let frontend_url = lookup("FRONTEND_URL").unwrap_or(defaults.frontend_url);

        let save_debounce_ms = positive("SAVE_DEBOUNCE_MS", lookup("SAVE_DEBOUNCE_MS"), 750_u64)?;
        let save_flush_interval_ms = positive(
            "SAVE_FLUSH_INTERVAL_MS",
            lookup("SAVE_FLUSH_INTERVAL_MS"),
            250_u64,
        )?;
        let app_cache_ttl_seconds = parse_or(
            "APP_CACHE_TTL_SECONDS",
            lookup("APP_CACHE_TTL_SECONDS"),
            defaults.app_cache_ttl_seconds,
        )?;
        let max_action_chain_depth = positive(
            "MAX_ACTION_CHAIN_DEPTH",
            lookup("MAX_ACTION_CHAIN_DEPTH"),
            defaults.max_action_chain_depth,
        )?;

        let api_submit_mode = match lookup("API_SUBMIT_MODE")
            .unwrap_or_else(|| "simulated".to_owned())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "simulated" => {
                let success_percent = parse_or(
                    "SIMULATED_SUBMIT_SUCCESS_PERCENT",
                    lookup("SIMULATED_SUBMIT_SUCCESS_PERCENT"),
                    80_u8,
                )?;
                if success_percent > 100 {
                    return Err(AppError::Validation(
                        "SIMULATED_SUBMIT_SUCCESS_PERCENT must be between 0 and 100".to_owned(),
                    ));
                }
                ApiSubmitMode::Simulated {
                    success_percent,
                    latency_ms: parse_or(
                        "SIMULATED_SUBMIT_LATENCY_MS",
                        lookup("SIMULATED_SUBMIT_LATENCY_MS"),
                        0_u64,
                    )?,
                }
            }
            "http" => ApiSubmitMode::Http {
                timeout_ms: positive(
                    "HTTP_SUBMIT_TIMEOUT_MS",
                    lookup("HTTP_SUBMIT_TIMEOUT_MS"),
                    10_000_u64,
                )?,
                max_attempts: positive(
                    "HTTP_SUBMIT_MAX_ATTEMPTS",
                    lookup("HTTP_SUBMIT_MAX_ATTEMPTS"),
                    2_u8,
                )?,
                retry_backoff_ms: parse_or(
                    "HTTP_SUBMIT_RETRY_BACKOFF_MS",
                    lookup("HTTP_SUBMIT_RETRY_BACKOFF_MS"),
                    200_u64,
                )?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "API_SUBMIT_MODE must be either 'simulated' or 'http', got '{other}'"
                )));
            }
        };

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            save_debounce: Duration::from_millis(save_debounce_ms),
            save_flush_interval: Duration::from_millis(save_flush_interval_ms),
            app_cache_ttl_seconds,
            max_action_chain_depth,
            api_submit_mode,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}

fn positive<T>(name: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value = parse_or(name, raw, default)?;
    if value <= T::default() {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(value)
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use appdeck_core::AppError;

    use super::{ApiConfig, ApiSubmitMode};

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).unwrap_or_else(|_| unreachable!());
        assert_eq!(config.api_port, 3001);
        assert_eq!(config.save_debounce, Duration::from_millis(750));
        assert_eq!(config.max_action_chain_depth, 50);
        assert_eq!(
            config.api_submit_mode,
            ApiSubmitMode::Simulated {
                success_percent: 80,
                latency_ms: 0
            }
        );
    }

    #[test]
    fn http_mode_reads_retry_settings() {
        let config = load(&[
            ("API_SUBMIT_MODE", "HTTP"),
            ("HTTP_SUBMIT_MAX_ATTEMPTS", "4"),
            ("APP_CACHE_TTL_SECONDS", "0"),
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.app_cache_ttl_seconds, 0);
        assert_eq!(
            config.api_submit_mode,
            ApiSubmitMode::Http {
                timeout_ms: 10_000,
                max_attempts: 4,
                retry_backoff_ms: 200
            }
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("SAVE_DEBOUNCE_MS", "0")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("SIMULATED_SUBMIT_SUCCESS_PERCENT", "101")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("API_SUBMIT_MODE", "carrier-pigeon")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("API_PORT", "port")]),
            Err(AppError::Validation(_))
        ));
    }
}
