use crate::geo::{DEFAULT_RADIUS_MILES, ExpansionPolicy, PolicyError};
use std::{env, fmt::Display, num::NonZeroU32, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub expansion: ExpansionPolicy,
    pub rate_limit_per_second: NonZeroU32,
    pub request_timeout: Duration,
    /// Send plain-HTTP clients to HTTPS (behind a TLS-terminating proxy).
    pub redirect_https: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let bcrypt_cost: u32 = try_load(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".into(),
            });
        }

        let default_radius: f64 = try_load(&lookup, "DEFAULT_RADIUS_MILES", DEFAULT_RADIUS_MILES)?;
        let expansion = ExpansionPolicy::default().with_default_radius(default_radius)?;

        let token_ttl_hours: i64 = try_load(&lookup, "TOKEN_TTL_HOURS", 24)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
                reason: "must be positive".into(),
            });
        }

        let timeout_secs: u64 = try_load(&lookup, "REQUEST_TIMEOUT_SECS", 10)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                value: timeout_secs.to_string(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            port: try_load(&lookup, "PORT", 3000)?,
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
            expansion,
            rate_limit_per_second: try_load(
                &lookup,
                "RATE_LIMIT_PER_SECOND",
                NonZeroU32::new(50).unwrap_or(NonZeroU32::MIN),
            )?,
            request_timeout: Duration::from_secs(timeout_secs),
            redirect_https: load_flag(&lookup, "REDIRECT_HTTPS")?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                value,
                reason: e.to_string(),
            }
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn load_flag<F>(lookup: &F, key: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected true or false".into(),
        }),
    }
}
