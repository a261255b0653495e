//! Process configuration, read from the environment.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use tablebook_auth::DEFAULT_TOKEN_TTL_SECS;
use tablebook_observability::LogFormat;

/// Signing secret used when `APP_ENV=local` and `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "tablebook-local-dev-secret";

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080));
const DEFAULT_DB_QUERY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_ADMIN_NAME: &str = "Administrator";
/// Upper bound on session lifetime (30 days).
const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Deployment environment; selects defaults and the log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Local,
    Dev,
    Prod,
}

impl AppEnv {
    pub fn log_format(self) -> LogFormat {
        match self {
            AppEnv::Local => LogFormat::Pretty,
            AppEnv::Dev | AppEnv::Prod => LogFormat::Json,
        }
    }
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(AppEnv::Local),
            "dev" => Ok(AppEnv::Dev),
            "prod" => Ok(AppEnv::Prod),
            other => Err(ConfigError::Invalid {
                key: "APP_ENV",
                reason: format!("expected local, dev or prod, got '{other}'"),
            }),
        }
    }
}

/// Credentials of an admin principal created at startup if missing.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub name: String,
    pub login: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub database_url: Option<String>,
    pub db_query_timeout: StdDuration,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => AppEnv::default(),
        };

        let bind_addr: SocketAddr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), DEFAULT_BIND_ADDR)?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if secret.trim().is_empty() => return Err(ConfigError::Empty("JWT_SECRET")),
            Some(secret) => secret,
            None if env == AppEnv::Local => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let ttl_secs: i64 = parse_or("TOKEN_TTL_SECS", lookup("TOKEN_TTL_SECS"), DEFAULT_TOKEN_TTL_SECS)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                reason: format!("must be between 1 and {MAX_TOKEN_TTL_SECS}"),
            });
        }
        let token_ttl = Duration::try_seconds(ttl_secs).ok_or_else(|| ConfigError::Invalid {
            key: "TOKEN_TTL_SECS",
            reason: "out of range".to_string(),
        })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let timeout_ms: u64 = parse_or(
            "DB_QUERY_TIMEOUT_MS",
            lookup("DB_QUERY_TIMEOUT_MS"),
            DEFAULT_DB_QUERY_TIMEOUT_MS,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_QUERY_TIMEOUT_MS",
                reason: "must be positive".to_string(),
            });
        }

        let bootstrap_admin = match (lookup("ADMIN_LOGIN"), lookup("ADMIN_PASSWORD")) {
            (None, None) => None,
            (Some(login), Some(password)) => Some(BootstrapAdmin {
                name: lookup("ADMIN_NAME").unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
                login,
                password,
            }),
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_LOGIN")),
        };

        Ok(Self {
            env,
            bind_addr,
            jwt_secret,
            token_ttl,
            database_url,
            db_query_timeout: StdDuration::from_millis(timeout_ms),
            bootstrap_admin,
        })
    }

    /// Whether the process fell back to the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("db_query_timeout", &self.db_query_timeout)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn local_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.env, AppEnv::Local);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert!(cfg.uses_dev_secret());
        assert_eq!(cfg.token_ttl, Duration::hours(1));
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.db_query_timeout, StdDuration::from_secs(5));
        assert_eq!(cfg.bootstrap_admin, None);
        assert_eq!(cfg.env.log_format(), LogFormat::Pretty);
    }

    #[test]
    fn secret_is_required_outside_local() {
        for env in ["dev", "prod"] {
            assert_eq!(
                config(&[("APP_ENV", env)]).unwrap_err(),
                ConfigError::Missing("JWT_SECRET")
            );
        }
        let cfg = config(&[("APP_ENV", "prod"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.env, AppEnv::Prod);
        assert!(!cfg.uses_dev_secret());
        assert_eq!(cfg.env.log_format(), LogFormat::Json);
    }

    #[test]
    fn empty_secret_is_always_rejected() {
        assert_eq!(
            config(&[("JWT_SECRET", "  ")]).unwrap_err(),
            ConfigError::Empty("JWT_SECRET")
        );
    }

    #[test]
    fn explicit_values_are_parsed() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("TOKEN_TTL_SECS", "600"),
            ("DATABASE_URL", "postgres://localhost/tablebook"),
            ("DB_QUERY_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.token_ttl, Duration::minutes(10));
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/tablebook"));
        assert_eq!(cfg.db_query_timeout, StdDuration::from_millis(250));
    }

    #[test]
    fn bad_values_name_their_key() {
        for (key, value) in [
            ("APP_ENV", "staging"),
            ("BIND_ADDR", "nowhere"),
            ("TOKEN_TTL_SECS", "soon"),
            ("TOKEN_TTL_SECS", "0"),
            ("DB_QUERY_TIMEOUT_MS", "-1"),
        ] {
            match config(&[(key, value)]) {
                Err(ConfigError::Invalid { key: got, .. }) => assert_eq!(got, key),
                other => panic!("{key}={value}: expected Invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn oversized_ttl_is_rejected_not_panicking() {
        for value in ["9223372036854775807", "100000000000000", "2592001"] {
            match config(&[("TOKEN_TTL_SECS", value)]) {
                Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "TOKEN_TTL_SECS"),
                other => panic!("TOKEN_TTL_SECS={value}: expected Invalid, got {other:?}"),
            }
        }

        let cfg = config(&[("TOKEN_TTL_SECS", "2592000")]).unwrap();
        assert_eq!(cfg.token_ttl, Duration::days(30));
    }

    #[test]
    fn bootstrap_admin_needs_both_credentials() {
        let cfg = config(&[("ADMIN_LOGIN", "root"), ("ADMIN_PASSWORD", "rootpass1")]).unwrap();
        let admin = cfg.bootstrap_admin.unwrap();
        assert_eq!(admin.login, "root");
        assert_eq!(admin.name, "Administrator");

        assert_eq!(
            config(&[("ADMIN_LOGIN", "root")]).unwrap_err(),
            ConfigError::Missing("ADMIN_PASSWORD")
        );
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = config(&[
            ("JWT_SECRET", "top-secret-key"),
            ("DATABASE_URL", "postgres://u:pw@db/x"),
            ("ADMIN_LOGIN", "root"),
            ("ADMIN_PASSWORD", "rootpass1"),
        ])
        .unwrap();
        let out = format!("{cfg:?}");
        assert!(!out.contains("top-secret-key"));
        assert!(!out.contains("pw@db"));
        assert!(!out.contains("rootpass1"));
    }
}
