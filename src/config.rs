use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/enrollment.db";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Credentials and session lifetime the admin session guard checks against.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub session_ttl: Duration,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    pub honeycomb_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub admin: AdminConfig,
    pub secret_key: Option<String>,
    pub telemetry: TelemetryConfig,
}

fn optional(name: &'static str) -> Option<String> {
    dotenvy::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_ttl_hours = match optional("SESSION_TTL_HOURS") {
            Some(value) => match value.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_TTL_HOURS",
                        expected: "a positive number of hours",
                        value,
                    });
                }
            },
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        Ok(Self {
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            admin: AdminConfig {
                username: required("ADMIN_USERNAME")?,
                password: required("ADMIN_PASSWORD")?,
                session_ttl: Duration::hours(session_ttl_hours),
            },
            secret_key: optional("SECRET_KEY"),
            telemetry: TelemetryConfig {
                otlp_endpoint: optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
                honeycomb_api_key: optional("HONEYCOMB_API_KEY"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 7] = [
        "DATABASE_URL",
        "ADMIN_USERNAME",
        "ADMIN_PASSWORD",
        "SESSION_TTL_HOURS",
        "SECRET_KEY",
        "OTEL_EXPORTER_OTLP_ENDPOINT",
        "HONEYCOMB_API_KEY",
    ];

    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = ALL_VARS.iter().map(|k| (*k, None)).collect();
        for (key, value) in vars {
            all.retain(|(k, _)| k != key);
            all.push((*key, Some(*value)));
        }
        temp_env::with_vars(all, f);
    }

    #[test]
    #[serial]
    fn reads_admin_credentials_and_defaults() {
        with_env(
            &[("ADMIN_USERNAME", "registrar"), ("ADMIN_PASSWORD", "s3cret")],
            || {
                let config = AppConfig::from_env().expect("config loads");
                assert_eq!(config.admin.username, "registrar");
                assert_eq!(config.admin.password, "s3cret");
                assert_eq!(config.admin.session_ttl, Duration::hours(8));
                assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
                assert!(config.secret_key.is_none());
                assert!(config.telemetry.otlp_endpoint.is_none());
            },
        );
    }

    #[test]
    #[serial]
    fn missing_admin_password_is_an_error() {
        with_env(&[("ADMIN_USERNAME", "registrar")], || {
            let err = AppConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::Missing("ADMIN_PASSWORD")));
        });
    }

    #[test]
    #[serial]
    fn blank_values_count_as_missing() {
        with_env(
            &[("ADMIN_USERNAME", "   "), ("ADMIN_PASSWORD", "s3cret")],
            || {
                let err = AppConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::Missing("ADMIN_USERNAME")));
            },
        );
    }

    #[test]
    #[serial]
    fn session_ttl_must_be_positive() {
        with_env(
            &[
                ("ADMIN_USERNAME", "registrar"),
                ("ADMIN_PASSWORD", "s3cret"),
                ("SESSION_TTL_HOURS", "0"),
            ],
            || {
                let err = AppConfig::from_env().unwrap_err();
                assert!(matches!(
                    err,
                    ConfigError::Invalid {
                        name: "SESSION_TTL_HOURS",
                        ..
                    }
                ));
            },
        );
    }

    #[test]
    #[serial]
    fn optional_settings_are_picked_up() {
        with_env(
            &[
                ("ADMIN_USERNAME", "registrar"),
                ("ADMIN_PASSWORD", "s3cret"),
                ("DATABASE_URL", "sqlite://tmp/test.db"),
                ("SESSION_TTL_HOURS", "2"),
                ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            ],
            || {
                let config = AppConfig::from_env().expect("config loads");
                assert_eq!(config.database_url, "sqlite://tmp/test.db");
                assert_eq!(config.admin.session_ttl, Duration::hours(2));
                assert_eq!(
                    config.telemetry.otlp_endpoint.as_deref(),
                    Some("http://localhost:4317")
                );
            },
        );
    }
}
