// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Behavior knobs read by the request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    /// Group a caller must hold to review sign-ups or read rosters.
    pub manager_group: String,
    /// Reject new sign-ups when an offered role is already full.
    pub signup_capacity_precheck: bool,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            manager_group: "Managers".to_string(),
            signup_capacity_precheck: true,
        }
    }
}

/// rescue-core configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL or SQLite connection URL
    pub database_url: String,
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// Connection pool size
    pub db_max_connections: u32,
    /// Header carrying the authenticated caller id
    pub caller_id_header: String,
    /// Header carrying the caller's comma-separated groups
    pub caller_groups_header: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Handler behavior
    pub handlers: HandlerSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `RESCUE_DATABASE_URL`: PostgreSQL or SQLite connection string
    ///
    /// Optional (with defaults):
    /// - `RESCUE_HTTP_PORT`: HTTP server port (default: 8080)
    /// - `RESCUE_DB_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `RESCUE_MANAGER_GROUP`: manager group name (default: Managers)
    /// - `RESCUE_CALLER_ID_HEADER`: default `x-caller-id`
    /// - `RESCUE_CALLER_GROUPS_HEADER`: default `x-caller-groups`
    /// - `RESCUE_SIGNUP_CAPACITY_PRECHECK`: `true`/`false` (default: true)
    /// - `RESCUE_LOG_FORMAT`: `text`/`json` (default: text)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("RESCUE_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("RESCUE_DATABASE_URL"))?;

        let http_port: u16 = std::env::var("RESCUE_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("RESCUE_HTTP_PORT", "must be a valid port number"))?;

        let db_max_connections: u32 = std::env::var("RESCUE_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::Invalid(
                "RESCUE_DB_MAX_CONNECTIONS",
                "must be a positive integer",
            ))?;

        let manager_group =
            std::env::var("RESCUE_MANAGER_GROUP").unwrap_or_else(|_| "Managers".to_string());
        if manager_group.trim().is_empty() {
            return Err(ConfigError::Invalid("RESCUE_MANAGER_GROUP", "must not be empty"));
        }

        let signup_capacity_precheck = match std::env::var("RESCUE_SIGNUP_CAPACITY_PRECHECK")
            .unwrap_or_else(|_| "true".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                return Err(ConfigError::Invalid(
                    "RESCUE_SIGNUP_CAPACITY_PRECHECK",
                    "must be true or false",
                ));
            }
        };

        let log_format = match std::env::var("RESCUE_LOG_FORMAT")
            .unwrap_or_else(|_| "text".to_string())
            .as_str()
        {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            _ => return Err(ConfigError::Invalid("RESCUE_LOG_FORMAT", "must be text or json")),
        };

        Ok(Self {
            database_url,
            http_addr: SocketAddr::from(([0, 0, 0, 0], http_port)),
            db_max_connections,
            caller_id_header: std::env::var("RESCUE_CALLER_ID_HEADER")
                .unwrap_or_else(|_| "x-caller-id".to_string()),
            caller_groups_header: std::env::var("RESCUE_CALLER_GROUPS_HEADER")
                .unwrap_or_else(|_| "x-caller-groups".to_string()),
            log_format,
            handlers: HandlerSettings {
                manager_group,
                signup_capacity_precheck,
            },
        })
    }

    /// True when the database URL points at SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.database_url.starts_with("sqlite:")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Serializes tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 8] = [
        "RESCUE_DATABASE_URL",
        "RESCUE_HTTP_PORT",
        "RESCUE_DB_MAX_CONNECTIONS",
        "RESCUE_MANAGER_GROUP",
        "RESCUE_CALLER_ID_HEADER",
        "RESCUE_CALLER_GROUPS_HEADER",
        "RESCUE_SIGNUP_CAPACITY_PRECHECK",
        "RESCUE_LOG_FORMAT",
    ];

    /// Sets env vars for a test and restores them on drop
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        /// Starts from a clean slate for every variable the config reads.
        fn clean() -> Self {
            let mut guard = Self { vars: Vec::new() };
            for key in VARS {
                guard.remove(key);
            }
            guard
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();
        guard.set("RESCUE_DATABASE_URL", "postgres://localhost/rescue");

        let config = Config::from_env().unwrap();

        assert_eq!(config.database_url, "postgres://localhost/rescue");
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.caller_id_header, "x-caller-id");
        assert_eq!(config.caller_groups_header, "x-caller-groups");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.handlers, HandlerSettings::default());
        assert!(!config.is_sqlite());
    }

    #[test]
    fn test_config_from_env_all_custom() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();
        guard.set("RESCUE_DATABASE_URL", "sqlite:.data/rescue.db");
        guard.set("RESCUE_HTTP_PORT", "9090");
        guard.set("RESCUE_DB_MAX_CONNECTIONS", "3");
        guard.set("RESCUE_MANAGER_GROUP", "Coordinators");
        guard.set("RESCUE_CALLER_ID_HEADER", "x-auth-sub");
        guard.set("RESCUE_CALLER_GROUPS_HEADER", "x-auth-groups");
        guard.set("RESCUE_SIGNUP_CAPACITY_PRECHECK", "false");
        guard.set("RESCUE_LOG_FORMAT", "json");

        let config = Config::from_env().unwrap();

        assert!(config.is_sqlite());
        assert_eq!(config.http_addr.port(), 9090);
        assert_eq!(config.db_max_connections, 3);
        assert_eq!(config.caller_id_header, "x-auth-sub");
        assert_eq!(config.handlers.manager_group, "Coordinators");
        assert!(!config.handlers.signup_capacity_precheck);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_config_missing_database_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::clean();

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RESCUE_DATABASE_URL")));
        assert!(err.to_string().contains("RESCUE_DATABASE_URL"));
    }

    #[test]
    fn test_config_invalid_values() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let cases = [
            ("RESCUE_HTTP_PORT", "99999"),
            ("RESCUE_DB_MAX_CONNECTIONS", "0"),
            ("RESCUE_MANAGER_GROUP", "  "),
            ("RESCUE_SIGNUP_CAPACITY_PRECHECK", "maybe"),
            ("RESCUE_LOG_FORMAT", "xml"),
        ];

        for (key, value) in cases {
            let mut guard = EnvGuard::clean();
            guard.set("RESCUE_DATABASE_URL", "postgres://localhost/rescue");
            guard.set(key, value);

            let err = Config::from_env().unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid(k, _) if k == key),
                "{} = {} should be rejected, got {:?}",
                key,
                value,
                err
            );
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::Missing("MY_VAR");
        assert_eq!(
            missing.to_string(),
            "missing required environment variable: MY_VAR"
        );

        let invalid = ConfigError::Invalid("MY_VAR", "must be a number");
        assert_eq!(
            invalid.to_string(),
            "invalid value for MY_VAR: must be a number"
        );
    }
}
