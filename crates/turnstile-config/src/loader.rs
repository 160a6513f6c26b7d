//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, TurnstileConfig};

/// Prefix used when none is set.
pub const DEFAULT_ENV_PREFIX: &str = "TURNSTILE";

/// Builds a [`TurnstileConfig`] from layers, later layers winning:
///
/// 1. defaults or a preset
/// 2. a TOML or JSON file, which replaces the whole configuration and
///    leaves omitted keys at their defaults
/// 3. `PREFIX__SECTION__KEY` environment variables
///
/// ```no_run
/// use turnstile_config::ConfigLoader;
///
/// # fn main() -> Result<(), turnstile_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("turnstile.toml")?
///     .with_env_prefix("TURNSTILE")
///     .load()?;
///
/// println!("listening on {}", config.server.http_addr);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: TurnstileConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from [`TurnstileConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: TurnstileConfig::default(),
            env_prefix: None,
        }
    }

    /// Starts from the development preset.
    ///
    /// ```
    /// use turnstile_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TurnstileConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = TurnstileConfig::production();
        self
    }

    /// Loads a file. The format follows the extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed, or holds
    /// unknown keys.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        self.config = match extension.as_deref() {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        tracing::debug!(path = %path.display(), "configuration file loaded");
        Ok(self)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in `format` (`"toml"` or `"json"`).
    ///
    /// ```
    /// use turnstile_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// assert_eq!(config.server.request_timeout_secs, 30);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on an unknown format or content that does not parse.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(self)
    }

    /// Reads `PREFIX__SECTION__KEY` variables from the process environment
    /// when [`load`](Self::load) runs.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies the given variables now, using the configured prefix or
    /// [`DEFAULT_ENV_PREFIX`]. Variables without the prefix are skipped.
    ///
    /// ```
    /// use turnstile_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_env_vars([("TURNSTILE__WEBSOCKET__IDLE_TIMEOUT_SECS", "0")])
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.websocket.idle_timeout(), None);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails if a value does not parse for its key.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = self
            .env_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string());
        for (key, value) in vars {
            self.apply_env_var(&prefix, key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Loads `.env` from the working directory into the process
    /// environment. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), ".env loaded"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self)
    }

    /// Loads a specific dotenv file into the process environment.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or cannot be parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable variable or an invalid final value.
    pub fn load(self) -> Result<TurnstileConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable variable.
    pub fn load_unvalidated(mut self) -> Result<TurnstileConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.clone() {
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(key, _)| key.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&prefix, &key, &value)?;
            }
        }
        Ok(self.config)
    }

    fn apply_env_var(&mut self, prefix: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };
        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_SECS"] => {
                config.server.request_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_number(key, value)?;
            }

            ["PIPELINE", "CORRELATION_HEADER"] => {
                config.pipeline.correlation_header = value.to_string();
            }
            ["PIPELINE", "TRUST_INCOMING_CORRELATION"] => {
                config.pipeline.trust_incoming_correlation = parse_bool(key, value)?;
            }

            ["WEBSOCKET", "MAX_MESSAGE_SIZE"] => {
                config.websocket.max_message_size = parse_number(key, value)?;
            }
            ["WEBSOCKET", "MAX_FRAME_SIZE"] => {
                config.websocket.max_frame_size = parse_number(key, value)?;
            }
            ["WEBSOCKET", "IDLE_TIMEOUT_SECS"] => {
                config.websocket.idle_timeout_secs = parse_number(key, value)?;
            }

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_bool(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "JSON"] => config.logging.json = parse_bool(key, value)?,
            ["LOGGING", "SPAN_EVENTS"] => config.logging.span_events = parse_bool(key, value)?,
            ["LOGGING", "FILE_LINE_INFO"] => {
                config.logging.file_line_info = parse_bool(key, value)?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => {
                config.logging.include_target = parse_bool(key, value)?;
            }

            ["METRICS", "ENABLED"] => config.metrics.enabled = parse_bool(key, value)?,
            ["METRICS", "DURATION_BUCKETS"] => {
                config.metrics.duration_buckets = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        s.parse::<f64>()
                            .map_err(|_| ConfigError::env_parse_error(key, "expected comma-separated numbers"))
                    })
                    .collect::<Result<_, _>>()?;
            }

            _ => tracing::warn!(var = %key, "unknown configuration variable ignored"),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected a non-negative integer"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}
