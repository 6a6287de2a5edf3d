use config::{Config, ConfigError, Environment, File};
use derive_more::Display;
use serde::Deserialize;
use dotenv::dotenv;
use std::{collections::HashMap, env, fmt, str::FromStr, time::Duration};
use zeroize::Zeroizing;

use crate::constants::DEFAULT_BRAND_NAME;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Server settings, loaded once at start-up.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    /// Honour `X-Forwarded-For` / `X-Real-IP` when identifying clients.
    #[serde(default = "default_true")]
    pub trust_forwarded_for: bool,

    #[serde(default = "default_smtp_timeout")]
    pub smtp_timeout_secs: u64,

    #[serde(default = "default_max_payload")]
    pub max_payload_bytes: usize,

    #[serde(default = "default_sweep_interval")]
    pub rate_limit_sweep_secs: u64,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Contact".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_smtp_timeout() -> u64 {
    10
}
fn default_max_payload() -> usize {
    16 * 1024
}
fn default_sweep_interval() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            cors_allowed_origins: default_cors_origins(),
            trust_forwarded_for: default_true(),
            smtp_timeout_secs: default_smtp_timeout(),
            max_payload_bytes: default_max_payload(),
            rate_limit_sweep_secs: default_sweep_interval(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.env = env_name;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.smtp_timeout_secs == 0 {
            errors.push("smtp_timeout_secs must be greater than zero");
        }
        if self.max_payload_bytes == 0 {
            errors.push("max_payload_bytes must be greater than zero");
        }
        if self.rate_limit_sweep_secs == 0 {
            errors.push("rate_limit_sweep_secs must be greater than zero");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_secs)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

pub const SMTP_HOST: &str = "SMTP_HOST";
pub const SMTP_PORT: &str = "SMTP_PORT";
pub const SMTP_SECURE: &str = "SMTP_SECURE";
pub const SMTP_USER: &str = "SMTP_USER";
pub const SMTP_PASS: &str = "SMTP_PASS";
pub const CONTACT_TO_EMAIL: &str = "CONTACT_TO_EMAIL";
pub const CONTACT_FROM_EMAIL: &str = "CONTACT_FROM_EMAIL";
pub const SITE_URL: &str = "SITE_URL";
pub const BRAND_NAME: &str = "BRAND_NAME";
pub const BRAND_LOGO_URL: &str = "BRAND_LOGO_URL";

/// Names of required mail settings that were absent or unusable.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("missing mail settings: {}", _0.join(", "))]
pub struct MissingSettings(pub Vec<String>);

impl MissingSettings {
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

/// SMTP relay, destination and branding for contact notifications.
#[derive(Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub password: Zeroizing<String>,
    pub to: String,
    pub from: String,
    pub brand_name: String,
    pub site_url: String,
    pub logo_url: String,
}

impl EmailConfig {
    /// Snapshot of the process environment (after `.env` is applied).
    pub fn from_env() -> Result<Self, MissingSettings> {
        dotenv().ok();
        let vars: HashMap<String, String> = env::vars().collect();
        Self::resolve(&vars)
    }

    /// Builds the config from an environment-style map without touching
    /// process state. Either every required setting is usable or the error
    /// lists each one that is not.
    pub fn resolve(vars: &HashMap<String, String>) -> Result<Self, MissingSettings> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut missing = Vec::new();
        let mut require = |key: &str| {
            let value = get(key);
            if value.is_none() {
                missing.push(key.to_string());
            }
            value.unwrap_or_default()
        };

        let host = require(SMTP_HOST);
        let raw_port = require(SMTP_PORT);
        let user = require(SMTP_USER);
        let password = require(SMTP_PASS);
        let to = require(CONTACT_TO_EMAIL);

        let port = parse_port(&raw_port);
        if port.is_none() && !missing.iter().any(|m| m == SMTP_PORT) {
            missing.push(SMTP_PORT.to_string());
        }

        let port = match port {
            Some(port) if missing.is_empty() => port,
            _ => return Err(MissingSettings(missing)),
        };

        let secure = get(SMTP_SECURE)
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(port == 465);

        Ok(EmailConfig {
            host,
            port,
            secure,
            from: get(CONTACT_FROM_EMAIL).unwrap_or_else(|| user.clone()),
            user,
            password: Zeroizing::new(password),
            to,
            brand_name: get(BRAND_NAME).unwrap_or_else(|| DEFAULT_BRAND_NAME.to_string()),
            site_url: get(SITE_URL).unwrap_or_default(),
            logo_url: get(BRAND_LOGO_URL).unwrap_or_default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        EmailConfig {
            host: "smtp.example.net".into(),
            port: 587,
            secure: false,
            user: "relay@example.net".into(),
            password: Zeroizing::new("hunter2".into()),
            to: "owner@example.org".into(),
            from: "relay@example.net".into(),
            brand_name: DEFAULT_BRAND_NAME.into(),
            site_url: String::new(),
            logo_url: String::new(),
        }
    }
}

/// Accepts a positive integer port that fits in `u16`.
fn parse_port(raw: &str) -> Option<u16> {
    raw.parse::<u16>().ok().filter(|port| *port > 0)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("password", &self.password.as_str().redact())
            .field("to", &self.to)
            .field("from", &self.from)
            .field("brand_name", &self.brand_name)
            .field("site_url", &self.site_url)
            .field("logo_url", &self.logo_url)
            .finish()
    }
}
