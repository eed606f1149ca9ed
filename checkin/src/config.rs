//! Kiosk configuration loaded from `CHECKIN_*` environment variables

use std::fmt;
use std::time::Duration;

use crate::error::{CheckinError, CheckinResult};

/// Prefix shared by every configuration variable
pub const ENV_PREFIX: &str = "CHECKIN_";

pub const DEFAULT_SUBDOMAIN: &str = "connectionpointchurch";
pub const DEFAULT_PRINTER: &str = "DYMO_LabelWriter_550";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ATTENDANCE_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the kiosk backend
#[derive(Clone, PartialEq, Eq)]
pub struct KioskConfig {
    pub breeze_api_key: String,
    pub breeze_subdomain: String,
    pub printer_name: String,
    pub breeze_oauth_client_id: Option<String>,
    pub breeze_oauth_client_secret: Option<String>,
    pub http_timeout: Duration,
    pub attendance_timeout: Duration,
}

impl KioskConfig {
    /// Build a configuration with defaults for everything but the API key
    pub fn new(breeze_api_key: impl Into<String>) -> Self {
        Self {
            breeze_api_key: breeze_api_key.into(),
            breeze_subdomain: DEFAULT_SUBDOMAIN.to_string(),
            printer_name: DEFAULT_PRINTER.to_string(),
            breeze_oauth_client_id: None,
            breeze_oauth_client_secret: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            attendance_timeout: Duration::from_secs(DEFAULT_ATTENDANCE_TIMEOUT_SECS),
        }
    }

    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.breeze_subdomain = subdomain.into();
        self
    }

    pub fn with_printer(mut self, printer_name: impl Into<String>) -> Self {
        self.printer_name = printer_name.into();
        self
    }

    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> CheckinResult<Self> {
        // A missing .env file is normal on a provisioned kiosk
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// `lookup` receives the full variable name, prefix included. Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> CheckinResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let breeze_api_key = get("BREEZE_API_KEY").ok_or_else(|| {
            CheckinError::config(format!("{ENV_PREFIX}BREEZE_API_KEY"), "required but not set")
        })?;

        let mut config = Self::new(breeze_api_key);
        if let Some(subdomain) = get("BREEZE_SUBDOMAIN") {
            config.breeze_subdomain = subdomain;
        }
        if let Some(printer_name) = get("PRINTER_NAME") {
            config.printer_name = printer_name;
        }
        config.breeze_oauth_client_id = get("BREEZE_OAUTH_CLIENT_ID");
        config.breeze_oauth_client_secret = get("BREEZE_OAUTH_CLIENT_SECRET");

        if let Some(raw) = get("HTTP_TIMEOUT_SECS") {
            config.http_timeout = parse_timeout("HTTP_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = get("ATTENDANCE_TIMEOUT_SECS") {
            config.attendance_timeout = parse_timeout("ATTENDANCE_TIMEOUT_SECS", &raw)?;
        }

        Ok(config)
    }

    /// Base URL of the roster REST API
    pub fn api_base_url(&self) -> String {
        format!("https://{}.breezechms.com/api", self.breeze_subdomain)
    }

    /// Base URL of the roster web endpoints used for people search
    pub fn ajax_base_url(&self) -> String {
        format!("https://{}.breezechms.com/ajax", self.breeze_subdomain)
    }

    pub fn has_oauth(&self) -> bool {
        self.breeze_oauth_client_id.is_some() && self.breeze_oauth_client_secret.is_some()
    }
}

fn parse_timeout(name: &str, raw: &str) -> CheckinResult<Duration> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(CheckinError::config(
            format!("{ENV_PREFIX}{name}"),
            format!("expected a positive number of seconds, got '{raw}'"),
        )),
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<empty>" } else { "<redacted>" }
}

impl fmt::Debug for KioskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KioskConfig")
            .field("breeze_api_key", &redact(&self.breeze_api_key))
            .field("breeze_subdomain", &self.breeze_subdomain)
            .field("printer_name", &self.printer_name)
            .field("breeze_oauth_client_id", &self.breeze_oauth_client_id)
            .field(
                "breeze_oauth_client_secret",
                &self.breeze_oauth_client_secret.as_deref().map(redact),
            )
            .field("http_timeout", &self.http_timeout)
            .field("attendance_timeout", &self.attendance_timeout)
            .finish()
    }
}
