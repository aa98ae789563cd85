//! Mail configuration, built once at startup.
//!
//! All email settings live in one [`EmailConfig`] constructed from the
//! environment and passed by reference into the notifier and transports --
//! no per-call settings lookups. Validation is eager: a missing `EMAIL_HOST`
//! with the SMTP backend active is a startup error, not a per-send surprise.
//! The sender address stays optional; a send without one is skipped with a
//! log instead of failing the caller.

use std::time::Duration;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default SMTP round-trip timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default dashboard base URL embedded in email links.
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Built-in allow-list for new-task notifications when `NEW_TASK_RECIPIENTS`
/// is not configured. Deliberately static, not derived from the database.
const DEFAULT_NEW_TASK_RECIPIENTS: &[&str] = &["tasks@taskforge.local"];

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for mail configuration problems, reported at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The SMTP backend is active but no host is configured.
    #[error("EMAIL_HOST must be set when emails are enabled with the smtp backend")]
    MissingHost,

    /// An environment variable held an unparseable value.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// MailBackend
// ---------------------------------------------------------------------------

/// Which delivery backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    /// Real SMTP delivery via `lettre`.
    Smtp,
    /// Log-only backend for development; composes but never sends.
    Console,
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Mail settings snapshot.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Global kill switch: when true every send is skipped with a log.
    pub disabled: bool,
    /// Delivery backend selector.
    pub backend: MailBackend,
    /// SMTP server hostname. Required for the SMTP backend.
    pub host: Option<String>,
    /// SMTP server port.
    pub port: u16,
    /// Optional SMTP username.
    pub username: Option<String>,
    /// Optional SMTP password.
    pub password: Option<String>,
    /// Negotiate STARTTLS when opening the connection.
    pub use_tls: bool,
    /// SMTP round-trip timeout.
    pub timeout: Duration,
    /// Sender address: `DEFAULT_FROM_EMAIL`, falling back to
    /// `EMAIL_HOST_USER`. `None` means sends are skipped.
    pub from_address: Option<String>,
    /// Base URL for dashboard links embedded in emails.
    pub frontend_url: String,
    /// Log the full envelope of every outgoing message.
    pub smtp_debug: bool,
    /// Fixed recipient allow-list for new-task notifications.
    pub new_task_recipients: Vec<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable               | Default                        |
    /// |------------------------|--------------------------------|
    /// | `DISABLE_EMAILS`       | `false`                        |
    /// | `EMAIL_BACKEND`        | `smtp` (`console` = log only)  |
    /// | `EMAIL_HOST`           | -- (required for smtp backend) |
    /// | `EMAIL_PORT`           | `587`                          |
    /// | `EMAIL_HOST_USER`      | --                             |
    /// | `EMAIL_HOST_PASSWORD`  | --                             |
    /// | `EMAIL_USE_TLS`        | `true`                         |
    /// | `EMAIL_TIMEOUT`        | `10` (seconds)                 |
    /// | `DEFAULT_FROM_EMAIL`   | falls back to `EMAIL_HOST_USER`|
    /// | `FRONTEND_URL`         | `http://localhost:3000`        |
    /// | `SMTP_DEBUG`           | `false`                        |
    /// | `NEW_TASK_RECIPIENTS`  | built-in allow-list            |
    pub fn from_env() -> Result<Self, ConfigError> {
        let disabled = env_bool("DISABLE_EMAILS", false)?;

        let backend = match std::env::var("EMAIL_BACKEND").ok().as_deref() {
            None | Some("smtp") => MailBackend::Smtp,
            Some("console") => MailBackend::Console,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "EMAIL_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let host = std::env::var("EMAIL_HOST").ok().filter(|h| !h.is_empty());
        if !disabled && backend == MailBackend::Smtp && host.is_none() {
            return Err(ConfigError::MissingHost);
        }

        let port = match std::env::var("EMAIL_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "EMAIL_PORT",
                value: raw,
            })?,
            Err(_) => DEFAULT_SMTP_PORT,
        };

        let timeout_secs = match std::env::var("EMAIL_TIMEOUT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "EMAIL_TIMEOUT",
                value: raw,
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let username = std::env::var("EMAIL_HOST_USER").ok().filter(|v| !v.is_empty());
        let from_address = std::env::var("DEFAULT_FROM_EMAIL")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| username.clone());

        let new_task_recipients = match std::env::var("NEW_TASK_RECIPIENTS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => DEFAULT_NEW_TASK_RECIPIENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        Ok(Self {
            disabled,
            backend,
            host,
            port,
            username,
            password: std::env::var("EMAIL_HOST_PASSWORD").ok(),
            use_tls: env_bool("EMAIL_USE_TLS", true)?,
            timeout: Duration::from_secs(timeout_secs),
            from_address,
            frontend_url: std::env::var("FRONTEND_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            smtp_debug: env_bool("SMTP_DEBUG", false)?,
            new_task_recipients,
        })
    }

    /// The effective sender address, if any is configured.
    pub fn sender(&self) -> Option<&str> {
        self.from_address.as_deref()
    }
}

/// Parse a boolean environment variable. Accepts `1/0`, `true/false`,
/// `yes/no` (case-insensitive).
fn env_bool(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue { var, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
