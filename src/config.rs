use std::env;
use std::fmt;
use std::time::Duration;

/// Verification links stay valid for two minutes unless configured otherwise.
pub const DEFAULT_EXPIRY_WINDOW_MS: i64 = 120_000;

/// One year. Larger windows are treated as misconfiguration.
pub const MAX_EXPIRY_WINDOW_MS: i64 = 365 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key} value: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Unknown MAIL_PROVIDER '{0}', expected 'mailgun' or 'smtp'")]
    UnknownMailProvider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Mailgun,
    Smtp,
}

#[derive(Clone)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    pub api_base: String,
}

impl fmt::Debug for MailgunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailgunConfig")
            .field("api_key", &"<redacted>")
            .field("domain", &self.domain)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl DatabaseConfig {
    /// `DATABASE_URL` wins over the individual connection parameters.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                urlencoding::encode(&self.user),
                urlencoding::encode(&self.password),
                self.host,
                self.port,
                urlencoding::encode(&self.name)
            ),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mail_provider: MailProvider,
    pub mail_from: String,
    pub mailgun: MailgunConfig,
    pub smtp: SmtpConfig,
    pub verify_email_link: String,
    pub database: DatabaseConfig,
    pub expiry_window_ms: i64,
    pub mail_send_timeout: Duration,
    pub store_timeout: Duration,
    pub dedup_window: Duration,
}

impl AppConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mail_provider = match var("MAIL_PROVIDER", "mailgun").to_lowercase().as_str() {
            "mailgun" => MailProvider::Mailgun,
            "smtp" => MailProvider::Smtp,
            other => return Err(ConfigError::UnknownMailProvider(other.to_string())),
        };

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: parse_number(&lookup, "PORT", 8080)?,
            mail_provider,
            mail_from: var("MAILGUN_FROM", "Firstname Lastname <firstnamelastname.me>"),
            mailgun: MailgunConfig {
                api_key: var("MAILGUN_API_KEY", "xxx"),
                domain: var("MAILGUN_DOMAIN", "firstnamelastname.me"),
                api_base: var("MAILGUN_API_BASE", "https://api.mailgun.net/v3"),
            },
            smtp: SmtpConfig {
                host: var("SMTP_HOST", "localhost"),
                port: parse_number(&lookup, "SMTP_PORT", 1025)?,
                username: lookup("SMTP_USERNAME"),
                password: lookup("SMTP_PASSWORD"),
            },
            verify_email_link: var("VERIFY_EMAIL_LINK", "https://example.com/verify"),
            database: DatabaseConfig {
                url: lookup("DATABASE_URL"),
                name: var("DATABASE_NAME", "webapp"),
                user: var("DATABASE_USER", "webapp"),
                password: var("DATABASE_PASSWORD", "password"),
                host: var("DATABASE_HOST", "localhost"),
                port: parse_number(&lookup, "DATABASE_PORT", 5432)?,
            },
            expiry_window_ms: parse_expiry_window(lookup("VERIFICATION_LINK_TIME_WINDOW")),
            mail_send_timeout: Duration::from_millis(parse_number(
                &lookup,
                "MAIL_SEND_TIMEOUT_MS",
                10_000,
            )?),
            store_timeout: Duration::from_millis(parse_number(&lookup, "STORE_TIMEOUT_MS", 5_000)?),
            dedup_window: Duration::from_secs(parse_number(&lookup, "DEDUP_WINDOW_SECS", 0)?),
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

// An unusable window falls back to the default instead of failing startup.
fn parse_expiry_window(raw: Option<String>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_EXPIRY_WINDOW_MS;
    };

    match raw.trim().parse::<i64>() {
        Ok(ms) if ms > 0 && ms <= MAX_EXPIRY_WINDOW_MS => ms,
        _ => {
            tracing::warn!(
                value = %raw,
                default_ms = DEFAULT_EXPIRY_WINDOW_MS,
                "Invalid VERIFICATION_LINK_TIME_WINDOW, using default"
            );
            DEFAULT_EXPIRY_WINDOW_MS
        }
    }
}
