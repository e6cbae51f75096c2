use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use roost_api::mailer::{SmtpSecurity, SmtpSettings};

/// Placeholder JWT secrets that MUST NOT be used in production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub geocoder_url: String,
    pub smtp: SmtpSettings,
    pub contact_recipient: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = var("ROOST_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            if cfg!(debug_assertions) {
                warn!("ROOST_JWT_SECRET is unset or a placeholder; using the development secret");
            } else {
                bail!("ROOST_JWT_SECRET is unset or still a placeholder");
            }
        }
        let jwt_secret = if jwt_secret.is_empty() {
            "dev-secret-change-me".to_string()
        } else {
            jwt_secret
        };

        let smtp = SmtpSettings {
            host: load("ROOST_SMTP_HOST", "localhost")?,
            port: load("ROOST_SMTP_PORT", "587")?,
            security: load::<SmtpSecurity>("ROOST_SMTP_SECURITY", "starttls")?,
            username: var("ROOST_SMTP_USERNAME"),
            password: var("ROOST_SMTP_PASSWORD"),
            from: load("ROOST_MAIL_FROM", "Roost <noreply@roost.local>")?,
        };

        Ok(Self {
            host: load("ROOST_HOST", "0.0.0.0")?,
            port: load("ROOST_PORT", "3000")?,
            db_path: load("ROOST_DB_PATH", "roost.db")?,
            jwt_secret,
            upload_dir: load("ROOST_UPLOAD_DIR", "./uploads")?,
            geocoder_url: load("ROOST_GEOCODER_URL", "https://nominatim.openstreetmap.org")?,
            contact_recipient: load("ROOST_CONTACT_RECIPIENT", "contact@roost.local")?,
            smtp,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn load<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e: T::Err| anyhow::anyhow!("{}", e))
        .with_context(|| format!("invalid {key} value '{raw}'"))
}
