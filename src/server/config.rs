//! Server configuration, loaded once at startup from the environment.
//!
//! Missing optional services (SMTP) do not prevent startup: the mailer is
//! simply absent and OTP delivery degrades to logging.

/// SMTP settings for outbound mail. Only present when SMTP_HOST is set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    /// Read configuration from environment variables, with defaults
    /// suitable for local development.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://bazaar.db?mode=rwc".to_string());

        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let smtp = match std::env::var("SMTP_HOST") {
            Ok(smtp_host) => Some(SmtpConfig {
                host: smtp_host,
                username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
                password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_address: std::env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "no-reply@bazaar.local".to_string()),
            }),
            Err(_) => {
                tracing::warn!("SMTP_HOST not set; OTP emails will be logged instead of sent");
                None
            }
        };

        AppConfig {
            database_url,
            host,
            port,
            smtp,
        }
    }
}
