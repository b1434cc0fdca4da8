//! Outbound mail.
//!
//! Thin wrapper over an async SMTP transport. The mailer is an optional
//! service: when SMTP is not configured the caller falls back to logging
//! the message body, so password reset keeps working in development.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::{ApiError, ApiResult};
use crate::server::config::SmtpConfig;

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl Mailer {
    /// Build a mailer from SMTP settings. Returns `None` (and logs) when
    /// the relay host cannot be resolved into a transport.
    pub fn new(config: &SmtpConfig) -> Option<Self> {
        let builder = match AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host) {
            Ok(builder) => builder,
            Err(e) => {
                tracing::error!("Failed to configure SMTP relay {}: {e}", config.host);
                return None;
            }
        };

        let transport = builder
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Some(Mailer {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> ApiResult<()> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| ApiError::internal(format!("invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| ApiError::internal(format!("invalid recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| ApiError::internal(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ApiError::internal(format!("failed to send mail: {e}")))?;

        tracing::info!("Sent mail to {to}: {subject}");
        Ok(())
    }
}
