//! Email delivery for sign-in codes.
//!
//! Uses SMTP via lettre when configured. Without SMTP configuration the
//! service logs the code instead of mailing it, which is how local
//! development and CI run.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use ration_tds_core::Email;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Sign-in code delivery.
#[derive(Clone)]
pub struct EmailService {
    transport: Transport,
}

#[derive(Clone)]
enum Transport {
    Smtp {
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from_address: String,
    },
    /// No SMTP configured; codes are logged.
    Disabled,
}

impl EmailService {
    /// Create an email service from optional SMTP configuration.
    ///
    /// SMTP connection errors downgrade to the disabled transport with a
    /// warning rather than failing startup; sign-in still works, codes just
    /// land in the logs.
    #[must_use]
    pub fn from_config(config: Option<&EmailConfig>) -> Self {
        let Some(config) = config else {
            return Self {
                transport: Transport::Disabled,
            };
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host) {
            Ok(builder) => Self {
                transport: Transport::Smtp {
                    mailer: builder
                        .port(config.smtp_port)
                        .credentials(credentials)
                        .build(),
                    from_address: config.from_address.clone(),
                },
            },
            Err(e) => {
                tracing::warn!(error = %e, "SMTP relay setup failed; sign-in codes will be logged");
                Self {
                    transport: Transport::Disabled,
                }
            }
        }
    }

    /// Deliver a sign-in code to an address.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the message cannot be built or sent.
    pub async fn send_sign_in_code(&self, to: &Email, code: &str) -> Result<(), EmailError> {
        match &self.transport {
            Transport::Smtp {
                mailer,
                from_address,
            } => {
                let message = Message::builder()
                    .from(
                        from_address
                            .parse()
                            .map_err(|_| EmailError::InvalidAddress(from_address.clone()))?,
                    )
                    .to(to
                        .as_str()
                        .parse()
                        .map_err(|_| EmailError::InvalidAddress(to.as_str().to_owned()))?)
                    .subject("Your ration portal sign-in code")
                    .header(ContentType::TEXT_PLAIN)
                    .body(format!(
                        "Your sign-in code is {code}.\n\n\
                         It expires shortly. If you did not request it, ignore this email."
                    ))?;

                mailer.send(message).await?;
                Ok(())
            }
            Transport::Disabled => {
                // Local development path. The code is sensitive but this
                // transport only exists where there is no SMTP at all.
                tracing::info!(email = %to, code = %code, "SMTP disabled; sign-in code logged");
                Ok(())
            }
        }
    }
}
