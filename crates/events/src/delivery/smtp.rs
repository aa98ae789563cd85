//! SMTP delivery via the `lettre` async transport.
//!
//! Each send opens its own connection (STARTTLS by default), authenticates
//! with the configured credentials, and closes when the transport is
//! dropped. There is no pooling; concurrent sends are fully independent.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{ConfigError, EmailConfig};
use crate::delivery::{MailError, MailTransport, OutgoingEmail};

/// Sends composed emails over SMTP.
#[derive(Debug)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    use_tls: bool,
    timeout: std::time::Duration,
    debug: bool,
}

impl SmtpMailer {
    /// Build an SMTP mailer from the validated mail configuration.
    ///
    /// Fails with [`ConfigError::MissingHost`] if no host is configured;
    /// `EmailConfig::from_env` already guarantees one when this backend is
    /// selected with emails enabled.
    pub fn from_config(config: &EmailConfig) -> Result<Self, ConfigError> {
        let host = config.host.clone().ok_or(ConfigError::MissingHost)?;
        Ok(Self {
            host,
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            use_tls: config.use_tls,
            timeout: config.timeout,
            debug: config.smtp_debug,
        })
    }

    /// Assemble the MIME message: multipart alternative plain + HTML.
    fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
        let from: Mailbox = email.from.parse()?;

        let mut builder = Message::builder()
            .from(from.clone())
            .subject(email.subject.clone());

        match &email.reply_to {
            Some(addr) => builder = builder.reply_to(addr.parse()?),
            None => builder = builder.reply_to(from),
        }

        for recipient in &email.to {
            builder = builder.to(recipient.parse()?);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))
    }

    /// Construct a one-shot transport for a single send.
    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let mut builder = if self.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
                .map_err(classify_smtp_error)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
        };

        builder = builder.port(self.port).timeout(Some(self.timeout));

        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(builder.build())
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = Self::build_message(email)?;

        if self.debug {
            tracing::debug!(
                purpose = email.purpose,
                from = %email.from,
                to = ?email.to,
                subject = %email.subject,
                host = %self.host,
                port = self.port,
                "SMTP envelope"
            );
        }

        let mailer = self.build_transport()?;
        mailer.send(message).await.map_err(classify_smtp_error)?;

        tracing::info!(
            purpose = email.purpose,
            to = ?email.to,
            "Notification email sent"
        );
        Ok(())
    }
}

/// Distinguish network/DNS failures from generic SMTP failures by probing
/// the error's source chain for an `std::io::Error`.
fn classify_smtp_error(err: lettre::transport::smtp::Error) -> MailError {
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        if cause.is::<std::io::Error>() {
            return MailError::Network(err.to_string());
        }
        source = cause.source();
    }
    MailError::Transport(err)
}
