//! Log-only mail backend for development (`EMAIL_BACKEND=console`).

use crate::delivery::{MailError, MailTransport, OutgoingEmail};

/// Composes nothing, sends nothing; logs the message instead.
#[derive(Debug, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MailTransport for ConsoleMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            purpose = email.purpose,
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            "Console mail backend: not sending"
        );
        tracing::debug!(body = %email.text_body, "Console mail body");
        Ok(())
    }
}
