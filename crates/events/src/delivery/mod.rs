//! Mail delivery seam: composed message, error taxonomy, transport trait.
//!
//! The notifier composes an [`OutgoingEmail`] and hands it to a
//! [`MailTransport`]. Production uses [`SmtpMailer`](smtp::SmtpMailer) or
//! the log-only [`ConsoleMailer`](console::ConsoleMailer); tests substitute
//! recording stubs.

pub mod console;
pub mod smtp;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for mail delivery failures.
///
/// Network/DNS resolution problems are classified separately from generic
/// transport failures so operators can tell "cannot reach the SMTP host"
/// apart from authentication or protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// DNS resolution or connection-level failure.
    #[error("DNS/network error: {0} (cannot resolve or reach SMTP host)")]
    Network(String),

    /// SMTP transport failure (authentication, protocol, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// Log a delivery failure with the classification the error carries.
pub fn log_send_failure(purpose: &str, err: &MailError) {
    match err {
        MailError::Network(msg) => {
            tracing::error!(purpose, error = %msg, "DNS/network error: cannot resolve or reach SMTP host");
        }
        other => {
            tracing::error!(purpose, error = %other, "Failed to send email");
        }
    }
}

// ---------------------------------------------------------------------------
// OutgoingEmail
// ---------------------------------------------------------------------------

/// A fully composed transactional email, ready for a transport.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    /// Short purpose tag for logs: `"new_task"`, `"status_update"`,
    /// `"chat_notify"`.
    pub purpose: &'static str,
    /// Subject line.
    pub subject: String,
    /// Plain-text body (HTML with tags stripped).
    pub text_body: String,
    /// Rendered HTML body.
    pub html_body: String,
    /// Sender address.
    pub from: String,
    /// Reply-To address; defaults to the sender.
    pub reply_to: Option<String>,
    /// Recipient addresses. Never empty by the time a transport sees it.
    pub to: Vec<String>,
}

// ---------------------------------------------------------------------------
// MailTransport
// ---------------------------------------------------------------------------

/// Delivery backend for composed emails.
///
/// Each call owns its own connection lifecycle; implementations do not pool
/// or reuse connections.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver the email, propagating any failure to the caller.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}
