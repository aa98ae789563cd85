//! Transactional email composition and dispatch.
//!
//! [`Notifier`] builds subject and body content for the three notification
//! kinds and hands the composed message to its delivery strategy. Both
//! delivery policies present in the write path are explicit, named
//! strategies rather than two divergent function definitions:
//!
//! - [`DeliveryStrategy::Immediate`] -- synchronous-verified: the SMTP round
//!   trip happens inline and failures propagate to the caller.
//! - [`DeliveryStrategy::Queued`] -- fire-and-forget through the bounded
//!   [`MailQueue`]; the call returns once the message is buffered and
//!   worker-side failures are only ever logged.
//!
//! Configuration gaps (emails disabled, no recipients, no sender) are skips
//! with a log line, never errors: a missing mail setup must not break the
//! write path that triggered the notification.

use std::sync::Arc;

use taskforge_core::format::{format_budget, format_deadline, message_preview, or_not_specified};
use taskforge_core::html::strip_tags;
use taskforge_core::identity::sender_display_name;
use taskforge_core::{ChatMessage, Task, UserIdentity};

use crate::config::EmailConfig;
use crate::delivery::{log_send_failure, MailError, MailTransport, OutgoingEmail};
use crate::queue::MailQueue;
use crate::templates::{
    render_new_message_notification, render_new_task_notification, render_task_status_update,
    NewMessageContext, NewTaskContext, StatusUpdateContext,
};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Why a notify call performed no send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The global `DISABLE_EMAILS` switch is on.
    EmailsDisabled,
    /// The resolved recipient list was empty.
    NoRecipients,
    /// No sender address is configured.
    NoSender,
    /// The fire-and-forget queue rejected the message.
    QueueFull,
}

/// What a notify call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Sent synchronously and acknowledged by the transport.
    Sent,
    /// Buffered for a queue worker; final outcome only visible in logs.
    Queued,
    /// Nothing sent, by policy.
    Skipped(SkipReason),
}

/// How composed messages leave the notifier.
pub enum DeliveryStrategy {
    /// Send inline; errors propagate to the caller.
    Immediate(Arc<dyn MailTransport>),
    /// Buffer into the bounded queue; errors stay on the worker side.
    Queued(MailQueue),
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Composes and dispatches the three transactional notification emails.
pub struct Notifier {
    config: Arc<EmailConfig>,
    strategy: DeliveryStrategy,
}

impl Notifier {
    /// Notifier with the synchronous-verified delivery policy.
    pub fn immediate(config: Arc<EmailConfig>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            config,
            strategy: DeliveryStrategy::Immediate(transport),
        }
    }

    /// Notifier with the fire-and-forget delivery policy.
    pub fn queued(config: Arc<EmailConfig>, queue: MailQueue) -> Self {
        Self {
            config,
            strategy: DeliveryStrategy::Queued(queue),
        }
    }

    /// Notify the configured admin allow-list that a new task was created.
    ///
    /// Skips silently (log only) when emails are disabled, the allow-list is
    /// empty, or no sender address is configured.
    pub async fn notify_task_created(&self, task: &Task) -> Result<DeliveryOutcome, MailError> {
        self.log_preamble("new_task");

        if self.config.disabled {
            tracing::info!(purpose = "new_task", "Email skipped: DISABLE_EMAILS is set");
            return Ok(DeliveryOutcome::Skipped(SkipReason::EmailsDisabled));
        }

        let recipients: Vec<String> = self
            .config
            .new_task_recipients
            .iter()
            .filter(|r| !r.is_empty())
            .cloned()
            .collect();
        if recipients.is_empty() {
            tracing::info!(purpose = "new_task", "Email skipped: no recipients configured");
            return Ok(DeliveryOutcome::Skipped(SkipReason::NoRecipients));
        }

        let Some(from) = self.config.sender() else {
            tracing::info!(
                purpose = "new_task",
                "Email skipped: DEFAULT_FROM_EMAIL/EMAIL_HOST_USER not configured"
            );
            return Ok(DeliveryOutcome::Skipped(SkipReason::NoSender));
        };

        let code = task.display_code();
        let subject = format!("NEW TASK \u{2022} {} \u{2022} {}", task.title, code);

        let deadline = format_deadline(task.deadline.as_ref());
        let budget = format_budget(&task.proposed_budget);
        let task_url = format!("{}/admin/dashboard", self.config.frontend_url);
        let html = render_new_task_notification(&NewTaskContext {
            task_title: &task.title,
            task_subject: or_not_specified(task.subject_area.as_deref()),
            education_level: or_not_specified(task.education_level.as_deref()),
            deadline: &deadline,
            proposed_budget: &budget,
            student_name: task.client.display_name(),
            student_email: &task.client.email,
            task_code: &code,
            task_url: &task_url,
        });

        self.dispatch(compose("new_task", subject, html, from, recipients))
            .await
    }

    /// Notify a single user that a task's status changed.
    pub async fn notify_status_changed(
        &self,
        task: &Task,
        recipient: &UserIdentity,
        update_message: &str,
    ) -> Result<DeliveryOutcome, MailError> {
        self.log_preamble("status_update");

        if self.config.disabled {
            tracing::info!(purpose = "status_update", "Email skipped: DISABLE_EMAILS is set");
            return Ok(DeliveryOutcome::Skipped(SkipReason::EmailsDisabled));
        }
        let Some(from) = self.config.sender() else {
            tracing::info!(
                purpose = "status_update",
                "Email skipped: DEFAULT_FROM_EMAIL/EMAIL_HOST_USER not configured"
            );
            return Ok(DeliveryOutcome::Skipped(SkipReason::NoSender));
        };

        let subject = format!("Task Update: {}", task.title);
        let task_url = format!(
            "{}/client/dashboard/tasks/{}",
            self.config.frontend_url, task.id
        );
        let html = render_task_status_update(&StatusUpdateContext {
            student_name: recipient.display_name(),
            task_title: &task.title,
            task_status: task.status.label(),
            update_message,
            admin_name: task
                .assigned_admin
                .as_ref()
                .map(UserIdentity::display_name),
            task_url: &task_url,
        });

        self.dispatch(compose(
            "status_update",
            subject,
            html,
            from,
            vec![recipient.email.clone()],
        ))
        .await
    }

    /// Notify a single user about a new chat message on a task.
    ///
    /// The body shows at most the first 100 characters of the message, and
    /// the sender name falls back full name → handle → `"User"`.
    pub async fn notify_new_message(
        &self,
        task: &Task,
        message: &ChatMessage,
        recipient: &UserIdentity,
    ) -> Result<DeliveryOutcome, MailError> {
        self.log_preamble("chat_notify");

        if self.config.disabled {
            tracing::info!(purpose = "chat_notify", "Email skipped: DISABLE_EMAILS is set");
            return Ok(DeliveryOutcome::Skipped(SkipReason::EmailsDisabled));
        }
        let Some(from) = self.config.sender() else {
            tracing::info!(
                purpose = "chat_notify",
                "Email skipped: DEFAULT_FROM_EMAIL/EMAIL_HOST_USER not configured"
            );
            return Ok(DeliveryOutcome::Skipped(SkipReason::NoSender));
        };

        let subject = format!("New Message - Task: {}", task.title);
        let preview = message_preview(&message.body);
        let task_url = format!(
            "{}/client/dashboard/tasks/{}",
            self.config.frontend_url, task.id
        );
        let html = render_new_message_notification(&NewMessageContext {
            task_title: &task.title,
            sender_name: sender_display_name(message.sender.as_ref()),
            message_preview: &preview,
            task_url: &task_url,
        });

        self.dispatch(compose(
            "chat_notify",
            subject,
            html,
            from,
            vec![recipient.email.clone()],
        ))
        .await
    }

    /// Structured snapshot of the mail configuration, logged on every call.
    fn log_preamble(&self, purpose: &str) {
        tracing::info!(
            purpose,
            disabled = self.config.disabled,
            from = ?self.config.sender(),
            host = ?self.config.host,
            port = self.config.port,
            tls = self.config.use_tls,
            timeout_secs = self.config.timeout.as_secs(),
            "Email dispatch"
        );
    }

    /// Hand off a composed message according to the delivery strategy.
    async fn dispatch(&self, email: OutgoingEmail) -> Result<DeliveryOutcome, MailError> {
        match &self.strategy {
            DeliveryStrategy::Immediate(transport) => match transport.send(&email).await {
                Ok(()) => {
                    tracing::info!(purpose = email.purpose, to = ?email.to, "Email sent");
                    Ok(DeliveryOutcome::Sent)
                }
                Err(err) => {
                    log_send_failure(email.purpose, &err);
                    Err(err)
                }
            },
            DeliveryStrategy::Queued(queue) => match queue.enqueue(email).await {
                Ok(()) => Ok(DeliveryOutcome::Queued),
                Err(_) => Ok(DeliveryOutcome::Skipped(SkipReason::QueueFull)),
            },
        }
    }
}

/// Assemble the final message: plain text derived from the HTML, Reply-To
/// mirroring the sender.
fn compose(
    purpose: &'static str,
    subject: String,
    html: String,
    from: &str,
    to: Vec<String>,
) -> OutgoingEmail {
    OutgoingEmail {
        purpose,
        subject,
        text_body: strip_tags(&html),
        html_body: html,
        from: from.to_string(),
        reply_to: Some(from.to_string()),
        to,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
