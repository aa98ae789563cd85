//! Task and chat-message entities.
//!
//! Tasks are created by clients and mutated by admin/negotiation actions;
//! every mutation is a "saved" event observed by the change watcher. Chat
//! messages are created once and immutable afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identity::UserIdentity;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    UnderReview,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Human-readable label used in emails and dashboards.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::UnderReview => "Under Review",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// Wire value as stored/broadcast (snake_case).
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::UnderReview => "under_review",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// State of the budget negotiation between client and admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    None,
    Countered,
    Accepted,
    Declined,
}

impl NegotiationStatus {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            NegotiationStatus::None => "No Negotiation",
            NegotiationStatus::Countered => "Countered",
            NegotiationStatus::Accepted => "Accepted",
            NegotiationStatus::Declined => "Declined",
        }
    }

    /// Wire value as stored/broadcast (snake_case).
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationStatus::None => "none",
            NegotiationStatus::Countered => "countered",
            NegotiationStatus::Accepted => "accepted",
            NegotiationStatus::Declined => "declined",
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A marketplace task submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Internal database id.
    pub id: DbId,
    /// Optional pre-assigned public code (e.g. `"TSK0042"`).
    pub code: Option<String>,
    /// Task title.
    pub title: String,
    /// Subject area (e.g. `"Mathematics"`).
    pub subject_area: Option<String>,
    /// Education level (e.g. `"Undergraduate"`).
    pub education_level: Option<String>,
    /// Optional deadline.
    pub deadline: Option<Timestamp>,
    /// Budget the client proposed at creation.
    pub proposed_budget: Decimal,
    /// Counter-offer from the admin side, if any.
    pub admin_counter_budget: Option<Decimal>,
    /// Agreed budget once negotiation settles.
    pub budget: Option<Decimal>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Current negotiation state.
    pub negotiation_status: NegotiationStatus,
    /// The client who owns the task.
    pub client: UserIdentity,
    /// The admin assigned to the task, if any.
    pub assigned_admin: Option<UserIdentity>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last mutation time.
    pub updated_at: Timestamp,
}

impl Task {
    /// Public task code: the pre-assigned code, or a zero-padded numeric
    /// fallback of the form `TSK0007`.
    pub fn display_code(&self) -> String {
        match &self.code {
            Some(code) if !code.is_empty() => code.clone(),
            _ => format!("TSK{:04}", self.id),
        }
    }
}

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

/// A chat message attached to a task. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Internal database id.
    pub id: DbId,
    /// The task this message belongs to.
    pub task_id: DbId,
    /// Free-text message body.
    pub body: String,
    /// The sender, when the account still exists.
    pub sender: Option<UserIdentity>,
    /// Creation time.
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> UserIdentity {
        UserIdentity {
            id: 9,
            handle: "client9".to_string(),
            full_name: None,
            email: "client9@example.com".to_string(),
        }
    }

    fn task(id: DbId, code: Option<&str>) -> Task {
        Task {
            id,
            code: code.map(str::to_string),
            title: "Essay Help".to_string(),
            subject_area: None,
            education_level: None,
            deadline: None,
            proposed_budget: Decimal::new(5000, 2),
            admin_counter_budget: None,
            budget: None,
            status: TaskStatus::Pending,
            negotiation_status: NegotiationStatus::None,
            client: client(),
            assigned_admin: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn display_code_prefers_assigned_code() {
        assert_eq!(task(7, Some("TSK9999")).display_code(), "TSK9999");
    }

    #[test]
    fn display_code_zero_pads_fallback() {
        assert_eq!(task(7, None).display_code(), "TSK0007");
        assert_eq!(task(12345, None).display_code(), "TSK12345");
    }

    #[test]
    fn display_code_ignores_empty_code() {
        assert_eq!(task(3, Some("")).display_code(), "TSK0003");
    }

    #[test]
    fn status_labels() {
        assert_eq!(TaskStatus::InProgress.label(), "In Progress");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(NegotiationStatus::Countered.label(), "Countered");
    }
}
