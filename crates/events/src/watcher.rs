//! Post-commit save hooks and the change watcher.
//!
//! Instead of implicit, globally-registered signal receivers, the write path
//! owns an explicit [`SaveHooks`] registry and invokes it synchronously
//! right after a successful write, passing `(previous_state_or_absent,
//! new_state)`. First creation is `previous == None`; duplicate saves of
//! unrelated fields therefore never re-trigger creation-only behavior.
//!
//! [`ChangeWatcher`] is the production subscriber: it broadcasts a snapshot
//! of every saved task to the admin dashboard group and the owning client's
//! group, and on first creation additionally dispatches the new-task email
//! and a smaller `task_created` broadcast. No failure in here may abort the
//! originating save; notification errors are caught and logged.

use std::sync::Arc;

use serde_json::json;

use taskforge_core::groups::{client_group, GROUP_ADMIN_DASHBOARD};
use taskforge_core::{ChatMessage, Task};

use crate::bus::{BroadcastBus, BusMessage};
use crate::notifier::Notifier;

// ---------------------------------------------------------------------------
// Hook traits and registry
// ---------------------------------------------------------------------------

/// Subscriber to task save events.
#[async_trait::async_trait]
pub trait TaskSaveHook: Send + Sync {
    /// Called after a task write commits. `previous` is `None` on creation.
    async fn task_saved(&self, previous: Option<&Task>, current: &Task);
}

/// Subscriber to chat-message save events.
#[async_trait::async_trait]
pub trait MessageSaveHook: Send + Sync {
    /// Called after a message write commits. `previous` is `None` on creation.
    async fn message_saved(&self, previous: Option<&ChatMessage>, current: &ChatMessage);
}

/// Explicit subscriber mapping per entity kind, owned by the write path.
///
/// Hooks run in registration order, awaited one at a time, on the caller's
/// task. They return nothing: a hook that must not fail the save has to
/// swallow and log its own errors.
#[derive(Default)]
pub struct SaveHooks {
    task: Vec<Arc<dyn TaskSaveHook>>,
    message: Vec<Arc<dyn MessageSaveHook>>,
}

impl SaveHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task-save subscriber.
    pub fn on_task(mut self, hook: Arc<dyn TaskSaveHook>) -> Self {
        self.task.push(hook);
        self
    }

    /// Register a message-save subscriber.
    pub fn on_message(mut self, hook: Arc<dyn MessageSaveHook>) -> Self {
        self.message.push(hook);
        self
    }

    /// Fan a task save out to all task subscribers.
    pub async fn task_saved(&self, previous: Option<&Task>, current: &Task) {
        for hook in &self.task {
            hook.task_saved(previous, current).await;
        }
    }

    /// Fan a message save out to all message subscribers.
    pub async fn message_saved(&self, previous: Option<&ChatMessage>, current: &ChatMessage) {
        for hook in &self.message {
            hook.message_saved(previous, current).await;
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeWatcher
// ---------------------------------------------------------------------------

/// Broadcasts live updates and triggers creation emails on record saves.
pub struct ChangeWatcher {
    bus: Arc<dyn BroadcastBus>,
    notifier: Arc<Notifier>,
}

impl ChangeWatcher {
    pub fn new(bus: Arc<dyn BroadcastBus>, notifier: Arc<Notifier>) -> Self {
        Self { bus, notifier }
    }

    /// Broadcast snapshot of a task: ids and labels as the dashboards
    /// consume them, money amounts stringified.
    fn task_snapshot(task: &Task) -> serde_json::Value {
        json!({
            "id": task.id,
            "status": task.status.as_str(),
            "negotiation_status": task.negotiation_status.as_str(),
            "admin_counter_budget": task.admin_counter_budget.map(|b| b.to_string()),
            "budget": task.budget.map(|b| b.to_string()),
            "proposed_budget": task.proposed_budget.to_string(),
            "title": task.title,
        })
    }
}

#[async_trait::async_trait]
impl TaskSaveHook for ChangeWatcher {
    /// Ordering within one save is fixed: admin-dashboard update, per-client
    /// update, creation email, `task_created` broadcast.
    async fn task_saved(&self, previous: Option<&Task>, current: &Task) {
        let snapshot = Self::task_snapshot(current);

        self.bus.group_send(
            GROUP_ADMIN_DASHBOARD,
            BusMessage::new("task_updated", json!({ "task": snapshot })),
        );
        self.bus.group_send(
            &client_group(current.client.id),
            BusMessage::new("task_updated", json!({ "task": snapshot })),
        );

        if previous.is_none() {
            // A notification failure must never fail the triggering write.
            if let Err(err) = self.notifier.notify_task_created(current).await {
                tracing::error!(
                    task_id = current.id,
                    error = %err,
                    "Failed to send new task email"
                );
            }

            self.bus.group_send(
                GROUP_ADMIN_DASHBOARD,
                BusMessage::new(
                    "task_created",
                    json!({ "task": { "id": current.id, "title": current.title } }),
                ),
            );
        }
    }
}

#[async_trait::async_trait]
impl MessageSaveHook for ChangeWatcher {
    /// Reserved extension point: chat emails are not dispatched automatically.
    async fn message_saved(&self, previous: Option<&ChatMessage>, current: &ChatMessage) {
        if previous.is_some() {
            return;
        }
        tracing::debug!(
            message_id = current.id,
            task_id = current.task_id,
            "Chat message created; no automatic email notification"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::delivery::{MailError, MailTransport, OutgoingEmail};
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use taskforge_core::{NegotiationStatus, TaskStatus, UserIdentity};

    /// Bus and transport stubs share one ordered log so relative ordering of
    /// broadcasts and email dispatch is observable.
    type SharedLog = Arc<Mutex<Vec<String>>>;

    struct RecordingBus {
        log: SharedLog,
    }

    impl BroadcastBus for RecordingBus {
        fn group_send(&self, group: &str, message: BusMessage) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{group}:{}", message.kind));
        }
    }

    struct LoggingTransport {
        log: SharedLog,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl MailTransport for LoggingTransport {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            self.log.lock().unwrap().push(format!("email:{}", email.purpose));
            if self.fail {
                Err(MailError::Network("simulated DNS failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn watcher(fail_email: bool) -> (ChangeWatcher, SharedLog) {
        let log: SharedLog = Arc::new(Mutex::new(Vec::new()));
        let bus = Arc::new(RecordingBus { log: log.clone() });
        let transport = Arc::new(LoggingTransport {
            log: log.clone(),
            fail: fail_email,
        });
        let notifier = Arc::new(Notifier::immediate(Arc::new(test_config()), transport));
        (ChangeWatcher::new(bus, notifier), log)
    }

    fn task() -> Task {
        Task {
            id: 7,
            code: None,
            title: "Essay Help".to_string(),
            subject_area: None,
            education_level: None,
            deadline: None,
            proposed_budget: Decimal::new(5000, 2),
            admin_counter_budget: Some(Decimal::new(6000, 2)),
            budget: None,
            status: TaskStatus::Pending,
            negotiation_status: NegotiationStatus::Countered,
            client: UserIdentity {
                id: 9,
                handle: "client9".to_string(),
                full_name: None,
                email: "client9@example.com".to_string(),
            },
            assigned_admin: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn creation_fires_broadcasts_email_and_created_event_in_order() {
        let (watcher, log) = watcher(false);

        watcher.task_saved(None, &task()).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "admin_dashboard:task_updated",
                "client_9:task_updated",
                "email:new_task",
                "admin_dashboard:task_created",
            ]
        );
    }

    #[tokio::test]
    async fn update_fires_only_the_two_broadcasts() {
        let (watcher, log) = watcher(false);
        let current = task();
        let previous = task();

        watcher.task_saved(Some(&previous), &current).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["admin_dashboard:task_updated", "client_9:task_updated"]
        );
    }

    #[tokio::test]
    async fn email_failure_is_swallowed_and_created_broadcast_still_fires() {
        let (watcher, log) = watcher(true);

        // Must not panic or propagate despite the failing transport.
        watcher.task_saved(None, &task()).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "admin_dashboard:task_updated",
                "client_9:task_updated",
                "email:new_task",
                "admin_dashboard:task_created",
            ]
        );
    }

    #[tokio::test]
    async fn snapshot_stringifies_money_fields() {
        let snapshot = ChangeWatcher::task_snapshot(&task());
        assert_eq!(snapshot["id"], 7);
        assert_eq!(snapshot["status"], "pending");
        assert_eq!(snapshot["negotiation_status"], "countered");
        assert_eq!(snapshot["proposed_budget"], "50.00");
        assert_eq!(snapshot["admin_counter_budget"], "60.00");
        assert_eq!(snapshot["budget"], serde_json::Value::Null);
        assert_eq!(snapshot["title"], "Essay Help");
    }

    #[tokio::test]
    async fn message_hook_is_noop() {
        let (watcher, log) = watcher(false);
        let msg = ChatMessage {
            id: 1,
            task_id: 7,
            body: "hello".to_string(),
            sender: None,
            created_at: chrono::Utc::now(),
        };

        watcher.message_saved(None, &msg).await;
        watcher.message_saved(Some(&msg), &msg).await;

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_hooks_run_in_registration_order() {
        struct Tag(SharedLog, &'static str);

        #[async_trait::async_trait]
        impl TaskSaveHook for Tag {
            async fn task_saved(&self, _previous: Option<&Task>, _current: &Task) {
                self.0.lock().unwrap().push(self.1.to_string());
            }
        }

        let log: SharedLog = Arc::new(Mutex::new(Vec::new()));
        let hooks = SaveHooks::new()
            .on_task(Arc::new(Tag(log.clone(), "first")))
            .on_task(Arc::new(Tag(log.clone(), "second")));

        hooks.task_saved(None, &task()).await;

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }
}
