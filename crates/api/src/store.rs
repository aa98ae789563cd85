//! In-memory task and message store.
//!
//! Stands in for the external persistence layer; what matters here is the
//! write path contract: every successful write is followed, synchronously,
//! by a [`SaveHooks`] invocation with `(previous_state_or_absent,
//! new_state)`. Hooks run after the write lock is released so a slow
//! subscriber never blocks other writers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

use taskforge_core::types::{DbId, Timestamp};
use taskforge_core::{ChatMessage, CoreError, NegotiationStatus, Task, TaskStatus, UserIdentity};
use taskforge_events::SaveHooks;

use rust_decimal::Decimal;

/// Fields a client supplies when creating a task.
#[derive(Debug)]
pub struct TaskDraft {
    pub code: Option<String>,
    pub title: String,
    pub subject_area: Option<String>,
    pub education_level: Option<String>,
    pub deadline: Option<Timestamp>,
    pub proposed_budget: Decimal,
    pub client: UserIdentity,
}

/// Task and chat-message storage with post-commit save hooks.
pub struct TaskStore {
    users: RwLock<HashMap<DbId, UserIdentity>>,
    tasks: RwLock<HashMap<DbId, Task>>,
    messages: RwLock<HashMap<DbId, ChatMessage>>,
    next_task_id: AtomicI64,
    next_message_id: AtomicI64,
    hooks: SaveHooks,
}

impl TaskStore {
    /// Create an empty store owning the given subscriber registry.
    pub fn new(hooks: SaveHooks) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
            next_task_id: AtomicI64::new(1),
            next_message_id: AtomicI64::new(1),
            hooks,
        }
    }

    /// Register or replace a user identity.
    pub async fn upsert_user(&self, user: UserIdentity) {
        self.users.write().await.insert(user.id, user);
    }

    /// Fetch a user identity by id.
    pub async fn get_user(&self, id: DbId) -> Result<UserIdentity, CoreError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("user", id))
    }

    /// Insert a new task and fire the task save hooks with `previous=None`.
    pub async fn create_task(&self, draft: TaskDraft) -> Task {
        let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let now = chrono::Utc::now();
        let task = Task {
            id,
            code: draft.code,
            title: draft.title,
            subject_area: draft.subject_area,
            education_level: draft.education_level,
            deadline: draft.deadline,
            proposed_budget: draft.proposed_budget,
            admin_counter_budget: None,
            budget: None,
            status: TaskStatus::Pending,
            negotiation_status: NegotiationStatus::None,
            client: draft.client,
            assigned_admin: None,
            created_at: now,
            updated_at: now,
        };

        self.tasks.write().await.insert(id, task.clone());

        self.hooks.task_saved(None, &task).await;
        task
    }

    /// Apply a mutation to an existing task and fire the save hooks with the
    /// pre-mutation state.
    pub async fn update_task<F>(&self, id: DbId, apply: F) -> Result<Task, CoreError>
    where
        F: FnOnce(&mut Task) + Send,
    {
        let (previous, current) = {
            let mut tasks = self.tasks.write().await;
            let task = tasks.get_mut(&id).ok_or_else(|| CoreError::not_found("task", id))?;
            let previous = task.clone();
            apply(task);
            task.updated_at = chrono::Utc::now();
            (previous, task.clone())
        };

        self.hooks.task_saved(Some(&previous), &current).await;
        Ok(current)
    }

    /// Fetch a task by id.
    pub async fn get_task(&self, id: DbId) -> Result<Task, CoreError> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("task", id))
    }

    /// All tasks, most recently created first.
    pub async fn list_tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by_key(|t| std::cmp::Reverse(t.id));
        tasks
    }

    /// Append a chat message to a task and fire the message save hooks.
    pub async fn create_message(
        &self,
        task_id: DbId,
        body: String,
        sender: Option<UserIdentity>,
    ) -> Result<ChatMessage, CoreError> {
        // The owning task must exist.
        self.get_task(task_id).await?;

        let id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        let message = ChatMessage {
            id,
            task_id,
            body,
            sender,
            created_at: chrono::Utc::now(),
        };

        self.messages.write().await.insert(id, message.clone());

        self.hooks.message_saved(None, &message).await;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use taskforge_events::{MessageSaveHook, TaskSaveHook};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl TaskSaveHook for Recorder {
        async fn task_saved(&self, previous: Option<&Task>, current: &Task) {
            self.events.lock().unwrap().push(format!(
                "task:{}:{}",
                current.id,
                if previous.is_none() { "created" } else { "updated" }
            ));
        }
    }

    #[async_trait::async_trait]
    impl MessageSaveHook for Recorder {
        async fn message_saved(&self, previous: Option<&ChatMessage>, current: &ChatMessage) {
            self.events.lock().unwrap().push(format!(
                "message:{}:{}",
                current.id,
                if previous.is_none() { "created" } else { "updated" }
            ));
        }
    }

    fn client() -> UserIdentity {
        UserIdentity {
            id: 9,
            handle: "client9".to_string(),
            full_name: None,
            email: "client9@example.com".to_string(),
        }
    }

    fn draft() -> TaskDraft {
        TaskDraft {
            code: None,
            title: "Essay Help".to_string(),
            subject_area: None,
            education_level: None,
            deadline: None,
            proposed_budget: Decimal::new(5000, 2),
            client: client(),
        }
    }

    fn store_with_recorder() -> (TaskStore, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let hooks = SaveHooks::new()
            .on_task(recorder.clone())
            .on_message(recorder.clone());
        (TaskStore::new(hooks), recorder)
    }

    #[tokio::test]
    async fn create_assigns_ids_and_fires_created_hook() {
        let (store, recorder) = store_with_recorder();

        let a = store.create_task(draft()).await;
        let b = store.create_task(draft()).await;

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["task:1:created", "task:2:created"]
        );
    }

    #[tokio::test]
    async fn update_passes_previous_state() {
        let (store, recorder) = store_with_recorder();
        let task = store.create_task(draft()).await;

        let updated = store
            .update_task(task.id, |t| t.status = TaskStatus::InProgress)
            .await
            .unwrap();

        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["task:1:created", "task:1:updated"]
        );
    }

    #[tokio::test]
    async fn update_missing_task_is_not_found() {
        let (store, recorder) = store_with_recorder();
        let err = store.update_task(99, |_| {}).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_requires_existing_task() {
        let (store, recorder) = store_with_recorder();
        assert!(store
            .create_message(42, "hi".to_string(), None)
            .await
            .is_err());

        let task = store.create_task(draft()).await;
        let msg = store
            .create_message(task.id, "hi".to_string(), Some(client()))
            .await
            .unwrap();
        assert_eq!(msg.task_id, task.id);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["task:1:created", "message:1:created"]
        );
    }
}
