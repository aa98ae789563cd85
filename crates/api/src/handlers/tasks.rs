//! Handlers for the `/tasks` resource.
//!
//! The write handlers are the entry points of the save pipeline: every
//! successful create/update runs the registered save hooks, which broadcast
//! snapshots and (on creation) email the admin allow-list. Email failures
//! in these handlers are logged and never turn a committed write into an
//! HTTP error.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use taskforge_core::error::CoreError;
use taskforge_core::roles::ROLE_ADMIN;
use taskforge_core::types::{DbId, Timestamp};
use taskforge_core::{NegotiationStatus, Task, TaskStatus};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;
use crate::store::TaskDraft;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body for `POST /tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Optional pre-assigned public code; usually absent.
    pub code: Option<String>,
    pub title: String,
    pub subject_area: Option<String>,
    pub education_level: Option<String>,
    pub deadline: Option<Timestamp>,
    pub proposed_budget: Decimal,
}

/// Body for `PATCH /tasks/{id}`. All fields optional; absent fields are
/// left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub status: Option<TaskStatus>,
    pub negotiation_status: Option<NegotiationStatus>,
    pub admin_counter_budget: Option<Decimal>,
    pub budget: Option<Decimal>,
    /// Assign an admin to the task by user id.
    pub assigned_admin_id: Option<DbId>,
    /// When present, the client is emailed a status update carrying this
    /// text. Sending the email is an explicit admin action, not a side
    /// effect of every save.
    pub update_message: Option<String>,
}

/// Body for `POST /tasks/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub body: String,
}

// ---------------------------------------------------------------------------
// Task CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/tasks
///
/// Admins see every task; clients see only their own.
pub async fn list_tasks(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let mut tasks = state.store.list_tasks().await;
    if auth.role != ROLE_ADMIN {
        tasks.retain(|t| t.client.id == auth.user_id);
    }
    Ok(Json(serde_json::json!({ "data": tasks })))
}

/// POST /api/v1/tasks
///
/// Create a task owned by the authenticated user. The save hooks run
/// before the response is produced, so by the time the client sees 201 the
/// broadcasts have been published.
pub async fn create_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> AppResult<impl IntoResponse> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let client = state.store.get_user(auth.user_id).await?;
    let task = state
        .store
        .create_task(TaskDraft {
            code: req.code,
            title: req.title,
            subject_area: req.subject_area,
            education_level: req.education_level,
            deadline: req.deadline,
            proposed_budget: req.proposed_budget,
            client,
        })
        .await;

    tracing::info!(task_id = task.id, client_id = auth.user_id, "Task created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": task })),
    ))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let task = state.store.get_task(task_id).await?;
    authorize_task_access(&auth, &task)?;
    Ok(Json(serde_json::json!({ "data": task })))
}

/// PATCH /api/v1/tasks/{id}
///
/// Admin-only mutation of status, negotiation state, budgets, and admin
/// assignment. When `update_message` is present the client is additionally
/// emailed a status update; a failing email is logged, the mutation stands.
pub async fn update_task(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(req): Json<UpdateTaskRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let assigned_admin = match req.assigned_admin_id {
        Some(admin_id) => Some(state.store.get_user(admin_id).await?),
        None => None,
    };

    let task = state
        .store
        .update_task(task_id, move |task| {
            if let Some(status) = req.status {
                task.status = status;
            }
            if let Some(negotiation) = req.negotiation_status {
                task.negotiation_status = negotiation;
            }
            if let Some(counter) = req.admin_counter_budget {
                task.admin_counter_budget = Some(counter);
            }
            if let Some(budget) = req.budget {
                task.budget = Some(budget);
            }
            if let Some(admin) = assigned_admin {
                task.assigned_admin = Some(admin);
            }
        })
        .await?;

    if let Some(update_message) = req.update_message.as_deref() {
        if let Err(err) = state
            .notifier
            .notify_status_changed(&task, &task.client, update_message)
            .await
        {
            tracing::error!(
                task_id = task.id,
                error = %err,
                "Status update email failed; task update already committed"
            );
        }
    }

    tracing::info!(task_id = task.id, admin_id = auth.user_id, "Task updated");
    Ok(Json(serde_json::json!({ "data": task })))
}

// ---------------------------------------------------------------------------
// Chat messages
// ---------------------------------------------------------------------------

/// POST /api/v1/tasks/{id}/messages
///
/// Append a chat message. The counterparty (client for an admin sender,
/// assigned admin for a client sender) is emailed a preview; like the
/// status email, a delivery failure never fails the request.
pub async fn create_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(req): Json<CreateMessageRequest>,
) -> AppResult<impl IntoResponse> {
    if req.body.trim().is_empty() {
        return Err(AppError::BadRequest("body must not be empty".into()));
    }

    let task = state.store.get_task(task_id).await?;
    authorize_task_access(&auth, &task)?;

    let sender = state.store.get_user(auth.user_id).await.ok();
    let message = state
        .store
        .create_message(task_id, req.body, sender)
        .await?;

    let recipient = if auth.role == ROLE_ADMIN {
        Some(task.client.clone())
    } else {
        task.assigned_admin.clone()
    };
    if let Some(recipient) = recipient {
        if let Err(err) = state
            .notifier
            .notify_new_message(&task, &message, &recipient)
            .await
        {
            tracing::error!(
                task_id = task.id,
                message_id = message.id,
                error = %err,
                "Chat notification email failed; message already committed"
            );
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": message })),
    ))
}

/// Admins may touch any task; clients only their own.
fn authorize_task_access(auth: &AuthUser, task: &Task) -> Result<(), AppError> {
    if auth.role != ROLE_ADMIN && task.client.id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not your task".into(),
        )));
    }
    Ok(())
}
