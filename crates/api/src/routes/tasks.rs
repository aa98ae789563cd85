//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /              list_tasks
/// POST   /              create_task
/// GET    /{id}          get_task
/// PATCH  /{id}          update_task (admin only)
/// POST   /{id}/messages create_message
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/{id}", get(tasks::get_task).patch(tasks::update_task))
        .route("/{id}/messages", post(tasks::create_message))
}
