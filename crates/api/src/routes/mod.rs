//! Route tree definitions.

pub mod health;
pub mod tasks;

use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                         WebSocket (token in query string)
///
/// GET    /tasks               list (admin: all, client: own)
/// POST   /tasks               create (auth required)
/// GET    /tasks/{id}          get (owner or admin)
/// PATCH  /tasks/{id}          update (admin only)
/// POST   /tasks/{id}/messages append chat message (owner or admin)
/// ```
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/tasks", tasks::router())
        .merge(ws::router())
}
