use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use taskforge_core::error::CoreError;
use taskforge_core::groups::{client_group, GROUP_ADMIN_DASHBOARD};
use taskforge_core::roles::ROLE_ADMIN;
use taskforge_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Query parameters for the WebSocket admission request.
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    /// JWT access token. Browsers cannot set an Authorization header on a
    /// WebSocket handshake, so it travels in the query string.
    pub token: Option<String>,
}

/// HTTP handler that authenticates and upgrades the connection to WebSocket.
///
/// The token is validated before the upgrade: a missing or invalid token is
/// rejected with 401 and the socket never opens. Admitted connections join
/// groups by role: `admin` joins `admin_dashboard`, everyone else joins
/// their own `client_<id>` group.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let token = query.token.as_deref().ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;

    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    let mut groups = HashSet::new();
    if claims.role == ROLE_ADMIN {
        groups.insert(GROUP_ADMIN_DASHBOARD.to_string());
    } else {
        groups.insert(client_group(claims.sub));
    }

    let user_id = claims.sub;
    let role = claims.role;
    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, state.ws_manager, user_id, role, groups)
    }))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection and its groups with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound messages on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(
    socket: WebSocket,
    ws_manager: Arc<WsManager>,
    user_id: DbId,
    role: String,
    groups: HashSet<String>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, role = %role, ?groups, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = ws_manager.add(conn_id.clone(), user_id, role, groups).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: the stream side is push-only, so inbound traffic is
    // limited to keepalive frames and close.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
