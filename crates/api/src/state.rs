use std::sync::Arc;

use taskforge_events::Notifier;

use crate::config::ServerConfig;
use crate::store::TaskStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (JWT secret, timeouts, CORS).
    pub config: Arc<ServerConfig>,
    /// In-memory task/message store; owns the post-commit save hooks.
    pub store: Arc<TaskStore>,
    /// WebSocket connection manager with group subscriptions.
    pub ws_manager: Arc<WsManager>,
    /// Email notifier for explicit dispatch (status-update mails).
    pub notifier: Arc<Notifier>,
}
