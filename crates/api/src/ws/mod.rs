//! WebSocket infrastructure for real-time task updates.
//!
//! Connections authenticate with a JWT passed in the query string, join
//! broadcast groups based on their role, and receive the messages the
//! change watcher publishes to those groups.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

use axum::routing::any;
use axum::Router;

use crate::state::AppState;

pub use forwarder::start_bus_forwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;

/// Routes mounted under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", any(ws_handler))
}
