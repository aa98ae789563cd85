//! Bridge between the in-process broadcast bus and WebSocket connections.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;

use taskforge_events::GroupBus;

use crate::ws::manager::WsManager;

/// Spawn a background task that forwards every bus message to the
/// WebSocket connections subscribed to its group.
///
/// Each [`GroupMessage`](taskforge_events::GroupMessage) becomes a JSON
/// text frame in the wire format `{"type": <kind>, ...payload}`. The task
/// exits when the bus is dropped.
pub fn start_bus_forwarder(
    bus: Arc<GroupBus>,
    ws_manager: Arc<WsManager>,
) -> tokio::task::JoinHandle<()> {
    let mut receiver = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(group_message) => {
                    let wire = group_message.message.to_wire().to_string();
                    let delivered = ws_manager
                        .send_to_group(&group_message.group, Message::Text(wire.into()))
                        .await;
                    tracing::debug!(
                        group = %group_message.group,
                        kind = %group_message.message.kind,
                        delivered,
                        "Forwarded bus message"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Bus forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Broadcast bus closed, forwarder shutting down");
                    break;
                }
            }
        }
    })
}
