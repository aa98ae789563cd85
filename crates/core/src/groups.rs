//! Well-known broadcast group name constants.
//!
//! These must match the group names WebSocket connections are subscribed to
//! at admission time and the groups the change watcher publishes to.

use crate::types::DbId;

/// Shared group every admin dashboard connection joins.
pub const GROUP_ADMIN_DASHBOARD: &str = "admin_dashboard";

/// Per-client group name, one per owning client.
pub fn client_group(client_id: DbId) -> String {
    format!("client_{client_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_group_embeds_id() {
        assert_eq!(client_group(42), "client_42");
    }
}
