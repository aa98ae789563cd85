//! User identity value and display-name derivation.
//!
//! Display names follow one explicit fallback order instead of scattered
//! attribute probing: non-empty full name, then the account handle, and --
//! only when the user reference itself is missing -- the literal `"User"`.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Structured identity of a platform user, as seen by this fragment.
///
/// The authentication/profile system is an external collaborator; this is
/// the minimal projection the notification and broadcast paths need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Internal database id.
    pub id: DbId,
    /// Account handle (login name). Never empty.
    pub handle: String,
    /// Optional human full name from the profile.
    pub full_name: Option<String>,
    /// Email address used for notification delivery.
    pub email: String,
}

impl UserIdentity {
    /// Human-facing display name: the full name when present and non-empty,
    /// otherwise the account handle.
    pub fn display_name(&self) -> &str {
        match &self.full_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.handle,
        }
    }
}

/// Fallback label for a missing user reference.
const ANONYMOUS_LABEL: &str = "User";

/// Display name for a possibly-missing sender reference.
///
/// Falls back to the literal `"User"` when the reference is absent (e.g. a
/// chat message whose author account was deleted).
pub fn sender_display_name(user: Option<&UserIdentity>) -> &str {
    user.map(UserIdentity::display_name).unwrap_or(ANONYMOUS_LABEL)
}
