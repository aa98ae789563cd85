//! Display formatting rules for notification content.
//!
//! These are the exact formats the email templates embed; tests pin them so
//! a change here is a deliberate, visible decision.

use rust_decimal::Decimal;

use crate::types::Timestamp;

/// Sentinel for an absent deadline.
const DEADLINE_NOT_SET: &str = "Not set";

/// Sentinel for an absent subject area / education level.
const NOT_SPECIFIED: &str = "Not specified";

/// Maximum chat-message preview length in characters.
pub const MESSAGE_PREVIEW_CHARS: usize = 100;

/// Format a deadline as `Month DD, YYYY at HH:MM AM/PM`, or `"Not set"`.
pub fn format_deadline(deadline: Option<&Timestamp>) -> String {
    match deadline {
        Some(ts) => ts.format("%B %d, %Y at %I:%M %p").to_string(),
        None => DEADLINE_NOT_SET.to_string(),
    }
}

/// Format a money amount for email display, e.g. `$120.50`.
pub fn format_budget(amount: &Decimal) -> String {
    format!("${amount}")
}

/// An optional free-text field, or the `"Not specified"` sentinel.
pub fn or_not_specified(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_SPECIFIED,
    }
}

/// Truncate a chat message body to [`MESSAGE_PREVIEW_CHARS`] characters,
/// appending `...` only when the body was actually longer.
///
/// Counts characters, not bytes, so multi-byte text never splits mid-char.
pub fn message_preview(body: &str) -> String {
    let mut chars = body.char_indices();
    match chars.nth(MESSAGE_PREVIEW_CHARS) {
        // There is at least one character past the limit.
        Some((byte_idx, _)) => format!("{}...", &body[..byte_idx]),
        None => body.to_string(),
    }
}
