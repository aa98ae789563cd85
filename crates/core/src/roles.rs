//! Role name constants shared across crates.

/// Staff role with full access to every task.
pub const ROLE_ADMIN: &str = "admin";

/// Regular customer role; sees only their own tasks.
pub const ROLE_CLIENT: &str = "client";
