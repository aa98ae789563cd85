//! Taskforge domain layer.
//!
//! Entity types and pure domain rules shared by the event/notification
//! infrastructure and the API edge. This crate has no internal dependencies
//! and no I/O: formatting, display-name derivation, HTML stripping, and
//! broadcast group naming all live here so they can be tested in isolation.

pub mod error;
pub mod format;
pub mod groups;
pub mod html;
pub mod identity;
pub mod roles;
pub mod task;
pub mod types;

pub use error::CoreError;
pub use identity::UserIdentity;
pub use task::{ChatMessage, NegotiationStatus, Task, TaskStatus};
