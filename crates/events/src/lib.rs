//! Taskforge notification and broadcast infrastructure.
//!
//! Building blocks for reacting to record saves:
//!
//! - [`GroupBus`] -- in-process group-addressed publish/subscribe hub backed
//!   by `tokio::sync::broadcast`.
//! - [`EmailConfig`] -- one eagerly-validated configuration struct for all
//!   mail settings, built once at startup.
//! - [`delivery`] -- the [`MailTransport`] seam with SMTP and console
//!   implementations.
//! - [`MailQueue`] -- bounded fire-and-forget delivery queue with a fixed
//!   worker pool and an explicit overflow policy.
//! - [`Notifier`] -- composes and dispatches the three transactional emails.
//! - [`watcher`] -- explicit post-commit save hooks and the [`ChangeWatcher`]
//!   that broadcasts snapshots and triggers notifications.

pub mod bus;
pub mod config;
pub mod delivery;
pub mod notifier;
pub mod queue;
pub mod templates;
pub mod watcher;

pub use bus::{BroadcastBus, BusMessage, GroupBus, GroupMessage};
pub use config::{ConfigError, EmailConfig, MailBackend};
pub use delivery::{MailError, MailTransport, OutgoingEmail};
pub use notifier::{DeliveryOutcome, DeliveryStrategy, Notifier, SkipReason};
pub use queue::{MailQueue, OverflowPolicy, QueueFull};
pub use watcher::{ChangeWatcher, MessageSaveHook, SaveHooks, TaskSaveHook};
