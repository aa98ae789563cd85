//! Request handlers, grouped by resource.

pub mod tasks;
