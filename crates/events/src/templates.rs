//! Transactional email templates.
//!
//! Three named templates, each rendering HTML from a typed context. The
//! plain-text alternative is derived by the notifier via
//! [`taskforge_core::html::strip_tags`], so templates keep their text
//! content readable without markup.

/// Context for the `new_task_notification` template.
#[derive(Debug)]
pub struct NewTaskContext<'a> {
    pub task_title: &'a str,
    pub task_subject: &'a str,
    pub education_level: &'a str,
    pub deadline: &'a str,
    pub proposed_budget: &'a str,
    pub student_name: &'a str,
    pub student_email: &'a str,
    pub task_code: &'a str,
    pub task_url: &'a str,
}

/// Render the admin-facing new-task notification.
pub fn render_new_task_notification(ctx: &NewTaskContext<'_>) -> String {
    format!(
        "<html><body>\
         <h2>New Task Submitted</h2>\
         <p>A new task is waiting for review.</p>\
         <table>\
         <tr><td>Task</td><td>{title} ({code})</td></tr>\
         <tr><td>Subject</td><td>{subject}</td></tr>\
         <tr><td>Education level</td><td>{level}</td></tr>\
         <tr><td>Deadline</td><td>{deadline}</td></tr>\
         <tr><td>Proposed budget</td><td>{budget}</td></tr>\
         <tr><td>Client</td><td>{student} &lt;{email}&gt;</td></tr>\
         </table>\
         <p><a href=\"{url}\">Open the admin dashboard</a></p>\
         </body></html>",
        title = ctx.task_title,
        code = ctx.task_code,
        subject = ctx.task_subject,
        level = ctx.education_level,
        deadline = ctx.deadline,
        budget = ctx.proposed_budget,
        student = ctx.student_name,
        email = ctx.student_email,
        url = ctx.task_url,
    )
}

/// Context for the `task_status_update` template.
#[derive(Debug)]
pub struct StatusUpdateContext<'a> {
    pub student_name: &'a str,
    pub task_title: &'a str,
    pub task_status: &'a str,
    pub update_message: &'a str,
    pub admin_name: Option<&'a str>,
    pub task_url: &'a str,
}

/// Render the client-facing status-update notification.
pub fn render_task_status_update(ctx: &StatusUpdateContext<'_>) -> String {
    let admin_line = match ctx.admin_name {
        Some(name) => format!("<p>Handled by: {name}</p>"),
        None => String::new(),
    };
    format!(
        "<html><body>\
         <h2>Task Update</h2>\
         <p>Hi {student},</p>\
         <p>Your task <b>{title}</b> is now <b>{status}</b>.</p>\
         <p>{message}</p>\
         {admin_line}\
         <p><a href=\"{url}\">View your task</a></p>\
         </body></html>",
        student = ctx.student_name,
        title = ctx.task_title,
        status = ctx.task_status,
        message = ctx.update_message,
        url = ctx.task_url,
    )
}

/// Context for the `new_message_notification` template.
#[derive(Debug)]
pub struct NewMessageContext<'a> {
    pub task_title: &'a str,
    pub sender_name: &'a str,
    pub message_preview: &'a str,
    pub task_url: &'a str,
}

/// Render the new-chat-message notification.
pub fn render_new_message_notification(ctx: &NewMessageContext<'_>) -> String {
    format!(
        "<html><body>\
         <h2>New Message</h2>\
         <p><b>{sender}</b> wrote on <b>{title}</b>:</p>\
         <blockquote>{preview}</blockquote>\
         <p><a href=\"{url}\">Reply on your dashboard</a></p>\
         </body></html>",
        sender = ctx.sender_name,
        title = ctx.task_title,
        preview = ctx.message_preview,
        url = ctx.task_url,
    )
}
