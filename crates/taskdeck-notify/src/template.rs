//! Event-to-message rendering.
//!
//! One pure function per event kind, dispatched on the enum tag. No I/O, no
//! clock access: timestamps arrive inside the event payload, so rendering
//! the same event twice yields byte-identical output.
//!
//! Every template carries the product name, addresses the recipient by
//! display name, and closes with a call-to-action pointing back at the
//! dashboard. Long free-text bodies are cut to a preview so a single chatty
//! message cannot balloon the outbound payload.

use taskdeck_common::types::NotificationEvent;

const PRODUCT: &str = "TaskDeck";

/// Maximum characters of free-text (message/notice bodies) kept in the
/// rendered output.
const PREVIEW_CHARS: usize = 120;

/// Prefix that makes urgency visible in the message text itself, without
/// relying on out-of-band metadata.
const IMPORTANT_MARKER: &str = "[IMPORTANT]";

const CALL_TO_ACTION: &str = "Open TaskDeck for the full details.";

/// Renders `event` into the outbound message body for one recipient.
pub fn render(event: &NotificationEvent, recipient_name: &str) -> String {
    match event {
        NotificationEvent::TaskAssigned {
            title,
            description,
            due_date,
            assignee_name,
            assigner_name,
        } => format!(
            "{PRODUCT}: Hi {recipient_name}, {assigner_name} assigned \
             \"{title}\" to {assignee_name}, due {due}.\n{desc}\n{CALL_TO_ACTION}",
            due = due_date.format("%d %b %Y"),
            desc = preview(description),
        ),
        NotificationEvent::TaskReminder { title, due_date } => format!(
            "{PRODUCT}: Hi {recipient_name}, reminder that \"{title}\" is due \
             {due}.\n{CALL_TO_ACTION}",
            due = due_date.format("%d %b %Y"),
        ),
        NotificationEvent::TaskStatusChanged {
            title,
            old_status,
            new_status,
            changed_by,
        } => format!(
            "{PRODUCT}: Hi {recipient_name}, {changed_by} moved \"{title}\" \
             from {old_status} to {new_status}.\n{CALL_TO_ACTION}"
        ),
        NotificationEvent::TaskCompleted {
            title,
            completed_by,
        } => format!(
            "{PRODUCT}: Hi {recipient_name}, \"{title}\" was completed by \
             {completed_by}.\n{CALL_TO_ACTION}"
        ),
        NotificationEvent::TaskRevoked { title, revoked_by } => format!(
            "{PRODUCT}: Hi {recipient_name}, your assignment \"{title}\" was \
             revoked by {revoked_by}.\n{CALL_TO_ACTION}"
        ),
        NotificationEvent::NewMessage { sender_name, body } => format!(
            "{PRODUCT}: Hi {recipient_name}, new message from {sender_name}: \
             {preview}\n{CALL_TO_ACTION}",
            preview = preview(body),
        ),
        NotificationEvent::NewNotice {
            title,
            body,
            important,
        } => {
            let marker = if *important {
                format!("{IMPORTANT_MARKER} ")
            } else {
                String::new()
            };
            format!(
                "{marker}{PRODUCT}: Hi {recipient_name}, new notice \
                 \"{title}\": {preview}\n{CALL_TO_ACTION}",
                preview = preview(body),
            )
        }
        NotificationEvent::AdminBroadcast { body, sent_at } => format!(
            "{IMPORTANT_MARKER} {PRODUCT}: Hi {recipient_name}, broadcast at \
             {at}: {preview}\n{CALL_TO_ACTION}",
            at = sent_at.format("%d %b %Y %H:%M UTC"),
            preview = preview(body),
        ),
    }
}

/// Cuts `text` to [`PREVIEW_CHARS`] characters with an ellipsis marker,
/// snapping to a char boundary so multi-byte characters never get split.
fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}...")
}
