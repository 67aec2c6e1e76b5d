use serde::Deserialize;
use serde_json::Value;

use crate::domain::ticket::{TicketPriority, TicketStatus, UserId};
use crate::domain::user::TechnicianDirectory;

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub ticket_name: Option<String>,
    #[serde(default)]
    pub ticket_created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub assignee: Option<UserId>,
    #[serde(default)]
    pub update: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub changes: Vec<FieldChange>,
    #[serde(default)]
    pub photos: Vec<HistoryPhoto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub to: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryPhoto {
    pub url: String,
}

impl HistoryEntry {
    /// The note followed by one line per recognised field change.
    pub fn update_text(&self, directory: &TechnicianDirectory) -> String {
        let mut lines = Vec::new();
        let note = self.update.as_deref().unwrap_or_default().trim();
        if !note.is_empty() {
            lines.push(note.to_string());
        }

        for change in &self.changes {
            let line = match change.field.as_deref() {
                Some("status") => format!("Status changed to: {}", status_label(&change.to)),
                Some("priority") => {
                    format!("Priority changed to: {}", priority_label(&change.to))
                }
                Some("assignee") => {
                    let assignee = user_id(&change.to);
                    format!("Assignee changed to: {}", directory.name_of(assignee.as_ref()))
                }
                _ => continue,
            };
            lines.push(line);
        }

        lines.join("\n")
    }
}

fn code(value: &Value) -> Option<u8> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u8::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn status_label(value: &Value) -> &'static str {
    code(value)
        .map(|code| TicketStatus::from(code).as_str())
        .unwrap_or("Unknown")
}

fn priority_label(value: &Value) -> &'static str {
    code(value)
        .map(|code| TicketPriority::from(code).as_str())
        .unwrap_or("Unknown")
}

fn user_id(value: &Value) -> Option<UserId> {
    match value {
        Value::String(text) => Some(UserId(text.clone())),
        Value::Number(number) => Some(UserId(number.to_string())),
        _ => None,
    }
}
