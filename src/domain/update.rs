use serde::Serialize;

use crate::domain::attachment::AttachmentFile;
use crate::domain::draft::TicketDraft;
use crate::domain::ticket::{Assignment, TicketId, TicketPriority, TicketStatus};

/// Fields saved immediately on selection. Each one is independently
/// present or absent; `assigned_to: Some(Assignment::Unassigned)` clears the
/// assignee while `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickPatch {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<Assignment>,
}

impl QuickPatch {
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn priority(priority: TicketPriority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn assignee(assignment: Assignment) -> Self {
        Self {
            assigned_to: Some(assignment),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.assigned_to.is_none()
    }
}

/// Body of `POST /api/tickets/save_update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub ticket_id: TicketId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<Assignment>,
    pub message: String,
    pub files: Vec<AttachmentFile>,
}

impl SaveRequest {
    pub fn quick(
        ticket_id: TicketId,
        patch: QuickPatch,
        note: String,
        files: Vec<AttachmentFile>,
    ) -> Self {
        Self {
            ticket_id,
            name: None,
            description: None,
            status: patch.status,
            priority: patch.priority,
            assigned_to: patch.assigned_to,
            message: note,
            files,
        }
    }

    pub fn full(draft: &TicketDraft, files: Vec<AttachmentFile>) -> Self {
        let values = draft.values();
        Self {
            ticket_id: draft.ticket_id().clone(),
            name: Some(values.fields.name.clone()),
            description: Some(values.fields.description.clone()),
            status: Some(values.fields.status),
            priority: Some(values.fields.priority),
            assigned_to: Some(Assignment::from(values.fields.assigned_to.clone())),
            message: values.message.clone(),
            files,
        }
    }

    /// Text parts of the multipart form, in send order. `message` is always
    /// present, even when empty.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("ticket_id", self.ticket_id.to_string())];
        if let Some(name) = &self.name {
            fields.push(("name", name.clone()));
        }
        if let Some(description) = &self.description {
            fields.push(("description", description.clone()));
        }
        if let Some(status) = self.status {
            fields.push(("status", u8::from(status).to_string()));
        }
        if let Some(priority) = self.priority {
            fields.push(("priority", u8::from(priority).to_string()));
        }
        if let Some(assignment) = &self.assigned_to {
            fields.push(("assigned_to", assignment.wire_value().to_string()));
        }
        fields.push(("message", self.message.clone()));
        fields
    }
}

/// Body of `PUT /api/tickets/update`: the id plus only the fields that change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketUpdate {
    pub id: TicketId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Assignment>,
}

impl TicketUpdate {
    pub fn new(id: TicketId) -> Self {
        Self {
            id,
            name: None,
            description: None,
            status: None,
            priority: None,
            assigned_to: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
    }
}
