use crate::domain::ticket::{
    Ticket, TicketFields, TicketId, TicketPriority, TicketStatus, UserId,
};

/// A single local edit to an open draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Name(String),
    Description(String),
    Status(TicketStatus),
    Priority(TicketPriority),
    AssignedTo(Option<UserId>),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftValues {
    pub fields: TicketFields,
    /// Free-text note. Only ever persisted as a history log entry.
    pub message: String,
}

/// Local edit buffer for one ticket, compared against the last state the
/// backend confirmed.
///
/// `original` is written only when the draft is built from server data;
/// `apply` touches `values` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    ticket_id: TicketId,
    original: TicketFields,
    values: DraftValues,
}

impl TicketDraft {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        let original = TicketFields::from_ticket(ticket);
        Self {
            ticket_id: ticket.id.clone(),
            values: DraftValues {
                fields: original.clone(),
                message: String::new(),
            },
            original,
        }
    }

    pub fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    pub fn original(&self) -> &TicketFields {
        &self.original
    }

    pub fn values(&self) -> &DraftValues {
        &self.values
    }

    pub fn apply(&mut self, value: FieldValue) {
        let fields = &mut self.values.fields;
        match value {
            FieldValue::Name(name) => fields.name = name,
            FieldValue::Description(description) => fields.description = description,
            FieldValue::Status(status) => fields.status = status,
            FieldValue::Priority(priority) => fields.priority = priority,
            FieldValue::AssignedTo(assignee) => fields.assigned_to = UserId::normalize(assignee),
            FieldValue::Message(message) => self.values.message = message,
        }
    }

    pub fn clear_message(&mut self) {
        self.values.message.clear();
    }

    pub fn fields_changed(&self) -> bool {
        self.original != self.values.fields
    }

    pub fn has_message(&self) -> bool {
        !self.values.message.trim().is_empty()
    }
}
