use crate::domain::ticket::{Ticket, TicketPriority, TicketStatus, UserId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TechnicianFilter {
    #[default]
    Any,
    Unassigned,
    Technician(UserId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub technician: TechnicianFilter,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

impl TicketFilter {
    pub fn is_active(&self) -> bool {
        self.technician != TechnicianFilter::Any || self.status.is_some() || self.priority.is_some()
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        let technician = match &self.technician {
            TechnicianFilter::Any => true,
            TechnicianFilter::Unassigned => ticket.assigned_to.is_none(),
            TechnicianFilter::Technician(id) => ticket.assigned_to.as_ref() == Some(id),
        };
        technician
            && self.status.is_none_or(|status| status == ticket.status)
            && self.priority.is_none_or(|priority| priority == ticket.priority)
    }

    pub fn apply(&self, tickets: Vec<Ticket>) -> Vec<Ticket> {
        tickets
            .into_iter()
            .filter(|ticket| self.matches(ticket))
            .collect()
    }
}
