use async_trait::async_trait;

use crate::domain::history::HistoryEntry;
use crate::domain::ticket::{Ticket, TicketId};
use crate::domain::update::{SaveRequest, TicketUpdate};
use crate::domain::user::Technician;
use crate::error::AppResult;

/// The ticket REST backend. Every non-success answer, including a
/// `success: false` payload, comes back as an error.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>>;
    async fn save_update(&self, request: SaveRequest) -> AppResult<()>;
    async fn update_ticket(&self, update: TicketUpdate) -> AppResult<()>;
    async fn list_photos(&self, ticket_id: &TicketId) -> AppResult<Vec<String>>;
    async fn list_technicians(&self) -> AppResult<Vec<Technician>>;
    async fn ticket_history(&self, query: Option<&str>) -> AppResult<Vec<HistoryEntry>>;
}
