use tracing::{error, info};

use crate::context::AppContext;
use crate::domain::filter::TicketFilter;
use crate::domain::history::HistoryEntry;
use crate::domain::ticket::{Ticket, TicketId};
use crate::domain::update::TicketUpdate;
use crate::domain::user::TechnicianDirectory;
use crate::error::{AppError, AppResult};

pub struct TicketDetail {
    pub ticket: Ticket,
    pub photos: Vec<String>,
}

pub async fn list_tickets(ctx: &AppContext, filter: &TicketFilter) -> AppResult<Vec<Ticket>> {
    let tickets = ctx.backend.list_tickets().await?;
    Ok(filter.apply(tickets))
}

pub async fn find_ticket(ctx: &AppContext, id: &TicketId) -> AppResult<Ticket> {
    ctx.backend
        .list_tickets()
        .await?
        .into_iter()
        .find(|ticket| &ticket.id == id)
        .ok_or_else(|| AppError::TicketNotFound(id.to_string()))
}

pub async fn ticket_detail(ctx: &AppContext, id: &TicketId) -> AppResult<TicketDetail> {
    let ticket = find_ticket(ctx, id).await?;
    let session = ctx.synchronizer();
    session.open(&ticket);
    let photos = session.refresh_attachments().await.unwrap_or_default();
    session.close();
    Ok(TicketDetail { ticket, photos })
}

/// A missing technician list only degrades names to "Unknown", so failures
/// are logged rather than returned.
pub async fn technician_directory(ctx: &AppContext) -> TechnicianDirectory {
    match ctx.backend.list_technicians().await {
        Ok(technicians) => TechnicianDirectory::new(technicians),
        Err(err) => {
            error!(error = %err, "failed to fetch technicians");
            TechnicianDirectory::default()
        }
    }
}

/// Manager-view quick update: sends only the changed fields and returns the
/// reloaded ticket.
pub async fn direct_update(ctx: &AppContext, update: TicketUpdate) -> AppResult<Ticket> {
    if update.is_empty() {
        return Err(AppError::Draft("no fields to update".to_string()));
    }
    let id = update.id.clone();
    ctx.backend.update_ticket(update).await?;
    info!(ticket = %id, "ticket updated");
    find_ticket(ctx, &id).await
}

pub async fn history(ctx: &AppContext, query: Option<&str>) -> AppResult<Vec<HistoryEntry>> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    ctx.backend.ticket_history(query).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{AppConfig, StoredConfig};
    use crate::domain::filter::TechnicianFilter;
    use crate::domain::ticket::{Assignment, TicketPriority, TicketStatus, UserId};
    use crate::testing::{FakeBackend, RecordingPreviews, technician, ticket};

    fn context(backend: Arc<FakeBackend>) -> AppContext {
        let config = AppConfig::resolve(&StoredConfig::default(), |_| None).expect("config");
        AppContext::new(config, backend, Arc::new(RecordingPreviews::default()))
    }

    fn backend() -> Arc<FakeBackend> {
        let mut assigned = ticket("T2", TicketStatus::InProgress);
        assigned.assigned_to = Some(UserId("u-1".to_string()));
        Arc::new(FakeBackend::with_tickets(vec![
            ticket("T1", TicketStatus::Open),
            assigned,
        ]))
    }

    #[tokio::test]
    async fn lists_with_filter() {
        let ctx = context(backend());
        let filter = TicketFilter {
            technician: TechnicianFilter::Unassigned,
            ..TicketFilter::default()
        };
        let tickets = list_tickets(&ctx, &filter).await.expect("tickets");
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, TicketId::Text("T1".to_string()));
    }

    #[tokio::test]
    async fn missing_ticket_is_an_error() {
        let ctx = context(backend());
        let result = find_ticket(&ctx, &TicketId::Text("T9".to_string())).await;
        assert!(matches!(result, Err(AppError::TicketNotFound(_))));
    }

    #[tokio::test]
    async fn text_wire_id_found_from_cli_input() {
        let wire: Ticket = serde_json::from_str(
            r#"{"id": "42", "name": "Door sensor", "status": 1, "priority": 3}"#,
        )
        .expect("ticket json");
        let ctx = context(Arc::new(FakeBackend::with_tickets(vec![wire])));

        let found = find_ticket(&ctx, &TicketId::parse("42"))
            .await
            .expect("ticket");
        assert_eq!(found.name, "Door sensor");
    }

    #[tokio::test]
    async fn detail_includes_photos() {
        let backend = backend();
        backend.set_photos(&["https://cdn/p.jpg"]);
        let ctx = context(backend);

        let detail = ticket_detail(&ctx, &TicketId::Text("T2".to_string()))
            .await
            .expect("detail");
        assert_eq!(detail.ticket.status, TicketStatus::InProgress);
        assert_eq!(detail.photos, vec!["https://cdn/p.jpg".to_string()]);
    }

    #[tokio::test]
    async fn direct_update_sends_only_changes_and_reloads() {
        let backend = backend();
        let ctx = context(backend.clone());
        let mut update = TicketUpdate::new(TicketId::Text("T2".to_string()));
        update.priority = Some(TicketPriority::High);
        update.assigned_to = Some(Assignment::Unassigned);

        let fresh = direct_update(&ctx, update).await.expect("update");

        assert_eq!(fresh.priority, TicketPriority::High);
        assert_eq!(fresh.assigned_to, None);
        let sent = backend.updates();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].status, None);
    }

    #[tokio::test]
    async fn empty_direct_update_is_rejected() {
        let backend = backend();
        let ctx = context(backend.clone());
        let update = TicketUpdate::new(TicketId::Text("T2".to_string()));
        assert!(direct_update(&ctx, update).await.is_err());
        assert!(backend.updates().is_empty());
    }

    #[tokio::test]
    async fn directory_and_history_queries() {
        let backend = backend();
        backend.set_technicians(vec![technician("u-1", "Mira")]);
        let ctx = context(backend.clone());

        let directory = technician_directory(&ctx).await;
        assert_eq!(directory.name_of(Some(&UserId("u-1".to_string()))), "Mira");

        history(&ctx, Some("  ")).await.expect("history");
        history(&ctx, Some(" pump ")).await.expect("history");
        assert_eq!(
            backend.history_queries(),
            vec![None, Some("pump".to_string())]
        );
    }

    #[tokio::test]
    async fn history_returns_backend_entries() {
        let backend = backend();
        let entries: Vec<HistoryEntry> = serde_json::from_str(
            r#"[{"ticket_name": "Boiler", "update": " bled radiators ",
                 "changes": [{"field": "status", "to": 3}]}]"#,
        )
        .expect("history json");
        backend.set_history(entries);
        let ctx = context(backend.clone());

        let found = history(&ctx, Some("boiler")).await.expect("history");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ticket_name.as_deref(), Some("Boiler"));
        assert_eq!(
            found[0].update_text(&TechnicianDirectory::default()),
            "bled radiators\nStatus changed to: Closed"
        );
    }
}
