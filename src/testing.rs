//! In-memory doubles for the backend and preview seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use crate::domain::attachment::AttachmentFile;
use crate::domain::history::HistoryEntry;
use crate::domain::ticket::{Assignment, Ticket, TicketId, TicketPriority, TicketStatus, UserId};
use crate::domain::update::{SaveRequest, TicketUpdate};
use crate::domain::user::Technician;
use crate::error::{AppError, AppResult};
use crate::services::{PreviewRegistry, TicketBackend};

pub fn ticket(id: &str, status: TicketStatus) -> Ticket {
    Ticket {
        id: TicketId::Text(id.to_string()),
        name: format!("Ticket {id}"),
        description: "Pump makes noise".to_string(),
        status,
        priority: TicketPriority::Medium,
        assigned_to: None,
        created_at: Some("2025-02-01T08:30:00Z".to_string()),
    }
}

pub fn technician(id: &str, name: &str) -> Technician {
    Technician {
        id: UserId(id.to_string()),
        name: name.to_string(),
    }
}

/// Backend that applies saves to its own ticket list, like the real one.
/// Saves and photo listings can be held at a gate to simulate slow calls.
#[derive(Default)]
pub struct FakeBackend {
    tickets: Mutex<Vec<Ticket>>,
    saves: Mutex<Vec<SaveRequest>>,
    updates: Mutex<Vec<TicketUpdate>>,
    photos: Mutex<Vec<String>>,
    technicians: Mutex<Vec<Technician>>,
    history: Mutex<Vec<HistoryEntry>>,
    history_queries: Mutex<Vec<Option<String>>>,
    fail_saves: AtomicBool,
    fail_listing: AtomicBool,
    save_gate: Mutex<Option<Arc<Semaphore>>>,
    save_started: Notify,
    photo_gate: Mutex<Option<Arc<Semaphore>>>,
    photo_started: Notify,
    photo_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        let backend = Self::default();
        *backend.tickets.lock().expect("tickets") = tickets;
        backend
    }

    pub fn set_photos(&self, urls: &[&str]) {
        *self.photos.lock().expect("photos") = urls.iter().map(|url| url.to_string()).collect();
    }

    pub fn set_technicians(&self, technicians: Vec<Technician>) {
        *self.technicians.lock().expect("technicians") = technicians;
    }

    pub fn set_history(&self, entries: Vec<HistoryEntry>) {
        *self.history.lock().expect("history") = entries;
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Holds every following save until permits are added to the returned
    /// semaphore.
    pub fn gate_saves(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.save_gate.lock().expect("save gate") = Some(gate.clone());
        gate
    }

    pub fn gate_photos(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.photo_gate.lock().expect("photo gate") = Some(gate.clone());
        gate
    }

    pub async fn save_started(&self) {
        self.save_started.notified().await;
    }

    pub async fn photos_started(&self) {
        self.photo_started.notified().await;
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.saves.lock().expect("saves").clone()
    }

    pub fn updates(&self) -> Vec<TicketUpdate> {
        self.updates.lock().expect("updates").clone()
    }

    pub fn history_queries(&self) -> Vec<Option<String>> {
        self.history_queries.lock().expect("queries").clone()
    }

    pub fn photo_calls(&self) -> usize {
        self.photo_calls.load(Ordering::SeqCst)
    }

    pub fn ticket(&self, id: &TicketId) -> Option<Ticket> {
        self.tickets
            .lock()
            .expect("tickets")
            .iter()
            .find(|ticket| &ticket.id == id)
            .cloned()
    }

    fn apply(&self, id: &TicketId, apply: impl FnOnce(&mut Ticket)) {
        let mut tickets = self.tickets.lock().expect("tickets");
        if let Some(ticket) = tickets.iter_mut().find(|ticket| &ticket.id == id) {
            apply(ticket);
        }
    }
}

fn assign(ticket: &mut Ticket, assignment: Assignment) {
    ticket.assigned_to = match assignment {
        Assignment::Unassigned => None,
        Assignment::User(id) => Some(id),
    };
}

#[async_trait]
impl TicketBackend for FakeBackend {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(AppError::Transport("listing unavailable".to_string()));
        }
        Ok(self.tickets.lock().expect("tickets").clone())
    }

    async fn save_update(&self, request: SaveRequest) -> AppResult<()> {
        self.saves.lock().expect("saves").push(request.clone());
        self.save_started.notify_one();

        let gate = self.save_gate.lock().expect("save gate").clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate open").forget();
        }

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Transport("connection reset".to_string()));
        }

        self.apply(&request.ticket_id, |ticket| {
            if let Some(name) = request.name {
                ticket.name = name;
            }
            if let Some(description) = request.description {
                ticket.description = description;
            }
            if let Some(status) = request.status {
                ticket.status = status;
            }
            if let Some(priority) = request.priority {
                ticket.priority = priority;
            }
            if let Some(assignment) = request.assigned_to {
                assign(ticket, assignment);
            }
        });
        Ok(())
    }

    async fn update_ticket(&self, update: TicketUpdate) -> AppResult<()> {
        self.updates.lock().expect("updates").push(update.clone());
        self.apply(&update.id, |ticket| {
            if let Some(name) = update.name {
                ticket.name = name;
            }
            if let Some(description) = update.description {
                ticket.description = description;
            }
            if let Some(status) = update.status {
                ticket.status = status;
            }
            if let Some(priority) = update.priority {
                ticket.priority = priority;
            }
            if let Some(assignment) = update.assigned_to {
                assign(ticket, assignment);
            }
        });
        Ok(())
    }

    async fn list_photos(&self, _ticket_id: &TicketId) -> AppResult<Vec<String>> {
        self.photo_calls.fetch_add(1, Ordering::SeqCst);
        self.photo_started.notify_one();

        let gate = self.photo_gate.lock().expect("photo gate").clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate open").forget();
        }
        Ok(self.photos.lock().expect("photos").clone())
    }

    async fn list_technicians(&self) -> AppResult<Vec<Technician>> {
        Ok(self.technicians.lock().expect("technicians").clone())
    }

    async fn ticket_history(&self, query: Option<&str>) -> AppResult<Vec<HistoryEntry>> {
        self.history_queries
            .lock()
            .expect("queries")
            .push(query.map(str::to_string));
        Ok(self.history.lock().expect("history").clone())
    }
}

/// Preview registry that counts revokes per handle.
#[derive(Default)]
pub struct RecordingPreviews {
    live: Mutex<HashSet<String>>,
    revocations: Mutex<HashMap<String, usize>>,
    created: AtomicUsize,
}

impl RecordingPreviews {
    pub fn live(&self) -> usize {
        self.live.lock().expect("live").len()
    }

    pub fn revocations(&self) -> HashMap<String, usize> {
        self.revocations.lock().expect("revocations").clone()
    }
}

impl PreviewRegistry for RecordingPreviews {
    fn create(&self, file: &AttachmentFile) -> String {
        let serial = self.created.fetch_add(1, Ordering::SeqCst);
        let url = format!("blob:test/{serial}/{}", file.file_name);
        self.live.lock().expect("live").insert(url.clone());
        url
    }

    fn revoke(&self, url: &str) {
        self.live.lock().expect("live").remove(url);
        *self
            .revocations
            .lock()
            .expect("revocations")
            .entry(url.to_string())
            .or_default() += 1;
    }
}
