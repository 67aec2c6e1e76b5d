use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::domain::attachment::{AttachmentFile, StagedId, StagingList};
use crate::domain::draft::{FieldValue, TicketDraft};
use crate::domain::ticket::{Ticket, TicketId};
use crate::domain::update::{QuickPatch, SaveRequest};
use crate::error::{AppError, AppResult};
use crate::services::{PreviewRegistry, TicketBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The backend confirmed the save and the draft was rebuilt.
    Saved,
    /// Another save was in flight; this one waits in the queue slot.
    Queued,
    /// The attempt was logged and abandoned. The draft is untouched.
    Failed,
    /// Nothing is open.
    NoDraft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSummary {
    pub id: StagedId,
    pub file_name: String,
    pub preview_url: String,
}

struct PendingSave {
    patch: QuickPatch,
    files: Vec<AttachmentFile>,
    note: String,
}

#[derive(Default)]
struct SessionState {
    draft: Option<TicketDraft>,
    staged: StagingList,
    attachments: Vec<String>,
    in_flight: bool,
    queued: Option<PendingSave>,
}

/// Editing session for a single ticket.
///
/// Holds the draft and its staged files, and pushes saves to the backend one
/// at a time. A save requested while another is in flight goes into a
/// single queue slot; a later request overwrites whatever is already there,
/// so only the most recent deferred save is ever sent. An intermediate quick
/// update can be lost this way. A commit waits for the slot to go idle
/// instead of queueing, so at most one save is outstanding at any time.
///
/// State sits behind a plain mutex that is never held across an `.await`.
pub struct DraftSynchronizer {
    backend: Arc<dyn TicketBackend>,
    previews: Arc<dyn PreviewRegistry>,
    preview_release_after: Option<Duration>,
    state: Mutex<SessionState>,
    idle: Notify,
    photos_token: AtomicU64,
}

impl DraftSynchronizer {
    pub fn new(
        backend: Arc<dyn TicketBackend>,
        previews: Arc<dyn PreviewRegistry>,
        preview_release_after: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            previews,
            preview_release_after,
            state: Mutex::new(SessionState::default()),
            idle: Notify::new(),
            photos_token: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts editing `ticket`, dropping any previous draft and staged files.
    pub fn open(&self, ticket: &Ticket) {
        let mut state = self.lock();
        state.draft = Some(TicketDraft::from_ticket(ticket));
        state.staged.clear();
        state.attachments.clear();
        debug!(ticket = %ticket.id, "draft opened");
    }

    pub fn close(&self) {
        let mut state = self.lock();
        state.draft = None;
        state.staged.clear();
        state.attachments.clear();
    }

    pub fn draft(&self) -> Option<TicketDraft> {
        self.lock().draft.clone()
    }

    pub fn ticket_id(&self) -> Option<TicketId> {
        self.lock()
            .draft
            .as_ref()
            .map(|draft| draft.ticket_id().clone())
    }

    pub fn set_field(&self, value: FieldValue) -> AppResult<()> {
        let mut state = self.lock();
        let draft = state
            .draft
            .as_mut()
            .ok_or_else(|| AppError::Draft("no ticket is open".to_string()))?;
        draft.apply(value);
        Ok(())
    }

    pub fn has_changes(&self) -> bool {
        let state = self.lock();
        match &state.draft {
            Some(draft) => draft.fields_changed() || draft.has_message() || !state.staged.is_empty(),
            None => false,
        }
    }

    pub fn stage_attachment(&self, file: AttachmentFile) -> AppResult<StagedId> {
        let mut state = self.lock();
        if state.draft.is_none() {
            return Err(AppError::Draft("no ticket is open".to_string()));
        }
        let id = state
            .staged
            .stage(file, self.previews.clone(), self.preview_release_after);
        Ok(id)
    }

    pub fn unstage_attachment(&self, id: &StagedId) -> bool {
        self.lock().staged.unstage(id)
    }

    pub fn staged(&self) -> Vec<StagedSummary> {
        self.lock()
            .staged
            .iter()
            .map(|entry| StagedSummary {
                id: entry.id().clone(),
                file_name: entry.file().file_name.clone(),
                preview_url: entry.preview().url().to_string(),
            })
            .collect()
    }

    pub fn attachments(&self) -> Vec<String> {
        self.lock().attachments.clone()
    }

    pub fn is_saving(&self) -> bool {
        self.lock().in_flight
    }

    /// Saves `patch`, `files` and `note` right away, or parks them in the
    /// queue slot when a save is already running. The first caller drives
    /// the queue until it is empty and gets the outcome of its own request.
    pub async fn request_save(
        &self,
        patch: QuickPatch,
        files: Vec<AttachmentFile>,
        note: impl Into<String>,
    ) -> SaveOutcome {
        let pending = PendingSave {
            patch,
            files,
            note: note.into(),
        };

        {
            let mut state = self.lock();
            if state.draft.is_none() {
                return SaveOutcome::NoDraft;
            }
            if state.in_flight {
                if state.queued.replace(pending).is_some() {
                    warn!("queued save replaced by a newer one; the older quick update is dropped");
                }
                return SaveOutcome::Queued;
            }
            state.in_flight = true;
        }

        let outcome = self.run_quick_save(pending).await;
        self.drain_queue().await;
        outcome
    }

    /// Runs queued saves until the slot is empty, then releases it.
    async fn drain_queue(&self) {
        while let Some(next) = self.next_queued() {
            let drained = self.run_quick_save(next).await;
            debug!(?drained, "queued save finished");
        }
    }

    /// Takes the queued save, or clears the in-flight flag when there is none.
    fn next_queued(&self) -> Option<PendingSave> {
        let next = {
            let mut state = self.lock();
            let next = state.queued.take();
            if next.is_none() {
                state.in_flight = false;
            }
            next
        };
        if next.is_none() {
            self.idle.notify_waiters();
        }
        next
    }

    /// Waits until no save is in flight, then marks one as started.
    async fn claim_save_slot(&self) {
        loop {
            // Registered before the flag check so a release in between is not missed.
            let released = self.idle.notified();
            {
                let mut state = self.lock();
                if !state.in_flight {
                    state.in_flight = true;
                    return;
                }
            }
            debug!("commit waiting for the running save");
            released.await;
        }
    }

    async fn run_quick_save(&self, pending: PendingSave) -> SaveOutcome {
        let Some(ticket_id) = self.ticket_id() else {
            return SaveOutcome::NoDraft;
        };
        let request = SaveRequest::quick(
            ticket_id.clone(),
            pending.patch,
            pending.note,
            pending.files,
        );

        match self.backend.save_update(request).await {
            Ok(()) => {
                info!(ticket = %ticket_id, "quick update saved");
                self.resync(&ticket_id).await;
                SaveOutcome::Saved
            }
            Err(err) => {
                error!(ticket = %ticket_id, error = %err, "auto-save failed");
                SaveOutcome::Failed
            }
        }
    }

    /// Sends every draft value plus the staged files and the message.
    ///
    /// The payload is taken when the commit is requested. If a quick save is
    /// running, the commit waits for it and its queue to finish, then runs,
    /// then drains anything queued in the meantime.
    pub async fn commit_save(&self) -> SaveOutcome {
        let request = {
            let state = self.lock();
            let Some(draft) = &state.draft else {
                return SaveOutcome::NoDraft;
            };
            SaveRequest::full(draft, state.staged.files())
        };

        self.claim_save_slot().await;
        let outcome = self.run_commit(request).await;
        self.drain_queue().await;
        outcome
    }

    async fn run_commit(&self, request: SaveRequest) -> SaveOutcome {
        let ticket_id = request.ticket_id.clone();

        match self.backend.save_update(request).await {
            Ok(()) => {
                {
                    let mut guard = self.lock();
                    let state = &mut *guard;
                    if let Some(draft) = state
                        .draft
                        .as_mut()
                        .filter(|draft| draft.ticket_id() == &ticket_id)
                    {
                        draft.clear_message();
                        state.staged.clear();
                    }
                }
                info!(ticket = %ticket_id, "changes committed");
                self.resync(&ticket_id).await;
                SaveOutcome::Saved
            }
            Err(err) => {
                error!(ticket = %ticket_id, error = %err, "save failed");
                SaveOutcome::Failed
            }
        }
    }

    /// Rebuilds the draft from the backend's current copy of the ticket.
    async fn resync(&self, ticket_id: &TicketId) {
        let tickets = match self.backend.list_tickets().await {
            Ok(tickets) => tickets,
            Err(err) => {
                error!(ticket = %ticket_id, error = %err, "failed to reload tickets");
                return;
            }
        };
        let Some(fresh) = tickets.iter().find(|ticket| &ticket.id == ticket_id) else {
            warn!(ticket = %ticket_id, "ticket missing from reloaded list");
            return;
        };
        if self.ticket_id().as_ref() != Some(ticket_id) {
            debug!(ticket = %ticket_id, "draft switched tickets during save; not rebuilding");
            return;
        }

        self.open(fresh);
        self.refresh_attachments().await;
    }

    /// Reloads the server-side photo list for the open ticket. Returns `None`
    /// when nothing is open, the call failed, or a newer refresh started
    /// before this one resolved.
    pub async fn refresh_attachments(&self) -> Option<Vec<String>> {
        let ticket_id = self.ticket_id()?;
        let token = self.photos_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock().attachments.clear();

        let result = self.backend.list_photos(&ticket_id).await;
        if self.photos_token.load(Ordering::SeqCst) != token {
            debug!(ticket = %ticket_id, token, "discarding superseded photo listing");
            return None;
        }

        match result {
            Ok(urls) => {
                self.lock().attachments = urls.clone();
                Some(urls)
            }
            Err(err) => {
                error!(ticket = %ticket_id, error = %err, "failed to load photos");
                None
            }
        }
    }
}
