use std::path::PathBuf;

use crate::context::AppContext;
use crate::domain::attachment::AttachmentFile;
use crate::domain::draft::{FieldValue, TicketDraft};
use crate::domain::ticket::{Assignment, TicketId, TicketPriority, TicketStatus};
use crate::domain::update::QuickPatch;
use crate::error::{AppError, AppResult};
use crate::workflow::dashboard::find_ticket;
use crate::workflow::sync::{DraftSynchronizer, SaveOutcome, StagedSummary};

const PHOTOS_UPLOADED_NOTE: &str = "Photos uploaded";

#[derive(Debug, Clone, Default)]
pub struct QuickEdit {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee: Option<Assignment>,
    pub note: Option<String>,
    pub attachments: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub message: Option<String>,
    pub attachments: Vec<PathBuf>,
}

pub struct TicketWorkflowOutcome {
    pub outcome: SaveOutcome,
    pub draft: Option<TicketDraft>,
    pub staged: Vec<StagedSummary>,
    pub attachments: Vec<String>,
}

impl TicketWorkflowOutcome {
    fn capture(session: &DraftSynchronizer, outcome: SaveOutcome) -> Self {
        Self {
            outcome,
            draft: session.draft(),
            staged: session.staged(),
            attachments: session.attachments(),
        }
    }
}

async fn open_session(ctx: &AppContext, id: &TicketId) -> AppResult<DraftSynchronizer> {
    let ticket = find_ticket(ctx, id).await?;
    let session = ctx.synchronizer();
    session.open(&ticket);
    Ok(session)
}

async fn read_files(paths: &[PathBuf]) -> AppResult<Vec<AttachmentFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(AttachmentFile::read(path).await?);
    }
    Ok(files)
}

/// Status, priority and assignee changes plus photo uploads, saved right
/// away without an explicit commit.
pub async fn quick_update(
    ctx: &AppContext,
    id: &TicketId,
    edit: QuickEdit,
) -> AppResult<TicketWorkflowOutcome> {
    let patch = QuickPatch {
        status: edit.status,
        priority: edit.priority,
        assigned_to: edit.assignee,
    };
    if patch.is_empty() && edit.attachments.is_empty() {
        return Err(AppError::Draft("nothing to update".to_string()));
    }

    let files = read_files(&edit.attachments).await?;
    let session = open_session(ctx, id).await?;

    if let Some(status) = patch.status {
        session.set_field(FieldValue::Status(status))?;
    }
    if let Some(priority) = patch.priority {
        session.set_field(FieldValue::Priority(priority))?;
    }
    if let Some(assignment) = &patch.assigned_to {
        let assignee = match assignment {
            Assignment::Unassigned => None,
            Assignment::User(id) => Some(id.clone()),
        };
        session.set_field(FieldValue::AssignedTo(assignee))?;
    }

    let note = match edit.note {
        Some(note) => note,
        None if !files.is_empty() => PHOTOS_UPLOADED_NOTE.to_string(),
        None => String::new(),
    };

    let outcome = session.request_save(patch, files, note).await;
    let result = TicketWorkflowOutcome::capture(&session, outcome);
    session.close();
    Ok(result)
}

/// Name, description, message and staged files, sent together in one commit.
pub async fn commit_edit(
    ctx: &AppContext,
    id: &TicketId,
    edit: TicketEdit,
) -> AppResult<TicketWorkflowOutcome> {
    let files = read_files(&edit.attachments).await?;
    let session = open_session(ctx, id).await?;

    if let Some(name) = edit.name {
        session.set_field(FieldValue::Name(name))?;
    }
    if let Some(description) = edit.description {
        session.set_field(FieldValue::Description(description))?;
    }
    if let Some(message) = edit.message {
        session.set_field(FieldValue::Message(message))?;
    }
    for file in files {
        session.stage_attachment(file)?;
    }

    if !session.has_changes() {
        session.close();
        return Err(AppError::Draft("no changes to save".to_string()));
    }

    let outcome = session.commit_save().await;
    let result = TicketWorkflowOutcome::capture(&session, outcome);
    session.close();
    Ok(result)
}
