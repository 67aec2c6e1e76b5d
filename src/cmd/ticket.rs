use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::domain::ticket::{Assignment, Ticket, TicketId, TicketPriority, TicketStatus, UserId};
use crate::domain::update::TicketUpdate;
use crate::domain::user::TechnicianDirectory;
use crate::error::{AppError, AppResult};
use crate::workflow::dashboard::{direct_update, technician_directory, ticket_detail};
use crate::workflow::sync::SaveOutcome;
use crate::workflow::ticket::{
    QuickEdit, TicketEdit, TicketWorkflowOutcome, commit_edit, quick_update,
};

#[derive(Args, Debug, Clone)]
pub struct TicketArgs {
    #[command(subcommand)]
    pub command: TicketCommand,
}

#[derive(Args, Debug, Clone)]
pub struct AssigneeArgs {
    /// Assign the ticket to this technician id.
    #[arg(long, conflicts_with = "unassign")]
    pub assign: Option<String>,
    /// Remove the current assignee.
    #[arg(long)]
    pub unassign: bool,
}

impl AssigneeArgs {
    fn assignment(&self) -> Option<Assignment> {
        if self.unassign {
            return Some(Assignment::Unassigned);
        }
        self.assign
            .as_ref()
            .map(|id| Assignment::from(Some(UserId(id.trim().to_string()))))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TicketCommand {
    /// Show a ticket with its photos.
    Show {
        id: String,
    },
    /// Save status, priority or assignee right away, optionally uploading photos.
    Set {
        id: String,
        #[arg(long, value_parser = parse_status)]
        status: Option<TicketStatus>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TicketPriority>,
        #[command(flatten)]
        assignee: AssigneeArgs,
        /// Note recorded in the ticket history.
        #[arg(long)]
        note: Option<String>,
        /// Photo to upload with the update. Repeatable.
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },
    /// Edit name, description or message and commit them with staged files.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Update message recorded in the ticket history.
        #[arg(long)]
        message: Option<String>,
        /// File to stage for the commit. Repeatable.
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },
    /// Update fields directly, as the manager dashboard does.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TicketStatus>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TicketPriority>,
        #[command(flatten)]
        assignee: AssigneeArgs,
    },
}

pub fn parse_status(value: &str) -> Result<TicketStatus, String> {
    TicketStatus::from_str(value)
        .ok_or_else(|| format!("unknown status '{value}' (open, in-progress, closed)"))
}

pub fn parse_priority(value: &str) -> Result<TicketPriority, String> {
    TicketPriority::from_str(value)
        .ok_or_else(|| format!("unknown priority '{value}' (high, medium, low)"))
}

pub async fn run(ctx: &AppContext, command: TicketCommand) -> AppResult<()> {
    match command {
        TicketCommand::Show { id } => {
            let id = TicketId::parse(&id);
            let detail = ticket_detail(ctx, &id).await?;
            let directory = technician_directory(ctx).await;
            print_ticket(&detail.ticket, &directory);
            if detail.photos.is_empty() {
                println!("Photos: none");
            } else {
                println!("Photos:");
                for url in &detail.photos {
                    println!("  {url}");
                }
            }
            Ok(())
        }
        TicketCommand::Set {
            id,
            status,
            priority,
            assignee,
            note,
            attachments,
        } => {
            let id = TicketId::parse(&id);
            let edit = QuickEdit {
                status,
                priority,
                assignee: assignee.assignment(),
                note,
                attachments,
            };
            let result = quick_update(ctx, &id, edit).await?;
            report(&id, &result)
        }
        TicketCommand::Edit {
            id,
            name,
            description,
            message,
            attachments,
        } => {
            let id = TicketId::parse(&id);
            let edit = TicketEdit {
                name,
                description,
                message,
                attachments,
            };
            let result = commit_edit(ctx, &id, edit).await?;
            report(&id, &result)
        }
        TicketCommand::Update {
            id,
            name,
            description,
            status,
            priority,
            assignee,
        } => {
            let mut update = TicketUpdate::new(TicketId::parse(&id));
            update.name = name;
            update.description = description;
            update.status = status;
            update.priority = priority;
            update.assigned_to = assignee.assignment();

            let ticket = direct_update(ctx, update).await?;
            let directory = technician_directory(ctx).await;
            println!("Ticket {} updated.", ticket.id);
            print_ticket(&ticket, &directory);
            Ok(())
        }
    }
}

fn report(id: &TicketId, result: &TicketWorkflowOutcome) -> AppResult<()> {
    match result.outcome {
        SaveOutcome::Saved => {
            println!("Ticket {id} saved.");
            if let Some(draft) = &result.draft {
                let fields = draft.original();
                println!(
                    "Status: {}  Priority: {}",
                    fields.status.as_str(),
                    fields.priority.as_str()
                );
            }
            if !result.attachments.is_empty() {
                println!("Photos on ticket: {}", result.attachments.len());
            }
            Ok(())
        }
        SaveOutcome::Queued | SaveOutcome::Failed | SaveOutcome::NoDraft => {
            for staged in &result.staged {
                println!("Still staged: {} ({})", staged.file_name, staged.id);
            }
            Err(AppError::Draft(format!(
                "changes to ticket {id} were not saved; see log output"
            )))
        }
    }
}

pub fn print_ticket(ticket: &Ticket, directory: &TechnicianDirectory) {
    println!("#{}  {}", ticket.id, ticket.name);
    println!(
        "Status: {}  Priority: {}  Assignee: {}",
        ticket.status.as_str(),
        ticket.priority.as_str(),
        directory.name_of(ticket.assigned_to.as_ref())
    );
    println!(
        "Created: {}",
        ticket.created_at.as_deref().unwrap_or("Unknown")
    );
    if !ticket.description.trim().is_empty() {
        println!();
        println!("{}", ticket.description.trim());
    }
}
