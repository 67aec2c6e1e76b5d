use clap::Args;

use crate::cmd::ticket::{parse_priority, parse_status};
use crate::context::AppContext;
use crate::domain::filter::{TechnicianFilter, TicketFilter};
use crate::domain::ticket::{TicketPriority, TicketStatus, UserId};
use crate::error::AppResult;
use crate::workflow::dashboard::{history, list_tickets, technician_directory};

#[derive(Args, Debug, Clone)]
pub struct TicketsArgs {
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TicketStatus>,
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<TicketPriority>,
    /// Only tickets assigned to this technician id.
    #[arg(long, conflicts_with = "unassigned")]
    pub technician: Option<String>,
    /// Only tickets without an assignee.
    #[arg(long)]
    pub unassigned: bool,
}

impl TicketsArgs {
    fn filter(&self) -> TicketFilter {
        let technician = match (&self.technician, self.unassigned) {
            (_, true) => TechnicianFilter::Unassigned,
            (Some(id), false) => TechnicianFilter::Technician(UserId(id.trim().to_string())),
            (None, false) => TechnicianFilter::Any,
        };
        TicketFilter {
            technician,
            status: self.status,
            priority: self.priority,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Search term passed to the backend.
    pub query: Option<String>,
}

pub async fn run_tickets(ctx: &AppContext, args: TicketsArgs) -> AppResult<()> {
    let filter = args.filter();
    let tickets = list_tickets(ctx, &filter).await?;
    let directory = technician_directory(ctx).await;

    if tickets.is_empty() {
        if filter.is_active() {
            println!("No tickets match the current filters.");
        } else {
            println!("No tickets.");
        }
        return Ok(());
    }

    for ticket in &tickets {
        println!(
            "#{:<8} {:<12} {:<7} {:<16} {}",
            ticket.id.to_string(),
            ticket.status.as_str(),
            ticket.priority.as_str(),
            directory.name_of(ticket.assigned_to.as_ref()),
            ticket.name
        );
    }
    Ok(())
}

pub async fn run_technicians(ctx: &AppContext) -> AppResult<()> {
    let directory = technician_directory(ctx).await;
    if directory.technicians().is_empty() {
        println!("No technicians.");
    }
    for tech in directory.technicians() {
        println!("{:<24} {}", tech.id, tech.name);
    }
    Ok(())
}

pub async fn run_history(ctx: &AppContext, args: HistoryArgs) -> AppResult<()> {
    let entries = history(ctx, args.query.as_deref()).await?;
    if entries.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    let directory = technician_directory(ctx).await;
    for entry in &entries {
        println!(
            "{}  (created {}, updated {})",
            entry.ticket_name.as_deref().unwrap_or_default(),
            entry.ticket_created_at.as_deref().unwrap_or("-"),
            entry.updated_at.as_deref().unwrap_or("-"),
        );
        println!(
            "  Assignee: {}  Status: {}  Priority: {}",
            directory.name_of(entry.assignee.as_ref()),
            entry.status.map(|s| s.as_str()).unwrap_or("Unknown"),
            entry.priority.map(|p| p.as_str()).unwrap_or("Unknown"),
        );
        let text = entry.update_text(&directory);
        if text.is_empty() {
            println!("  No update");
        }
        for line in text.lines() {
            println!("  {line}");
        }
        for photo in &entry.photos {
            println!("  photo: {}", photo.url);
        }
    }
    Ok(())
}
