use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("backend transport error: {0}")]
    Transport(String),
    #[error("backend responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("failed to decode backend response: {0}")]
    Decode(String),
    #[error("ticket {0} not found")]
    TicketNotFound(String),
    #[error("draft error: {0}")]
    Draft(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
