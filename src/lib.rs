//! Terminal client for the ticket dashboard backend.
//!
//! [`workflow::sync::DraftSynchronizer`] owns the edit-and-save logic for one
//! ticket; the `cmd` modules are a thin clap front end over it.

pub mod cmd;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod infra;
pub mod logging;
pub mod services;
#[cfg(test)]
mod testing;
pub mod workflow;
