pub mod backend;
pub mod preview;

pub use backend::TicketBackend;
pub use preview::PreviewRegistry;
