pub mod attachment;
pub mod draft;
pub mod filter;
pub mod history;
pub mod ticket;
pub mod update;
pub mod user;
