pub mod http;
pub mod preview;
