pub mod app;
pub mod chat;
pub mod reports;
pub mod session;
