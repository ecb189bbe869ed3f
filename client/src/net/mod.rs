//! Networking drivers.
//!
//! `api` is the REST client behind the `ReportsBackend`/`AuthBackend` seams.
//! `channel` runs the reconnecting chat WebSocket around `state::chat::ChatState`.

pub mod api;
pub mod channel;
