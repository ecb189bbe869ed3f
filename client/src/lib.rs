//! # client
//!
//! Client library for the ChoufPrice community price monitor.
//!
//! State machines (`state`, `map`) are plain structs driven through `&mut self`
//! so they can be tested without a network or a map surface. The `net` module
//! holds the async drivers: the reconnecting chat channel over WebSocket and
//! the REST backend client. `catalog` and `util` carry the static reference
//! tables, locale dictionary and display formatting.

pub mod catalog;
pub mod config;
pub mod map;
pub mod net;
pub mod state;
pub mod util;
