//! Client view-model state kept in sync with the API and the change feed.
//!
//! Nothing here performs I/O; a UI layer drives these stores with server
//! responses and realtime events and renders their state.

pub mod chat;
pub mod events;
pub mod leads;
pub mod notifications;
pub mod stats;
