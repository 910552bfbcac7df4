//! Diesel models mirroring the SQLite tables.

pub mod chat;
#[cfg(feature = "server")]
pub mod config;
pub mod lead;
pub mod note;
pub mod notification;
pub mod status;
pub mod trading;
pub mod user;
