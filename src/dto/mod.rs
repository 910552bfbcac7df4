//! DTO modules that bridge services with the JSON API.

pub mod chat;
pub mod leads;
pub mod notifications;
pub mod session;
pub mod team;
pub mod trading;
