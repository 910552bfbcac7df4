//! Domain aggregates exposed by the CRM service layer.

pub mod auth;
pub mod change;
pub mod chat;
pub mod lead;
pub mod lead_filter;
pub mod note;
pub mod notification;
pub mod status;
pub mod trading;
pub mod types;
pub mod user;
