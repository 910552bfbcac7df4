//! Row-level change events published to realtime subscribers.

use serde::{Deserialize, Serialize};

use crate::domain::chat::Message;
use crate::domain::lead::Lead;
use crate::domain::note::Note;
use crate::domain::notification::Notification;
use crate::domain::status::LeadStatus;
use crate::domain::trading::{TradingAccount, TradingProfile};
use crate::domain::types::{LeadId, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum RowChange<T> {
    Inserted(T),
    Updated(T),
    Deleted(T),
}

impl<T> RowChange<T> {
    pub fn row(&self) -> &T {
        match self {
            RowChange::Inserted(row) | RowChange::Updated(row) | RowChange::Deleted(row) => row,
        }
    }
}

/// A lead was handed to an agent by someone else.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeadAssignment {
    pub lead_id: LeadId,
    pub lead_name: String,
    pub agent_id: UserId,
    pub assigned_by: UserId,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "table", content = "change", rename_all = "snake_case")]
pub enum ChangeEvent {
    Leads(RowChange<Lead>),
    Statuses(RowChange<LeadStatus>),
    Messages(RowChange<Message>),
    Notifications(RowChange<Notification>),
    Notes(RowChange<Note>),
    TradingAccounts(RowChange<TradingAccount>),
    TradingProfiles(RowChange<TradingProfile>),
    Assignments(LeadAssignment),
}

impl ChangeEvent {
    /// Subscription key; subscribers filter on its prefix.
    pub fn topic(&self) -> String {
        match self {
            ChangeEvent::Leads(_) => "leads".to_string(),
            ChangeEvent::Statuses(_) => "statuses".to_string(),
            ChangeEvent::Messages(change) => format!("messages:{}", change.row().room_id),
            ChangeEvent::Notifications(change) => {
                format!("notifications:{}", change.row().user_id)
            }
            ChangeEvent::Notes(change) => format!("notes:{}", change.row().lead_id),
            ChangeEvent::TradingAccounts(change) => {
                format!("trading:{}", change.row().profile_id)
            }
            ChangeEvent::TradingProfiles(change) => format!("trading:{}", change.row().id),
            ChangeEvent::Assignments(_) => "assignments".to_string(),
        }
    }
}
