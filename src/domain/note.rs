use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{LeadId, NoteContent, NoteId, PersonName, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub lead_id: LeadId,
    pub author_id: UserId,
    pub author_name: PersonName,
    pub content: NoteContent,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNote {
    pub lead_id: LeadId,
    pub author_id: UserId,
    pub author_name: PersonName,
    pub content: NoteContent,
    pub created_at: NaiveDateTime,
}

impl NewNote {
    pub fn new(
        lead_id: LeadId,
        author_id: UserId,
        author_name: PersonName,
        content: NoteContent,
    ) -> Self {
        Self {
            lead_id,
            author_id,
            author_name,
            content,
            created_at: Utc::now().naive_utc(),
        }
    }
}
