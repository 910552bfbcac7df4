use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::note::{NewNote as DomainNewNote, Note as DomainNote};
use crate::domain::types::{LeadId, NoteContent, NoteId, PersonName, TypeConstraintError, UserId};
use crate::models::lead::Lead;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::lead_notes)]
#[diesel(belongs_to(Lead, foreign_key = lead_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Note {
    pub id: i32,
    pub lead_id: i32,
    pub author_id: i32,
    pub author_name: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::lead_notes)]
pub struct NewNote<'a> {
    pub lead_id: i32,
    pub author_id: i32,
    pub author_name: &'a str,
    pub content: &'a str,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Note> for DomainNote {
    type Error = TypeConstraintError;

    fn try_from(note: Note) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NoteId::try_from(note.id)?,
            lead_id: LeadId::try_from(note.lead_id)?,
            author_id: UserId::try_from(note.author_id)?,
            author_name: PersonName::new(note.author_name)?,
            content: NoteContent::new(note.content)?,
            created_at: note.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewNote> for NewNote<'a> {
    fn from(note: &'a DomainNewNote) -> Self {
        Self {
            lead_id: note.lead_id.get(),
            author_id: note.author_id.get(),
            author_name: note.author_name.as_str(),
            content: note.content.as_str(),
            created_at: note.created_at,
        }
    }
}
