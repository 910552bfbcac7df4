use diesel::prelude::*;

use crate::domain::note::{NewNote, Note};
use crate::domain::types::{LeadId, NoteId};
use crate::models::note::{NewNote as DbNewNote, Note as DbNote};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, NoteReader, NoteWriter};
use crate::schema::{lead_notes, leads};

impl NoteReader for DieselRepository {
    fn list_notes(&self, lead_id: LeadId) -> RepositoryResult<Vec<Note>> {
        let mut conn = self.conn()?;

        let notes = lead_notes::table
            .filter(lead_notes::lead_id.eq(lead_id.get()))
            .order((lead_notes::created_at.asc(), lead_notes::id.asc()))
            .load::<DbNote>(&mut conn)?
            .into_iter()
            .map(Note::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    fn get_note(&self, id: NoteId) -> RepositoryResult<Option<Note>> {
        let mut conn = self.conn()?;

        let note = lead_notes::table
            .find(id.get())
            .first::<DbNote>(&mut conn)
            .optional()?;

        Ok(note.map(Note::try_from).transpose()?)
    }
}

impl NoteWriter for DieselRepository {
    fn create_note(&self, new_note: &NewNote) -> RepositoryResult<Note> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let insertable: DbNewNote = new_note.into();
            let note = diesel::insert_into(lead_notes::table)
                .values(&insertable)
                .get_result::<DbNote>(conn)?;

            diesel::update(leads::table.find(new_note.lead_id.get()))
                .set(leads::note_count.eq(leads::note_count + 1))
                .execute(conn)?;

            Ok(Note::try_from(note)?)
        })
    }

    fn delete_note(&self, id: NoteId) -> RepositoryResult<Note> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let note = lead_notes::table.find(id.get()).first::<DbNote>(conn)?;

            diesel::delete(lead_notes::table.find(id.get())).execute(conn)?;
            diesel::update(
                leads::table
                    .find(note.lead_id)
                    .filter(leads::note_count.gt(0)),
            )
            .set(leads::note_count.eq(leads::note_count - 1))
            .execute(conn)?;

            Ok(Note::try_from(note)?)
        })
    }
}
