//! Lead notes.

use crate::changes::{ChangePublisher, broadcast};
use crate::domain::auth::{AuthenticatedUser, Role};
use crate::domain::change::{ChangeEvent, RowChange};
use crate::domain::note::{NewNote, Note};
use crate::domain::types::{LeadId, NoteContent, NoteId, PersonName};
use crate::repository::{LeadReader, NoteReader, NoteWriter, UserReader};
use crate::services::leads::get_lead;
use crate::services::{ServiceError, ServiceResult, current_user_id};

/// Publishes the note change and the lead whose `note_count` moved with it.
fn publish_note_change<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    change: RowChange<Note>,
) where
    R: LeadReader + ?Sized,
{
    let lead_id = change.row().lead_id;
    broadcast(publisher, ChangeEvent::Notes(change));

    match repo.get_lead_by_id(lead_id) {
        Ok(Some(lead)) => broadcast(publisher, ChangeEvent::Leads(RowChange::Updated(lead))),
        Ok(None) => {}
        Err(err) => log::error!("Failed to reload lead {lead_id} after note change: {err}"),
    }
}

/// Notes of a visible lead, oldest first.
pub fn list_notes<R>(
    repo: &R,
    user: &AuthenticatedUser,
    lead_id: LeadId,
) -> ServiceResult<Vec<Note>>
where
    R: LeadReader + NoteReader + UserReader + ?Sized,
{
    let lead = get_lead(repo, user, lead_id)?;
    Ok(repo.list_notes(lead.id)?)
}

pub fn add_note<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_id: LeadId,
    content: NoteContent,
) -> ServiceResult<Note>
where
    R: LeadReader + NoteWriter + UserReader + ?Sized,
{
    let author_id = current_user_id(user)?;
    let lead = get_lead(repo, user, lead_id)?;
    let author_name = PersonName::new(user.name.as_str())
        .or_else(|_| PersonName::new(user.email.as_str()))?;

    let note = repo
        .create_note(&NewNote::new(lead.id, author_id, author_name, content))
        .map_err(|err| {
            log::error!("Failed to add note to lead {lead_id}: {err}");
            err
        })?;
    publish_note_change(repo, publisher, RowChange::Inserted(note.clone()));

    Ok(note)
}

/// Deletes a note; only its author or a lead manager may do so.
pub fn delete_note<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    note_id: NoteId,
) -> ServiceResult<Note>
where
    R: LeadReader + NoteReader + NoteWriter + UserReader + ?Sized,
{
    let user_id = current_user_id(user)?;
    let note = repo.get_note(note_id)?.ok_or(ServiceError::NotFound)?;
    get_lead(repo, user, note.lead_id)?;

    if note.author_id != user_id && !user.has_role(&[Role::Admin, Role::Manager]) {
        return Err(ServiceError::Unauthorized);
    }

    let deleted = repo.delete_note(note_id).map_err(|err| {
        log::error!("Failed to delete note {note_id}: {err}");
        err
    })?;
    publish_note_change(repo, publisher, RowChange::Deleted(deleted.clone()));

    Ok(deleted)
}
