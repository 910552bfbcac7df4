use actix_web::{Responder, delete, get, post, web};

use crate::changes::ChangePublisher;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{LeadId, NoteContent, NoteId};
use crate::forms::notes::AddNoteForm;
use crate::repository::DieselRepository;
use crate::routes::{form_error, json_response, path_id};
use crate::services::notes as notes_service;

#[get("/leads/{lead_id}/notes")]
pub async fn list_notes(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };

    json_response(notes_service::list_notes(repo.get_ref(), &user, lead_id))
}

#[post("/leads/{lead_id}/notes")]
pub async fn add_note(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<AddNoteForm>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };
    let content = match NoteContent::try_from(form) {
        Ok(content) => content,
        Err(err) => return form_error(err),
    };

    json_response(notes_service::add_note(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        lead_id,
        content,
    ))
}

#[delete("/notes/{note_id}")]
pub async fn delete_note(
    note_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
) -> impl Responder {
    let note_id = match path_id::<NoteId>(note_id.into_inner()) {
        Ok(note_id) => note_id,
        Err(response) => return response,
    };

    json_response(notes_service::delete_note(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        note_id,
    ))
}
