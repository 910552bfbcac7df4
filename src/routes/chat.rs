use actix_web::{HttpResponse, Responder, get, post, web};
use serde_json::json;

use crate::changes::ChangePublisher;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{RoomId, UserId};
use crate::forms::chat::{
    DirectRoomForm, MessagePageForm, MessagePagePayload, SendMessageForm, SendMessagePayload,
};
use crate::repository::DieselRepository;
use crate::routes::{error_response, form_error, json_response};
use crate::services::ServiceError;
use crate::services::chat as chat_service;

fn room_id(raw: &str) -> Result<RoomId, HttpResponse> {
    raw.parse()
        .map_err(|_| error_response(ServiceError::NotFound))
}

#[get("/chat/rooms")]
pub async fn list_direct_rooms(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_response(chat_service::list_direct_rooms(repo.get_ref(), &user))
}

/// Opens the direct room with another user; `201` when it was just created.
#[post("/chat/rooms")]
pub async fn open_direct_room(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<DirectRoomForm>,
) -> impl Responder {
    let other_user_id = match UserId::try_from(form) {
        Ok(other_user_id) => other_user_id,
        Err(err) => return form_error(err),
    };

    match chat_service::open_direct_room(repo.get_ref(), &user, other_user_id) {
        Ok(data) if data.created => HttpResponse::Created().json(data),
        Ok(data) => HttpResponse::Ok().json(data),
        Err(err) => error_response(err),
    }
}

/// `?before_at=..&before_id=..&limit=..` pages backwards through the room.
#[get("/chat/rooms/{room_id}/messages")]
pub async fn list_messages(
    room: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(form): web::Query<MessagePageForm>,
) -> impl Responder {
    let room_id = match room_id(&room) {
        Ok(room_id) => room_id,
        Err(response) => return response,
    };
    let page = match MessagePagePayload::try_from(form) {
        Ok(page) => page,
        Err(err) => return form_error(err),
    };

    json_response(chat_service::list_messages(repo.get_ref(), &user, room_id, page))
}

#[post("/chat/rooms/{room_id}/messages")]
pub async fn send_message(
    room: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<SendMessageForm>,
) -> impl Responder {
    let room_id = match room_id(&room) {
        Ok(room_id) => room_id,
        Err(response) => return response,
    };
    let payload = match SendMessagePayload::try_from(form) {
        Ok(payload) => payload,
        Err(err) => return form_error(err),
    };

    match chat_service::send_message(repo.get_ref(), publisher.get_ref(), &user, room_id, payload)
    {
        Ok(message) => HttpResponse::Created().json(message),
        Err(err) => error_response(err),
    }
}

#[post("/chat/rooms/{room_id}/read")]
pub async fn mark_room_read(
    room: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let room_id = match room_id(&room) {
        Ok(room_id) => room_id,
        Err(response) => return response,
    };

    match chat_service::mark_room_read(repo.get_ref(), &user, room_id) {
        Ok(updated) => HttpResponse::Ok().json(json!({ "updated": updated })),
        Err(err) => error_response(err),
    }
}
