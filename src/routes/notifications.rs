use actix_web::{HttpResponse, Responder, delete, get, post, web};
use serde_json::json;

use crate::changes::ChangePublisher;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::NotificationId;
use crate::repository::DieselRepository;
use crate::routes::{error_response, json_response, path_id};
use crate::services::notifications as notifications_service;

#[get("/notifications")]
pub async fn list_notifications(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_response(notifications_service::list_notifications(repo.get_ref(), &user))
}

#[post("/notifications/read")]
pub async fn mark_all_read(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match notifications_service::mark_all_read(repo.get_ref(), &user) {
        Ok(updated) => HttpResponse::Ok().json(json!({ "updated": updated })),
        Err(err) => error_response(err),
    }
}

#[post("/notifications/{notification_id}/read")]
pub async fn mark_read(
    notification_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
) -> impl Responder {
    let notification_id = match path_id::<NotificationId>(notification_id.into_inner()) {
        Ok(notification_id) => notification_id,
        Err(response) => return response,
    };

    json_response(notifications_service::mark_read(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        notification_id,
    ))
}

#[delete("/notifications/{notification_id}")]
pub async fn delete_notification(
    notification_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
) -> impl Responder {
    let notification_id = match path_id::<NotificationId>(notification_id.into_inner()) {
        Ok(notification_id) => notification_id,
        Err(response) => return response,
    };

    json_response(notifications_service::delete_notification(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        notification_id,
    ))
}
