use actix_web::{Responder, get, post, web};

use crate::changes::ChangePublisher;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::status::NewLeadStatus;
use crate::forms::statuses::CreateStatusForm;
use crate::repository::DieselRepository;
use crate::routes::{form_error, json_response};
use crate::services::statuses as statuses_service;

#[get("/statuses")]
pub async fn list_statuses(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_response(statuses_service::list_statuses(repo.get_ref(), &user))
}

/// Lead counts per status over the caller's visible leads.
#[get("/statuses/counts")]
pub async fn status_counts(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_response(statuses_service::status_counts(repo.get_ref(), &user))
}

#[post("/statuses")]
pub async fn create_status(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<CreateStatusForm>,
) -> impl Responder {
    let new_status = match NewLeadStatus::try_from(form) {
        Ok(new_status) => new_status,
        Err(err) => return form_error(err),
    };

    json_response(statuses_service::create_status(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        new_status,
    ))
}
