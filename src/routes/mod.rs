//! JSON API under `/api/v1`.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::json;

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::services::{ServiceError, ServiceResult};

pub mod chat;
pub mod leads;
pub mod notes;
pub mod notifications;
pub mod session;
pub mod statuses;
pub mod team;
pub mod trading;

fn error_body(message: impl Into<String>) -> serde_json::Value {
    json!({ "error": message.into() })
}

/// Maps a service failure onto its HTTP status with a `{"error": ...}` body.
pub fn error_response(err: ServiceError) -> HttpResponse {
    match err {
        ServiceError::Unauthorized => HttpResponse::Forbidden().json(error_body("forbidden")),
        ServiceError::NotFound => HttpResponse::NotFound().json(error_body("not found")),
        ServiceError::Form(message) | ServiceError::TypeConstraint(message) => {
            HttpResponse::UnprocessableEntity().json(error_body(message))
        }
        err @ (ServiceError::Conflict(_) | ServiceError::InsufficientFunds) => {
            HttpResponse::Conflict().json(error_body(err.to_string()))
        }
        ServiceError::Upstream(message) => {
            HttpResponse::BadGateway().json(error_body(message))
        }
        err @ (ServiceError::Repository(_) | ServiceError::Internal(_)) => {
            log::error!("Request failed: {err}");
            HttpResponse::InternalServerError().json(error_body("internal error"))
        }
    }
}

pub fn form_error(err: FormError) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(error_body(err.to_string()))
}

/// `200 OK` with the JSON value, or the mapped error.
pub fn json_response<T: Serialize>(result: ServiceResult<T>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(err) => error_response(err),
    }
}

/// Identifier taken from the path; a non-positive one names nothing.
pub fn path_id<T>(raw: i32) -> Result<T, HttpResponse>
where
    T: TryFrom<i32, Error = TypeConstraintError>,
{
    T::try_from(raw).map_err(|_| HttpResponse::NotFound().json(error_body("not found")))
}

/// Registers every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(session::login)
            .service(session::logout)
            .service(session::current_session)
            .service(leads::list_leads)
            .service(leads::filter_options)
            .service(leads::export_leads)
            .service(leads::import_leads)
            .service(leads::bulk_update_status)
            .service(leads::bulk_assign)
            .service(leads::bulk_delete)
            .service(leads::show_lead)
            .service(leads::update_status)
            .service(leads::assign_agent)
            .service(leads::update_kyc)
            .service(leads::delete_lead)
            .service(notes::list_notes)
            .service(notes::add_note)
            .service(notes::delete_note)
            .service(statuses::list_statuses)
            .service(statuses::status_counts)
            .service(statuses::create_status)
            .service(chat::list_direct_rooms)
            .service(chat::open_direct_room)
            .service(chat::list_messages)
            .service(chat::send_message)
            .service(chat::mark_room_read)
            .service(notifications::list_notifications)
            .service(notifications::mark_all_read)
            .service(notifications::mark_read)
            .service(notifications::delete_notification)
            .service(team::list_team)
            .service(team::create_user)
            .service(team::delete_user)
            .service(team::assign_agents)
            .service(team::remove_agents)
            .service(team::grant_sources)
            .service(team::mark_synced)
            .service(trading::register_platform_account)
            .service(trading::trading_overview)
            .service(trading::create_trading_account)
            .service(trading::add_main_funds)
            .service(trading::transfer)
            .service(trading::list_transactions),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;

    use super::*;
    use crate::domain::types::LeadId;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Unauthorized, StatusCode::FORBIDDEN),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::Form("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::InsufficientFunds, StatusCode::CONFLICT),
            (ServiceError::Upstream("down".into()), StatusCode::BAD_GATEWAY),
            (ServiceError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(error_response(err).status(), expected);
        }
    }

    #[test]
    fn non_positive_path_ids_are_not_found() {
        assert!(path_id::<LeadId>(3).is_ok());
        let response = path_id::<LeadId>(0).unwrap_err();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
