use actix_identity::Identity;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, delete, get, post, web};
use serde::Deserialize;

use crate::auth::decode_token;
use crate::domain::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::routes::json_response;
use crate::services::session as session_service;

#[derive(Deserialize)]
pub struct LoginForm {
    /// Token issued by the auth service.
    pub token: String,
}

/// Stores a verified token in the session cookie.
#[post("/session")]
pub async fn login(
    req: HttpRequest,
    server_config: web::Data<ServerConfig>,
    web::Json(form): web::Json<LoginForm>,
) -> impl Responder {
    let user = match decode_token(&form.token, &server_config.secret) {
        Ok(user) => user,
        Err(err) => {
            log::info!("Rejected login token: {err}");
            return HttpResponse::Unauthorized().finish();
        }
    };

    if let Err(err) = Identity::login(&req.extensions(), form.token) {
        log::error!("Failed to start session for {}: {err}", user.email);
        return HttpResponse::InternalServerError().finish();
    }

    json_response(session_service::session_info(&user))
}

#[get("/session")]
pub async fn current_session(user: AuthenticatedUser) -> impl Responder {
    json_response(session_service::session_info(&user))
}

#[delete("/session")]
pub async fn logout(identity: Option<Identity>) -> impl Responder {
    if let Some(identity) = identity {
        identity.logout();
    }
    HttpResponse::NoContent().finish()
}
