use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use serde_json::json;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{SourceFolder, UserId};
use crate::domain::user::NewCrmUser;
use crate::forms::team::{CreateUserForm, GrantSourcesForm, TeamAgentsForm};
use crate::repository::DieselRepository;
use crate::routes::{error_response, form_error, json_response, path_id};
use crate::services::team as team_service;

#[get("/team")]
pub async fn list_team(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_response(team_service::list_team(repo.get_ref(), &user))
}

#[post("/team/users")]
pub async fn create_user(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CreateUserForm>,
) -> impl Responder {
    let new_user = match NewCrmUser::try_from(form) {
        Ok(new_user) => new_user,
        Err(err) => return form_error(err),
    };

    match team_service::create_user(repo.get_ref(), &user, new_user) {
        Ok(created) => HttpResponse::Created().json(created),
        Err(err) => error_response(err),
    }
}

#[delete("/team/users/{user_id}")]
pub async fn delete_user(
    user_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let user_id = match path_id::<UserId>(user_id.into_inner()) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match team_service::delete_user(repo.get_ref(), &user, user_id) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response(err),
    }
}

#[post("/team/users/{user_id}/synced")]
pub async fn mark_synced(
    user_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let user_id = match path_id::<UserId>(user_id.into_inner()) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    json_response(team_service::mark_synced(repo.get_ref(), &user, user_id))
}

#[post("/team/leaders/{leader_id}/agents")]
pub async fn assign_agents(
    leader_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<TeamAgentsForm>,
) -> impl Responder {
    let leader_id = match path_id::<UserId>(leader_id.into_inner()) {
        Ok(leader_id) => leader_id,
        Err(response) => return response,
    };
    let agent_ids = match Vec::<UserId>::try_from(form) {
        Ok(agent_ids) => agent_ids,
        Err(err) => return form_error(err),
    };

    match team_service::assign_agents(repo.get_ref(), &user, leader_id, &agent_ids) {
        Ok(updated) => HttpResponse::Ok().json(json!({ "updated": updated })),
        Err(err) => error_response(err),
    }
}

#[post("/team/leaders/{leader_id}/agents/remove")]
pub async fn remove_agents(
    leader_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<TeamAgentsForm>,
) -> impl Responder {
    let leader_id = match path_id::<UserId>(leader_id.into_inner()) {
        Ok(leader_id) => leader_id,
        Err(response) => return response,
    };
    let agent_ids = match Vec::<UserId>::try_from(form) {
        Ok(agent_ids) => agent_ids,
        Err(err) => return form_error(err),
    };

    match team_service::remove_agents(repo.get_ref(), &user, leader_id, &agent_ids) {
        Ok(updated) => HttpResponse::Ok().json(json!({ "updated": updated })),
        Err(err) => error_response(err),
    }
}

#[put("/team/managers/{manager_id}/sources")]
pub async fn grant_sources(
    manager_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<GrantSourcesForm>,
) -> impl Responder {
    let manager_id = match path_id::<UserId>(manager_id.into_inner()) {
        Ok(manager_id) => manager_id,
        Err(response) => return response,
    };
    let folders = Vec::<SourceFolder>::from(form);

    json_response(team_service::grant_sources(
        repo.get_ref(),
        &user,
        manager_id,
        &folders,
    ))
}
