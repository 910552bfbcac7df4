use actix_web::{HttpResponse, Responder, get, post, web};

use crate::changes::ChangePublisher;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{AccountName, Amount, LeadId};
use crate::forms::trading::{
    AddFundsForm, CreateAccountForm, RegisterPlatformForm, RegisterPlatformPayload,
    TransferForm, TransferPayload,
};
use crate::platform::PlatformBridge;
use crate::repository::DieselRepository;
use crate::routes::{error_response, form_error, json_response, path_id};
use crate::services::trading as trading_service;

#[post("/leads/{lead_id}/platform")]
pub async fn register_platform_account(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    platform: web::Data<PlatformBridge>,
    web::Json(form): web::Json<RegisterPlatformForm>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };
    let payload = match RegisterPlatformPayload::try_from(form) {
        Ok(payload) => payload,
        Err(err) => return form_error(err),
    };

    let result = trading_service::register_platform_account(
        repo.get_ref(),
        publisher.get_ref(),
        &platform.identity,
        platform.initial_balance,
        &user,
        lead_id,
        payload,
    )
    .await;

    match result {
        Ok(registration) => HttpResponse::Created().json(registration),
        Err(err) => error_response(err),
    }
}

#[get("/leads/{lead_id}/trading")]
pub async fn trading_overview(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };

    json_response(trading_service::trading_overview(repo.get_ref(), &user, lead_id))
}

#[post("/leads/{lead_id}/trading/accounts")]
pub async fn create_trading_account(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<CreateAccountForm>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };
    let name = match AccountName::try_from(form) {
        Ok(name) => name,
        Err(err) => return form_error(err),
    };

    match trading_service::create_trading_account(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        lead_id,
        name,
    ) {
        Ok(account) => HttpResponse::Created().json(account),
        Err(err) => error_response(err),
    }
}

#[post("/leads/{lead_id}/trading/funds")]
pub async fn add_main_funds(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<AddFundsForm>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };
    let amount = match Amount::try_from(form) {
        Ok(amount) => amount,
        Err(err) => return form_error(err),
    };

    json_response(trading_service::add_main_funds(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        lead_id,
        amount,
    ))
}

#[post("/leads/{lead_id}/trading/transfers")]
pub async fn transfer(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<TransferForm>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };
    let payload = match TransferPayload::try_from(form) {
        Ok(payload) => payload,
        Err(err) => return form_error(err),
    };

    json_response(trading_service::transfer(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        lead_id,
        payload,
    ))
}

#[get("/leads/{lead_id}/trading/transactions")]
pub async fn list_transactions(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };

    json_response(trading_service::list_transactions(repo.get_ref(), &user, lead_id))
}
