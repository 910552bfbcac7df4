use actix_multipart::form::MultipartForm;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, Responder, delete, get, post, put, web};

use crate::changes::ChangePublisher;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::lead::KycStatus;
use crate::domain::lead_filter::LeadFilter;
use crate::domain::types::{LeadId, StatusLabel, UserId};
use crate::forms::leads::{
    AssignAgentForm, BulkAssignForm, BulkAssignPayload, BulkLeadsForm, BulkLeadsPayload,
    BulkStatusForm, BulkStatusPayload, LeadListForm, UpdateKycForm, UpdateStatusForm,
    UploadLeadsForm,
};
use crate::repository::DieselRepository;
use crate::routes::{error_response, form_error, json_response, path_id};
use crate::services::leads as leads_service;

/// `GET /leads?status=..&status=..&agent=..&search=..&tab=mine&page=2`
#[get("/leads")]
pub async fn list_leads(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let filter = match LeadListForm::from_query(req.query_string()).and_then(LeadFilter::try_from)
    {
        Ok(filter) => filter,
        Err(err) => return form_error(err),
    };

    json_response(leads_service::list_leads(repo.get_ref(), &user, filter))
}

#[get("/leads/filters")]
pub async fn filter_options(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_response(leads_service::filter_options(repo.get_ref(), &user))
}

#[get("/leads/{lead_id}")]
pub async fn show_lead(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };

    json_response(leads_service::get_lead(repo.get_ref(), &user, lead_id))
}

#[put("/leads/{lead_id}/status")]
pub async fn update_status(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<UpdateStatusForm>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };
    let label = match StatusLabel::try_from(form) {
        Ok(label) => label,
        Err(err) => return form_error(err),
    };

    json_response(leads_service::update_status(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        lead_id,
        label,
    ))
}

#[put("/leads/{lead_id}/agent")]
pub async fn assign_agent(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<AssignAgentForm>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };
    let agent_id = match Option::<UserId>::try_from(form) {
        Ok(agent_id) => agent_id,
        Err(err) => return form_error(err),
    };

    json_response(leads_service::assign_agent(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        lead_id,
        agent_id,
    ))
}

#[put("/leads/{lead_id}/kyc")]
pub async fn update_kyc(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<UpdateKycForm>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };
    let kyc_status = match KycStatus::try_from(form) {
        Ok(kyc_status) => kyc_status,
        Err(err) => return form_error(err),
    };

    json_response(leads_service::update_kyc(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        lead_id,
        kyc_status,
    ))
}

#[delete("/leads/{lead_id}")]
pub async fn delete_lead(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
) -> impl Responder {
    let lead_id = match path_id::<LeadId>(lead_id.into_inner()) {
        Ok(lead_id) => lead_id,
        Err(response) => return response,
    };

    json_response(leads_service::delete_lead(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        lead_id,
    ))
}

#[post("/leads/bulk/status")]
pub async fn bulk_update_status(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<BulkStatusForm>,
) -> impl Responder {
    let payload = match BulkStatusPayload::try_from(form) {
        Ok(payload) => payload,
        Err(err) => return form_error(err),
    };

    json_response(leads_service::bulk_update_status(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        payload,
    ))
}

#[post("/leads/bulk/assign")]
pub async fn bulk_assign(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<BulkAssignForm>,
) -> impl Responder {
    let payload = match BulkAssignPayload::try_from(form) {
        Ok(payload) => payload,
        Err(err) => return form_error(err),
    };

    json_response(leads_service::bulk_assign(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        payload,
    ))
}

#[post("/leads/bulk/delete")]
pub async fn bulk_delete(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    web::Json(form): web::Json<BulkLeadsForm>,
) -> impl Responder {
    let payload = match BulkLeadsPayload::try_from(form) {
        Ok(payload) => payload,
        Err(err) => return form_error(err),
    };

    json_response(leads_service::bulk_delete(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        payload,
    ))
}

/// Selected leads as a CSV attachment.
#[post("/leads/export")]
pub async fn export_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<BulkLeadsForm>,
) -> impl Responder {
    let payload = match BulkLeadsPayload::try_from(form) {
        Ok(payload) => payload,
        Err(err) => return form_error(err),
    };

    match leads_service::export_csv(repo.get_ref(), &user, payload) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename("leads.csv".to_string())],
            })
            .body(body),
        Err(err) => error_response(err),
    }
}

#[post("/leads/import")]
pub async fn import_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    publisher: web::Data<dyn ChangePublisher>,
    MultipartForm(form): MultipartForm<UploadLeadsForm>,
) -> impl Responder {
    let (folder, file) = match form.open() {
        Ok(opened) => opened,
        Err(err) => return form_error(err),
    };

    json_response(leads_service::import_leads(
        repo.get_ref(),
        publisher.get_ref(),
        &user,
        folder,
        file,
    ))
}
